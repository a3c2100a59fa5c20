//! End-to-end pipeline tests against the in-memory source and sink.

use binvault::{
    ArchiverConfig, KeySpec, MemorySink, Pipeline, RawChange, RawValue, VecChangeStream,
};

fn row(cols: Vec<(&str, RawValue)>) -> Vec<(String, RawValue)> {
    cols.into_iter().map(|(n, v)| (n.to_string(), v)).collect()
}

#[tokio::test]
async fn single_insert_produces_one_keyed_event() {
    // scenario: insert into orders {id: 5, total: "12.50"}, primary key id
    let change = RawChange::insert(
        "shop",
        "orders",
        1_700_000_000,
        row(vec![
            ("id", RawValue::SignedInt(5)),
            ("total", RawValue::Decimal("12.50".to_string())),
        ]),
        KeySpec::Single("id".to_string()),
    );

    let sink = MemorySink::new();
    let mut source = VecChangeStream::new(vec![change]);
    let summary = Pipeline::new(ArchiverConfig::default())
        .run(&mut source, &sink)
        .await
        .unwrap();

    assert_eq!(summary.events_processed, 1);

    let meta = sink.get_json("meta.json").await.unwrap().unwrap();
    let event = &meta["tables"]["orders"][0];
    assert_eq!(event["keys"]["columns"], "id");
    assert_eq!(event["keys"]["values"], "5");
    assert_eq!(event["keys"]["types"], "integer");
    assert_eq!(event["type"], "Insert");
    assert!(event.get("delta").is_none());
}

#[tokio::test]
async fn update_persists_only_changed_columns() {
    // scenario: total changes 12.50 -> 15.00, id unchanged
    let change = RawChange::update(
        "shop",
        "orders",
        1_700_000_010,
        row(vec![
            ("id", RawValue::SignedInt(5)),
            ("total", RawValue::Decimal("12.50".to_string())),
        ]),
        row(vec![
            ("id", RawValue::SignedInt(5)),
            ("total", RawValue::Decimal("15.00".to_string())),
        ]),
        KeySpec::Single("id".to_string()),
    );

    let sink = MemorySink::new();
    let mut source = VecChangeStream::new(vec![change]);
    Pipeline::new(ArchiverConfig::default())
        .run(&mut source, &sink)
        .await
        .unwrap();

    let meta = sink.get_json("meta.json").await.unwrap().unwrap();
    let delta = &meta["tables"]["orders"][0]["delta"];
    assert_eq!(delta["before"], serde_json::json!({"total": "12.50"}));
    assert_eq!(delta["after"], serde_json::json!({"total": "15.00"}));
}

#[tokio::test]
async fn composite_key_renders_lexicographically() {
    // scenario: key (tenant_id=1, id=5) declared unordered as (id, tenant_id)
    let change = RawChange::insert(
        "shop",
        "orders",
        1_700_000_020,
        row(vec![
            ("id", RawValue::SignedInt(5)),
            ("tenant_id", RawValue::SignedInt(1)),
        ]),
        KeySpec::Composite(vec!["id".to_string(), "tenant_id".to_string()]),
    );

    let sink = MemorySink::new();
    let mut source = VecChangeStream::new(vec![change]);
    Pipeline::new(ArchiverConfig::default())
        .run(&mut source, &sink)
        .await
        .unwrap();

    let meta = sink.get_json("meta.json").await.unwrap().unwrap();
    let keys = &meta["tables"]["orders"][0]["keys"];
    assert_eq!(keys["columns"], "id-tenant_id");
    assert_eq!(keys["values"], "5-1");
}

#[tokio::test]
async fn resume_skips_watermark_timestamp_only() {
    // scenario: resume watermark 1000; ts=1000 skipped, anomalous ts=999 kept
    let sink = MemorySink::new();

    let mut first = VecChangeStream::new(vec![RawChange::insert(
        "shop",
        "orders",
        1000,
        row(vec![("id", RawValue::SignedInt(1))]),
        KeySpec::Single("id".to_string()),
    )]);
    Pipeline::new(ArchiverConfig::default())
        .run(&mut first, &sink)
        .await
        .unwrap();

    let mut second = VecChangeStream::new(vec![
        RawChange::insert(
            "shop",
            "orders",
            1000,
            row(vec![("id", RawValue::SignedInt(1))]),
            KeySpec::Single("id".to_string()),
        ),
        RawChange::insert(
            "shop",
            "orders",
            999,
            row(vec![("id", RawValue::SignedInt(2))]),
            KeySpec::Single("id".to_string()),
        ),
        RawChange::insert(
            "shop",
            "orders",
            1005,
            row(vec![("id", RawValue::SignedInt(3))]),
            KeySpec::Single("id".to_string()),
        ),
    ]);
    let summary = Pipeline::new(ArchiverConfig::default().with_resume(true))
        .run(&mut second, &sink)
        .await
        .unwrap();

    assert_eq!(summary.resumed_from, Some(1000));
    assert_eq!(summary.events_skipped, 1);
    assert_eq!(summary.events_processed, 2);

    let meta = sink.get_json("meta.json").await.unwrap().unwrap();
    let events = meta["tables"]["orders"].as_array().unwrap();
    let ids: Vec<&str> = events
        .iter()
        .map(|e| e["keys"]["values"].as_str().unwrap())
        .collect();
    // the watermark-timestamp event is gone; the older anomalous one is kept
    assert_eq!(ids, vec!["2", "3"]);
}

#[tokio::test]
async fn rerun_at_ending_watermark_is_idempotent() {
    let sink = MemorySink::new();
    let make_stream = || {
        VecChangeStream::new(vec![
            RawChange::insert(
                "shop",
                "orders",
                800,
                row(vec![("id", RawValue::SignedInt(1))]),
                KeySpec::Single("id".to_string()),
            ),
            RawChange::insert(
                "shop",
                "orders",
                900,
                row(vec![("id", RawValue::SignedInt(2))]),
                KeySpec::Single("id".to_string()),
            ),
        ])
    };

    let mut first = make_stream();
    let summary = Pipeline::new(ArchiverConfig::default())
        .run(&mut first, &sink)
        .await
        .unwrap();
    assert_eq!(summary.watermark, 900);

    // re-run over a stream positioned at the ending watermark: the event at
    // the watermark timestamp must not be re-appended
    let mut replay = VecChangeStream::new(vec![RawChange::insert(
        "shop",
        "orders",
        900,
        row(vec![("id", RawValue::SignedInt(2))]),
        KeySpec::Single("id".to_string()),
    )]);
    let summary = Pipeline::new(ArchiverConfig::default().with_resume(true))
        .run(&mut replay, &sink)
        .await
        .unwrap();

    assert_eq!(summary.events_processed, 0);
    assert_eq!(summary.events_skipped, 1);
    assert_eq!(summary.watermark, 900);
}

#[tokio::test]
async fn artifacts_written_per_table_then_combined_then_meta() {
    let sink = MemorySink::new();
    let mut source = VecChangeStream::new(vec![
        RawChange::insert(
            "shop",
            "orders",
            100,
            row(vec![("id", RawValue::SignedInt(1))]),
            KeySpec::Single("id".to_string()),
        ),
        RawChange::delete(
            "shop",
            "customers",
            110,
            row(vec![("id", RawValue::SignedInt(9))]),
            KeySpec::Single("id".to_string()),
        ),
    ]);
    Pipeline::new(ArchiverConfig::default())
        .run(&mut source, &sink)
        .await
        .unwrap();

    let order = sink.write_order().await;
    assert_eq!(order.last().unwrap(), "meta.json");
    assert_eq!(order[order.len() - 2], "binlog-110.json");
    assert!(order[..order.len() - 2]
        .iter()
        .all(|k| k.ends_with("/binlog-110.json")));

    let orders = sink.get_json("orders/binlog-110.json").await.unwrap().unwrap();
    assert_eq!(orders["count"], 1);
    assert_eq!(orders["lastTimestamp"], 100);
}
