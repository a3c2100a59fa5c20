//! Checkpoint and artifact writing
//!
//! A completed run is persisted as three artifact shapes:
//!
//! 1. one document per table with that table's events, count and watermark,
//!    keyed by table name and the run's ending watermark
//! 2. one combined document with all tables' events plus global
//!    counts/watermarks, keyed by the ending watermark
//! 3. the meta checkpoint: the combined shape at the fixed key
//!    `meta.json`, overwritten every run and read back on the next one
//!
//! The meta checkpoint is written last, only after every other artifact
//! succeeded, so a failed meta write leaves the next run resuming from the
//! prior watermark instead of claiming events it never persisted. There is
//! no transactional grouping across the writes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aggregate::RunState;
use crate::error::{ArchiveError, Result};
use crate::event::ChangeEvent;
use crate::sink::ArtifactSink;

/// Fixed object key of the meta checkpoint.
pub const META_KEY: &str = "meta.json";

/// Persisted checkpoint document; also the combined run artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    /// Ending watermark of the run that wrote this document
    pub watermark: i64,
    /// Per-table event counts
    pub counts: BTreeMap<String, u64>,
    /// Per-table last-seen timestamps
    pub last_timestamps: BTreeMap<String, i64>,
    /// Full set of events, grouped by table
    pub tables: BTreeMap<String, Vec<ChangeEvent>>,
}

impl Checkpoint {
    /// Assemble the checkpoint document from a completed run.
    pub fn from_state(state: &RunState) -> Self {
        let mut counts = BTreeMap::new();
        let mut last_timestamps = BTreeMap::new();
        let mut tables = BTreeMap::new();
        for (table, aggregate) in state.tables() {
            counts.insert(table.clone(), aggregate.count);
            last_timestamps.insert(table.clone(), aggregate.last_timestamp);
            tables.insert(table.clone(), aggregate.events.clone());
        }
        Self {
            watermark: state.watermark(),
            counts,
            last_timestamps,
            tables,
        }
    }
}

/// Per-table artifact document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableArtifact {
    /// This table's last-seen timestamp
    pub last_timestamp: i64,
    pub count: u64,
    pub events: Vec<ChangeEvent>,
}

/// Object key of the combined run artifact.
pub fn combined_key(watermark: i64) -> String {
    format!("binlog-{}.json", watermark)
}

/// Object key of one table's artifact.
pub fn table_key(table: &str, watermark: i64) -> String {
    format!("{}/binlog-{}.json", table, watermark)
}

/// Read the resume watermark from the meta checkpoint.
///
/// `Ok(None)` on a first run (no checkpoint object yet). A checkpoint that
/// exists but cannot be parsed is an error: resuming with a guessed
/// watermark would reprocess or drop events.
pub async fn load_resume_watermark(sink: &dyn ArtifactSink) -> Result<Option<i64>> {
    let Some(body) = sink.get(META_KEY).await? else {
        debug!("no checkpoint at {}, starting fresh", META_KEY);
        return Ok(None);
    };
    let checkpoint: Checkpoint = serde_json::from_slice(&body).map_err(|e| {
        ArchiveError::checkpoint(format!("cannot parse {}: {}", META_KEY, e))
    })?;
    info!(watermark = checkpoint.watermark, "loaded resume checkpoint");
    Ok(Some(checkpoint.watermark))
}

/// Persist a completed run: per-table artifacts, the combined artifact, and
/// finally the meta checkpoint.
pub async fn write_artifacts(state: &RunState, sink: &dyn ArtifactSink) -> Result<()> {
    let checkpoint = Checkpoint::from_state(state);
    let watermark = checkpoint.watermark;

    for (table, aggregate) in state.tables() {
        let artifact = TableArtifact {
            last_timestamp: aggregate.last_timestamp,
            count: aggregate.count,
            events: aggregate.events.clone(),
        };
        let key = table_key(table, watermark);
        sink.put(&key, serde_json::to_vec(&artifact)?).await?;
        debug!(table = %table, key = %key, count = aggregate.count, "wrote table artifact");
    }

    let body = serde_json::to_vec(&checkpoint)?;
    sink.put(&combined_key(watermark), body.clone()).await?;
    debug!(watermark, "wrote combined artifact");

    // meta goes last; see module docs
    sink.put(META_KEY, body).await?;
    info!(
        watermark,
        tables = state.tables().len(),
        events = state.total_events(),
        "checkpoint written"
    );
    Ok(())
}
