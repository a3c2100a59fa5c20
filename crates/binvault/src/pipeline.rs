//! Pipeline runner
//!
//! One bounded invocation: load the resume checkpoint once, pull the change
//! stream to exhaustion while normalizing and aggregating synchronously per
//! item, then persist the artifacts and checkpoint. Single-threaded and
//! pull-based; the run is all-or-nothing at the checkpoint boundary.

use tracing::{info, warn};

use crate::aggregate::RunState;
use crate::checkpoint::{load_resume_watermark, write_artifacts};
use crate::config::ArchiverConfig;
use crate::error::Result;
use crate::event::ChangeEvent;
use crate::filter::ResumeFilter;
use crate::sink::ArtifactSink;
use crate::source::ChangeStream;

/// Progress log cadence, in events.
const PROGRESS_INTERVAL: u64 = 1000;

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Events normalized and aggregated
    pub events_processed: u64,
    /// Events skipped by the resume filter
    pub events_skipped: u64,
    /// Distinct tables touched
    pub tables: usize,
    /// Ending watermark persisted in the checkpoint
    pub watermark: i64,
    /// Watermark the run resumed from, if any
    pub resumed_from: Option<i64>,
}

/// The archiver pipeline.
pub struct Pipeline {
    config: ArchiverConfig,
}

impl Pipeline {
    pub fn new(config: ArchiverConfig) -> Self {
        Self { config }
    }

    /// Process one bounded stream invocation end to end.
    ///
    /// A source error aborts without flushing, so the checkpoint never
    /// claims events that were not persisted. A sink error after some
    /// artifact writes is surfaced as-is; the meta checkpoint is written
    /// last, so the next run still resumes from the prior watermark.
    pub async fn run(
        &self,
        source: &mut dyn ChangeStream,
        sink: &dyn ArtifactSink,
    ) -> Result<RunSummary> {
        let resumed_from = if self.config.resume_from_checkpoint {
            load_resume_watermark(sink).await?
        } else {
            None
        };
        let filter = ResumeFilter::new(resumed_from);
        let mut state = RunState::new(resumed_from);

        info!(
            server_id = self.config.server_id,
            resume = ?resumed_from,
            "starting archiver run"
        );

        let mut processed = 0u64;
        let mut skipped = 0u64;
        while let Some(change) = source.next_change().await? {
            if filter.should_skip(change.timestamp) {
                skipped += 1;
                continue;
            }

            let event = ChangeEvent::build(&change)?;
            state.append(event);
            processed += 1;
            if processed % PROGRESS_INTERVAL == 0 {
                info!(processed, skipped, "archiver progress");
            }
        }

        if processed == 0 {
            warn!("stream closed without new events");
        } else {
            info!(processed, skipped, "stream closed");
        }

        write_artifacts(&state, sink).await?;

        Ok(RunSummary {
            events_processed: processed,
            events_skipped: skipped,
            tables: state.tables().len(),
            watermark: state.watermark(),
            resumed_from,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArchiveError;
    use crate::event::RawChange;
    use crate::keys::KeySpec;
    use crate::normalize::RawValue;
    use crate::sink::MemorySink;
    use crate::source::VecChangeStream;
    use async_trait::async_trait;

    fn insert(table: &str, id: i64, timestamp: i64) -> RawChange {
        RawChange::insert(
            "shop",
            table,
            timestamp,
            vec![("id".to_string(), RawValue::SignedInt(id))],
            KeySpec::Single("id".to_string()),
        )
    }

    struct FailingStream {
        yielded: bool,
    }

    #[async_trait]
    impl ChangeStream for FailingStream {
        async fn next_change(&mut self) -> Result<Option<RawChange>> {
            if self.yielded {
                Err(ArchiveError::source("connection reset"))
            } else {
                self.yielded = true;
                Ok(Some(insert("orders", 1, 100)))
            }
        }
    }

    #[tokio::test]
    async fn test_run_aggregates_and_checkpoints() {
        let pipeline = Pipeline::new(ArchiverConfig::default());
        let mut source = VecChangeStream::new(vec![
            insert("orders", 1, 100),
            insert("orders", 2, 110),
            insert("customers", 7, 120),
        ]);
        let sink = MemorySink::new();

        let summary = pipeline.run(&mut source, &sink).await.unwrap();
        assert_eq!(summary.events_processed, 3);
        assert_eq!(summary.events_skipped, 0);
        assert_eq!(summary.tables, 2);
        assert_eq!(summary.watermark, 120);

        let meta = sink.get_json("meta.json").await.unwrap().unwrap();
        assert_eq!(meta["watermark"], 120);
        assert_eq!(meta["counts"]["orders"], 2);
    }

    #[tokio::test]
    async fn test_source_error_leaves_sink_untouched() {
        let pipeline = Pipeline::new(ArchiverConfig::default());
        let mut source = FailingStream { yielded: false };
        let sink = MemorySink::new();

        let err = pipeline.run(&mut source, &sink).await.unwrap_err();
        assert!(matches!(err, ArchiveError::Source(_)));
        // partial state must not be flushed
        assert!(sink.write_order().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_row_fails_the_run() {
        let pipeline = Pipeline::new(ArchiverConfig::default());
        let mut source = VecChangeStream::new(vec![RawChange::insert(
            "shop",
            "orders",
            100,
            vec![(
                "total".to_string(),
                RawValue::Decimal("not-a-number".to_string()),
            )],
            KeySpec::Single("total".to_string()),
        )]);
        let sink = MemorySink::new();

        let err = pipeline.run(&mut source, &sink).await.unwrap_err();
        assert!(matches!(err, ArchiveError::MalformedRow(_)));
        assert!(sink.write_order().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_run_reasserts_resume_watermark() {
        let sink = MemorySink::new();

        // first run establishes a checkpoint
        let pipeline = Pipeline::new(ArchiverConfig::default());
        let mut source = VecChangeStream::new(vec![insert("orders", 1, 500)]);
        pipeline.run(&mut source, &sink).await.unwrap();

        // resumed run sees nothing new
        let pipeline = Pipeline::new(ArchiverConfig::default().with_resume(true));
        let mut source = VecChangeStream::new(vec![]);
        let summary = pipeline.run(&mut source, &sink).await.unwrap();

        assert_eq!(summary.events_processed, 0);
        assert_eq!(summary.resumed_from, Some(500));
        assert_eq!(summary.watermark, 500);

        let meta = sink.get_json("meta.json").await.unwrap().unwrap();
        assert_eq!(meta["watermark"], 500);
    }
}
