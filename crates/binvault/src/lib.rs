//! # binvault - binlog change archiver
//!
//! Normalizes row-level change events from a database replication log and
//! archives them to object storage as checkpointed, per-table artifacts, so
//! a later run can resume without reprocessing already-seen changes.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ ChangeStream │  external source, one RawChange at a time
//! └──────┬───────┘
//!        ▼
//! ┌──────────────────────────────────────────────┐
//! │ normalize → keys → delta → ChangeEvent       │
//! └──────┬───────────────────────────────────────┘
//!        ▼
//! ┌──────────────┐   ┌──────────────┐
//! │ ResumeFilter │──▶│  RunState    │  per-table aggregates + watermark
//! └──────────────┘   └──────┬───────┘
//!                           ▼
//!                    ┌──────────────┐
//!                    │ ArtifactSink │  table + combined artifacts, meta last
//!                    └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # async fn example() -> binvault::Result<()> {
//! use binvault::{ArchiverConfig, MemorySink, Pipeline, VecChangeStream};
//!
//! let config = ArchiverConfig::new("db.internal", "replicator")
//!     .with_server_id(42)
//!     .with_resume(true);
//!
//! let mut source = VecChangeStream::new(vec![]);
//! let sink = MemorySink::new();
//!
//! let summary = Pipeline::new(config).run(&mut source, &sink).await?;
//! println!("archived {} events", summary.events_processed);
//! # Ok(())
//! # }
//! ```
//!
//! The replication connection, binlog decoding, and object-storage client
//! live behind the [`ChangeStream`] and [`ArtifactSink`] traits; an S3
//! implementation of the sink ships in the `binvault-s3` crate.

pub mod aggregate;
pub mod checkpoint;
pub mod config;
pub mod delta;
pub mod error;
pub mod event;
pub mod filter;
pub mod keys;
pub mod normalize;
pub mod pipeline;
pub mod sink;
pub mod source;

pub use aggregate::{RunState, TableAggregate};
pub use checkpoint::{combined_key, table_key, Checkpoint, TableArtifact, META_KEY};
pub use config::{ArchiverConfig, DatabaseConfig, SensitiveString};
pub use delta::Delta;
pub use error::{ArchiveError, ErrorCategory, Result};
pub use event::{ChangeEvent, ChangeOp, RawChange, RowImage};
pub use filter::ResumeFilter;
pub use keys::{KeyDescriptor, KeySpec};
pub use normalize::{normalize_row, CanonicalRow, CanonicalValue, RawRow, RawValue};
pub use pipeline::{Pipeline, RunSummary};
pub use sink::{ArtifactSink, MemorySink, SharedArtifactSink};
pub use source::{ChangeStream, VecChangeStream};
