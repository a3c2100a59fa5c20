//! S3 artifact sink for binvault
//!
//! Implements the archiver's [`ArtifactSink`](binvault::ArtifactSink) against
//! Amazon S3 and S3-compatible storage (MinIO, LocalStack, Cloudflare R2).
//!
//! # Example
//!
//! ```rust,ignore
//! use binvault::{ArchiverConfig, Pipeline};
//! use binvault_s3::{S3ArtifactStore, S3StoreConfig};
//!
//! let store = S3ArtifactStore::connect(S3StoreConfig {
//!     bucket: "binlog-archive".into(),
//!     ..Default::default()
//! })
//! .await?;
//!
//! let summary = Pipeline::new(config).run(&mut source, &store).await?;
//! ```

pub mod s3;

pub use s3::{S3ArtifactStore, S3StoreConfig};
