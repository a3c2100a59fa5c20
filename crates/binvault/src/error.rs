//! Error types for the archiver pipeline
//!
//! Every failure in the core is fatal for the run: a dropped or silently
//! repaired row would corrupt downstream consistency, so errors propagate to
//! the caller and the run is all-or-nothing at the checkpoint boundary.
//! Retry policy, if any, belongs to the external source/sink collaborators.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error categories for metrics and alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Row shape/value errors (normalization, delta computation)
    Row,
    /// Primary-key metadata errors
    Key,
    /// Change stream errors
    Stream,
    /// Object storage errors
    Storage,
    /// Configuration errors
    Configuration,
    /// Serialization errors
    Serialization,
    /// Other/unknown errors
    Other,
}

/// Archiver-specific errors
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// A row's raw value or shape cannot be normalized
    #[error("Malformed row: {0}")]
    MalformedRow(String),

    /// Primary-key metadata from the source is in an unrecognized shape
    #[error("Unsupported key spec: {0}")]
    UnsupportedKeySpec(String),

    /// The external change stream failed mid-iteration
    #[error("Source stream error: {0}")]
    Source(String),

    /// An artifact write failed
    #[error("Sink write error: {0}")]
    SinkWrite(String),

    /// The persisted checkpoint could not be read or parsed
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    /// Create a new malformed-row error
    pub fn malformed_row(msg: impl Into<String>) -> Self {
        Self::MalformedRow(msg.into())
    }

    /// Create a new unsupported-key-spec error
    pub fn unsupported_key_spec(msg: impl Into<String>) -> Self {
        Self::UnsupportedKeySpec(msg.into())
    }

    /// Create a new source stream error
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Create a new sink write error
    pub fn sink_write(msg: impl Into<String>) -> Self {
        Self::SinkWrite(msg.into())
    }

    /// Create a new checkpoint error
    pub fn checkpoint(msg: impl Into<String>) -> Self {
        Self::Checkpoint(msg.into())
    }

    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Get the error category for metrics and alerting.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedRow(_) => ErrorCategory::Row,
            Self::UnsupportedKeySpec(_) => ErrorCategory::Key,
            Self::Source(_) => ErrorCategory::Stream,
            Self::SinkWrite(_) => ErrorCategory::Storage,
            Self::Checkpoint(_) => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Configuration,
            Self::Json(_) => ErrorCategory::Serialization,
            Self::Io(_) => ErrorCategory::Other,
        }
    }

    /// Get a metric-safe error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedRow(_) => "malformed_row",
            Self::UnsupportedKeySpec(_) => "unsupported_key_spec",
            Self::Source(_) => "source_error",
            Self::SinkWrite(_) => "sink_write_error",
            Self::Checkpoint(_) => "checkpoint_error",
            Self::Config(_) => "config_error",
            Self::Json(_) => "json_error",
            Self::Io(_) => "io_error",
        }
    }
}

/// Result type for archiver operations
pub type Result<T> = std::result::Result<T, ArchiveError>;
