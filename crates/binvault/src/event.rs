//! Change event representation
//!
//! [`RawChange`] is what the external change stream hands the pipeline: one
//! row-level operation with its schema/table/timestamp metadata, raw field
//! values, and the table's primary-key spec. [`ChangeEvent`] is the
//! canonical, storage-ready record built from it; immutable once built.

use serde::{Deserialize, Serialize};

use crate::delta::Delta;
use crate::error::Result;
use crate::keys::{KeyDescriptor, KeySpec};
use crate::normalize::{normalize_row, RawRow};

/// Row-change operation kind, decided once at the source boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeOp {
    /// Row inserted
    Insert,
    /// Row updated
    Update,
    /// Row deleted
    Delete,
}

impl std::fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeOp::Insert => write!(f, "INSERT"),
            ChangeOp::Update => write!(f, "UPDATE"),
            ChangeOp::Delete => write!(f, "DELETE"),
        }
    }
}

/// Raw field images of one change: a single row image for insert/delete,
/// before and after images for update.
#[derive(Debug, Clone)]
pub enum RowImage {
    Values(RawRow),
    BeforeAfter { before: RawRow, after: RawRow },
}

/// One change event as delivered by the source, before normalization.
///
/// Owned by the source for the duration of one iteration; the pipeline
/// borrows it to build a [`ChangeEvent`] and retains nothing past that.
#[derive(Debug, Clone)]
pub struct RawChange {
    pub schema: String,
    pub table: String,
    pub op: ChangeOp,
    /// Event timestamp, seconds since epoch
    pub timestamp: i64,
    pub rows: RowImage,
    pub primary_key: KeySpec,
}

impl RawChange {
    pub fn insert(
        schema: impl Into<String>,
        table: impl Into<String>,
        timestamp: i64,
        values: RawRow,
        primary_key: KeySpec,
    ) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            op: ChangeOp::Insert,
            timestamp,
            rows: RowImage::Values(values),
            primary_key,
        }
    }

    pub fn update(
        schema: impl Into<String>,
        table: impl Into<String>,
        timestamp: i64,
        before: RawRow,
        after: RawRow,
        primary_key: KeySpec,
    ) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            op: ChangeOp::Update,
            timestamp,
            rows: RowImage::BeforeAfter { before, after },
            primary_key,
        }
    }

    pub fn delete(
        schema: impl Into<String>,
        table: impl Into<String>,
        timestamp: i64,
        values: RawRow,
        primary_key: KeySpec,
    ) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            op: ChangeOp::Delete,
            timestamp,
            rows: RowImage::Values(values),
            primary_key,
        }
    }
}

/// Canonical output event: key descriptor, provenance, operation kind, and
/// for updates the changed-column delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub keys: KeyDescriptor,
    pub schema: String,
    pub table: String,
    #[serde(rename = "type")]
    pub op: ChangeOp,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<Delta>,
}

impl ChangeEvent {
    /// Build the canonical event for one raw change: normalize the row
    /// image(s), extract the key descriptor, and for updates compute the
    /// changed-column delta. Keys come from the after image for updates and
    /// from the single row image otherwise.
    pub fn build(change: &RawChange) -> Result<Self> {
        let (keys, delta) = match &change.rows {
            RowImage::Values(values) => {
                let row = normalize_row(values)?;
                (KeyDescriptor::extract(&change.primary_key, &row)?, None)
            }
            RowImage::BeforeAfter { before, after } => {
                let before = normalize_row(before)?;
                let after = normalize_row(after)?;
                let delta = Delta::compute(&before, &after)?;
                (
                    KeyDescriptor::extract(&change.primary_key, &after)?,
                    Some(delta),
                )
            }
        };

        Ok(Self {
            keys,
            schema: change.schema.clone(),
            table: change.table.clone(),
            op: change.op,
            timestamp: change.timestamp,
            delta,
        })
    }
}
