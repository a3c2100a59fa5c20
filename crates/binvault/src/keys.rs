//! Primary key extraction
//!
//! The source reports a table's primary key either as a bare column name or
//! as a collection of names. Both forms are accepted once, at the boundary,
//! and normalized into an explicit [`KeySpec`]; everything past that point
//! works with the typed form.

use serde::{Deserialize, Serialize};

use crate::error::{ArchiveError, Result};
use crate::normalize::CanonicalRow;

/// Delimiter between entries of a composite key descriptor.
const KEY_DELIMITER: &str = "-";

/// Primary-key column specification, normalized from the source's
/// duck-typed representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeySpec {
    /// Single-column key reported as a bare name
    Single(String),
    /// Composite key reported as a collection of names
    Composite(Vec<String>),
}

impl KeySpec {
    /// Normalize the source's wire representation: a JSON string for a
    /// single-column key, a JSON array of strings for a composite key.
    /// Any other shape is an [`ArchiveError::UnsupportedKeySpec`].
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(name) => Ok(Self::Single(name.clone())),
            serde_json::Value::Array(items) => {
                let mut names = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        serde_json::Value::String(name) => names.push(name.clone()),
                        other => {
                            return Err(ArchiveError::unsupported_key_spec(format!(
                                "key column list contains a non-string entry: {}",
                                other
                            )))
                        }
                    }
                }
                if names.is_empty() {
                    return Err(ArchiveError::unsupported_key_spec(
                        "key column list is empty",
                    ));
                }
                Ok(Self::Composite(names))
            }
            other => Err(ArchiveError::unsupported_key_spec(format!(
                "expected a column name or list of names, got {}",
                other
            ))),
        }
    }

    /// Key column names in lexicographic order.
    ///
    /// The declared key-column order is intentionally discarded so the
    /// descriptor is deterministic across runs and source versions.
    pub fn sorted_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = match self {
            Self::Single(name) => vec![name.as_str()],
            Self::Composite(names) => names.iter().map(String::as_str).collect(),
        };
        columns.sort_unstable();
        columns
    }
}

/// Deterministic composite-key descriptor derived from a row's declared
/// primary key: column names, rendered values, and value kinds, each
/// `-`-joined in lexicographic column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDescriptor {
    pub columns: String,
    pub values: String,
    pub types: String,
}

impl KeyDescriptor {
    /// Extract the key descriptor from a canonical row.
    ///
    /// Fails with [`ArchiveError::MalformedRow`] if a declared key column is
    /// missing from the row.
    pub fn extract(spec: &KeySpec, row: &CanonicalRow) -> Result<Self> {
        let mut columns = Vec::new();
        let mut values = Vec::new();
        let mut types = Vec::new();

        for name in spec.sorted_columns() {
            let value = row.get(name).ok_or_else(|| {
                ArchiveError::malformed_row(format!("key column '{}' missing from row", name))
            })?;
            columns.push(name.to_string());
            values.push(value.render());
            types.push(value.kind().to_string());
        }

        Ok(Self {
            columns: columns.join(KEY_DELIMITER),
            values: values.join(KEY_DELIMITER),
            types: types.join(KEY_DELIMITER),
        })
    }
}
