//! Field-level delta computation for updates
//!
//! The replication log carries every column of an updated row, changed or
//! not. The delta keeps only the columns whose canonical value actually
//! differs, which is what gets persisted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ArchiveError, Result};
use crate::normalize::{CanonicalRow, CanonicalValue};

/// Changed columns of an update: the before and after values of exactly the
/// columns that differ. `before` and `after` always have identical key sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub before: BTreeMap<String, CanonicalValue>,
    pub after: BTreeMap<String, CanonicalValue>,
}

impl Delta {
    /// Compare the before/after canonical rows of an update.
    ///
    /// A column absent from `before` counts as changed; its before side is
    /// rendered as an explicit null so the key sets stay identical. A column
    /// present in `before` but absent from `after` means the two row shapes
    /// disagree, which is a contract violation of the source.
    pub fn compute(before: &CanonicalRow, after: &CanonicalRow) -> Result<Self> {
        for column in before.keys() {
            if !after.contains_key(column) {
                return Err(ArchiveError::malformed_row(format!(
                    "update dropped column '{}' between before and after images",
                    column
                )));
            }
        }

        let mut delta = Self {
            before: BTreeMap::new(),
            after: BTreeMap::new(),
        };
        for (column, after_value) in after {
            match before.get(column) {
                Some(before_value) if before_value == after_value => {}
                Some(before_value) => {
                    delta.before.insert(column.clone(), before_value.clone());
                    delta.after.insert(column.clone(), after_value.clone());
                }
                None => {
                    delta.before.insert(column.clone(), CanonicalValue::Null);
                    delta.after.insert(column.clone(), after_value.clone());
                }
            }
        }
        Ok(delta)
    }

    /// True when the update changed nothing.
    pub fn is_empty(&self) -> bool {
        self.after.is_empty()
    }
}
