//! Per-table aggregation
//!
//! Accumulates built events grouped by table over one pipeline run. The
//! state is an explicit value threaded through the run and returned at the
//! end; there are no process-wide accumulators.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::event::ChangeEvent;

/// Events accumulated for one table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableAggregate {
    /// Events in insertion order
    pub events: Vec<ChangeEvent>,
    /// Always equals `events.len()`
    pub count: u64,
    /// Timestamp of the last event appended for this table. Last-write-wins
    /// per append, which is monotone under the stream's timestamp-
    /// non-decreasing ordering.
    pub last_timestamp: i64,
}

impl TableAggregate {
    fn append(&mut self, event: ChangeEvent) {
        self.last_timestamp = event.timestamp;
        self.events.push(event);
        self.count += 1;
    }
}

/// Accumulated state of one pipeline run: per-table aggregates plus the
/// global watermark. Single-threaded; one ordered pass over the stream.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    tables: BTreeMap<String, TableAggregate>,
    watermark: i64,
}

impl RunState {
    /// Fresh state. When resuming, the watermark starts at the prior run's
    /// checkpoint so an eventless run still reports a meaningful watermark.
    pub fn new(resume_watermark: Option<i64>) -> Self {
        Self {
            tables: BTreeMap::new(),
            watermark: resume_watermark.unwrap_or(0),
        }
    }

    /// Append one built event to its table's aggregate, lazily creating the
    /// aggregate, and advance the global watermark.
    pub fn append(&mut self, event: ChangeEvent) {
        self.watermark = event.timestamp;
        self.tables
            .entry(event.table.clone())
            .or_default()
            .append(event);
    }

    /// The run's current global watermark.
    pub fn watermark(&self) -> i64 {
        self.watermark
    }

    /// Per-table aggregates, keyed by table name.
    pub fn tables(&self) -> &BTreeMap<String, TableAggregate> {
        &self.tables
    }

    /// Total number of events across all tables.
    pub fn total_events(&self) -> u64 {
        self.tables.values().map(|t| t.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ChangeOp;
    use crate::keys::KeyDescriptor;

    fn event(table: &str, timestamp: i64) -> ChangeEvent {
        ChangeEvent {
            keys: KeyDescriptor {
                columns: "id".to_string(),
                values: "1".to_string(),
                types: "integer".to_string(),
            },
            schema: "shop".to_string(),
            table: table.to_string(),
            op: ChangeOp::Insert,
            timestamp,
            delta: None,
        }
    }

    #[test]
    fn test_lazy_table_creation() {
        let mut state = RunState::new(None);
        assert!(state.tables().is_empty());

        state.append(event("orders", 100));
        assert_eq!(state.tables().len(), 1);
        assert!(state.tables().contains_key("orders"));
    }

    #[test]
    fn test_count_matches_events() {
        let mut state = RunState::new(None);
        state.append(event("orders", 100));
        state.append(event("orders", 101));
        state.append(event("customers", 102));

        let orders = &state.tables()["orders"];
        assert_eq!(orders.count, 2);
        assert_eq!(orders.count as usize, orders.events.len());
        assert_eq!(state.total_events(), 3);
    }

    #[test]
    fn test_last_timestamp_per_table() {
        let mut state = RunState::new(None);
        state.append(event("orders", 100));
        state.append(event("customers", 105));
        state.append(event("orders", 110));

        assert_eq!(state.tables()["orders"].last_timestamp, 110);
        assert_eq!(state.tables()["customers"].last_timestamp, 105);
        assert_eq!(state.watermark(), 110);
    }

    #[test]
    fn test_watermark_defaults_to_resume_point() {
        let state = RunState::new(Some(1000));
        assert_eq!(state.watermark(), 1000);

        let state = RunState::new(None);
        assert_eq!(state.watermark(), 0);
    }
}
