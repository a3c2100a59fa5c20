//! Change stream abstraction
//!
//! The replication connection and wire-protocol decoding live behind this
//! trait. The pipeline pulls one [`RawChange`] at a time; the stream is
//! finite for the duration of one connection and ends with `Ok(None)`.

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::error::Result;
use crate::event::RawChange;

/// External provider of ordered row-level database change events.
///
/// Restartable only via a fresh connection; callers pass the resume
/// watermark as a position hint when connecting, outside this trait.
#[async_trait]
pub trait ChangeStream: Send {
    /// Pull the next change. `Ok(None)` means the stream closed normally;
    /// an error aborts the run without flushing accumulated state.
    async fn next_change(&mut self) -> Result<Option<RawChange>>;
}

/// A change stream over a fixed sequence of events, for tests.
#[derive(Debug, Default)]
pub struct VecChangeStream {
    changes: VecDeque<RawChange>,
}

impl VecChangeStream {
    pub fn new(changes: Vec<RawChange>) -> Self {
        Self {
            changes: changes.into(),
        }
    }
}

#[async_trait]
impl ChangeStream for VecChangeStream {
    async fn next_change(&mut self) -> Result<Option<RawChange>> {
        Ok(self.changes.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeySpec;
    use crate::normalize::RawValue;

    #[tokio::test]
    async fn test_vec_stream_drains_in_order() {
        let mut stream = VecChangeStream::new(vec![
            RawChange::insert(
                "shop",
                "orders",
                1,
                vec![("id".to_string(), RawValue::SignedInt(1))],
                KeySpec::Single("id".to_string()),
            ),
            RawChange::insert(
                "shop",
                "orders",
                2,
                vec![("id".to_string(), RawValue::SignedInt(2))],
                KeySpec::Single("id".to_string()),
            ),
        ]);

        assert_eq!(stream.next_change().await.unwrap().unwrap().timestamp, 1);
        assert_eq!(stream.next_change().await.unwrap().unwrap().timestamp, 2);
        assert!(stream.next_change().await.unwrap().is_none());
    }
}
