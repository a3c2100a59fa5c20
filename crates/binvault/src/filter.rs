//! Resume filtering
//!
//! On a resumed run, events already covered by the previous run's checkpoint
//! must not be re-appended. The filter carries the resume watermark loaded
//! once at run start.

/// Decides whether an incoming change was already processed by the prior
/// run.
///
/// The skip condition is equality with the resume watermark, not `<=`. This
/// matches the persisted checkpoint format's established semantics and is
/// kept for compatibility, but it has known limitations: if several events
/// share the watermark timestamp, events at that timestamp that the prior
/// run did not reach are skipped anyway, and events older than the watermark
/// (should the stream ever replay them) are not filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeFilter {
    watermark: Option<i64>,
}

impl ResumeFilter {
    /// Create a filter from the checkpoint watermark; `None` means a first
    /// run (or resume disabled) and nothing is skipped.
    pub fn new(watermark: Option<i64>) -> Self {
        Self { watermark }
    }

    /// The resume watermark, if any.
    pub fn watermark(&self) -> Option<i64> {
        self.watermark
    }

    /// True if the event at `timestamp` must be skipped as already
    /// processed.
    pub fn should_skip(&self, timestamp: i64) -> bool {
        self.watermark == Some(timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_watermark_skips_nothing() {
        let filter = ResumeFilter::new(None);
        assert!(!filter.should_skip(0));
        assert!(!filter.should_skip(1000));
    }

    #[test]
    fn test_skips_exact_watermark_only() {
        let filter = ResumeFilter::new(Some(1000));
        assert!(filter.should_skip(1000));
        assert!(!filter.should_skip(1001));
        // an older, anomalous event is not filtered; this pins the known
        // equality-only limitation
        assert!(!filter.should_skip(999));
    }
}
