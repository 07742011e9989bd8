//! Per-item results of batch operations.
//!
//! Generation and patching are best-effort: each token produces an
//! [`ItemOutcome`] and the batch reports the aggregate [`BatchSummary`]
//! instead of stopping at the first failure.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of processing a single token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemOutcome {
    /// The token was processed and persisted
    Success,
    /// Nothing needed doing, for the given reason
    Skipped(String),
    /// Processing failed with the given error
    Failed(String),
}

/// Aggregate of the outcomes of a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub skipped: Vec<(u64, String)>,
    pub failed: Vec<(u64, String)>,
}

impl BatchSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one token's outcome into the summary
    pub fn record(&mut self, token_id: u64, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Success => self.succeeded += 1,
            ItemOutcome::Skipped(reason) => self.skipped.push((token_id, reason)),
            ItemOutcome::Failed(error) => self.failed.push((token_id, error)),
        }
    }

    /// Number of tokens seen
    pub fn total(&self) -> usize {
        self.succeeded + self.skipped.len() + self.failed.len()
    }

    /// True when no token failed
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} skipped, {} failed ({} total)",
            self.succeeded,
            self.skipped.len(),
            self.failed.len(),
            self.total()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let mut summary = BatchSummary::new();
        summary.record(0, ItemOutcome::Success);
        summary.record(1, ItemOutcome::Skipped("already patched".into()));
        summary.record(2, ItemOutcome::Failed("disk full".into()));
        summary.record(3, ItemOutcome::Success);

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.skipped, vec![(1, "already patched".to_string())]);
        assert_eq!(summary.failed, vec![(2, "disk full".to_string())]);
        assert_eq!(summary.total(), 4);
        assert!(!summary.is_clean());
        assert_eq!(
            summary.to_string(),
            "2 succeeded, 1 skipped, 1 failed (4 total)"
        );
    }

    #[test]
    fn test_empty_summary_is_clean() {
        let summary = BatchSummary::new();
        assert!(summary.is_clean());
        assert_eq!(summary.total(), 0);
    }
}
