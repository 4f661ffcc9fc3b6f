//! Aggregate counts over a set of outcomes.

use serde::Serialize;

use crate::model::EntryKind;
use crate::outcome::TransferOutcome;

/// Per-status totals of a run.
///
/// `skipped` counts every skipped outcome, rule skips included;
/// `skipped_by_rule` is the subset skipped by a rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransferSummary {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub skipped_by_rule: usize,
    pub failed: usize,

    /// Sum of sizes of transferred files
    pub bytes_transferred: u64,
}

impl TransferSummary {
    pub fn from_outcomes<'a, I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = &'a TransferOutcome>,
    {
        let mut summary = TransferSummary::default();
        for outcome in outcomes {
            summary.record(outcome);
        }
        summary
    }

    pub fn record(&mut self, outcome: &TransferOutcome) {
        self.total += 1;

        if outcome.is_succeeded() {
            self.succeeded += 1;
            if outcome.kind() == EntryKind::File {
                self.bytes_transferred += outcome.size();
            }
        }
        if outcome.is_skipped() {
            self.skipped += 1;
        }
        if outcome.is_skipped_by_rule() {
            self.skipped_by_rule += 1;
        }
        if outcome.is_failed() {
            self.failed += 1;
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{PendingOutcome, TransferError};

    fn pending(kind: EntryKind, name: &str) -> PendingOutcome {
        PendingOutcome::new(kind, name, format!("/r/{name}"), format!("/l/{name}"))
    }

    #[test]
    fn test_summary_counts_each_status() {
        let outcomes = vec![
            pending(EntryKind::File, "a").succeeded(10),
            pending(EntryKind::File, "b").succeeded(5),
            pending(EntryKind::Directory, "d").succeeded(0),
            pending(EntryKind::File, "c").skipped(7),
            pending(EntryKind::File, "e").skipped_by_rule(3),
            pending(EntryKind::File, "f").failed(TransferError::msg("boom"), None),
        ];

        let summary = TransferSummary::from_outcomes(&outcomes);
        assert_eq!(summary.total, 6);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.skipped_by_rule, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.bytes_transferred, 15);
        assert!(summary.has_failures());
    }

    #[test]
    fn test_empty_summary() {
        let summary = TransferSummary::from_outcomes(std::iter::empty());
        assert_eq!(summary, TransferSummary::default());
        assert!(!summary.has_failures());
    }
}
