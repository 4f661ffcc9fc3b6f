//! Property tests for the outcome lifecycle and its projection.

use mirror_engine::{
    ContractViolation, EntryKind, PendingOutcome, StatusKind, TransferError, TransferRecord,
};
use proptest::prelude::*;

fn kind_strategy() -> impl Strategy<Value = EntryKind> {
    prop_oneof![
        Just(EntryKind::File),
        Just(EntryKind::Directory),
        Just(EntryKind::Link),
    ]
}

fn status_strategy() -> impl Strategy<Value = StatusKind> {
    prop_oneof![
        Just(StatusKind::Succeeded),
        Just(StatusKind::Skipped),
        Just(StatusKind::SkippedByRule),
        Just(StatusKind::Failed),
    ]
}

fn pending_strategy() -> impl Strategy<Value = PendingOutcome> {
    (
        kind_strategy(),
        "[a-z]{1,12}\\.[a-z]{1,4}",
        "/[a-z]{1,8}",
        "/[a-z]{1,8}",
    )
        .prop_map(|(kind, name, remote_dir, local_dir)| {
            let remote = format!("{remote_dir}/{name}");
            let local = format!("{local_dir}/{name}");
            PendingOutcome::new(kind, name, remote, local)
        })
}

proptest! {
    #[test]
    fn finalize_accepts_exactly_the_consistent_inputs(
        pending in pending_strategy(),
        status in status_strategy(),
        size in proptest::option::of(any::<u64>()),
        with_error in any::<bool>(),
    ) {
        let error = with_error.then(|| TransferError::msg("transfer failed"));
        let consistent = (status == StatusKind::Failed) == with_error
            && (status == StatusKind::Failed || size.is_some());

        let result = pending.finalize(status, size, error);
        prop_assert_eq!(result.is_ok(), consistent);

        if let Ok(outcome) = result {
            prop_assert_eq!(outcome.status().kind(), status);
            prop_assert_eq!(outcome.is_failed(), outcome.error().is_some());
            prop_assert_eq!(outcome.size(), size.unwrap_or(0));

            // exactly one terminal status holds
            let flags = [
                outcome.is_succeeded(),
                outcome.is_skipped() && !outcome.is_skipped_by_rule(),
                outcome.is_skipped_by_rule(),
                outcome.is_failed(),
            ];
            prop_assert_eq!(flags.iter().filter(|f| **f).count(), 1);

            if outcome.is_skipped_by_rule() {
                prop_assert!(outcome.is_skipped());
            }
        }
    }

    #[test]
    fn projection_copies_fields_and_picks_the_path(
        pending in pending_strategy(),
        size in any::<u64>(),
        use_local_path in any::<bool>(),
    ) {
        let outcome = pending.clone().succeeded(size);
        let entry = outcome.to_file_entry(use_local_path);

        prop_assert_eq!(entry.kind, outcome.kind());
        prop_assert_eq!(entry.size, outcome.size());
        prop_assert_eq!(entry.name.as_str(), outcome.name());

        let expected_path = if use_local_path {
            pending.local_path()
        } else {
            pending.remote_path()
        };
        prop_assert_eq!(entry.full_path.as_str(), expected_path);
    }

    #[test]
    fn record_rejects_reads_before_and_writes_after_finalization(
        pending in pending_strategy(),
        first_size in any::<u64>(),
        second in status_strategy(),
    ) {
        let mut record = TransferRecord::from(pending.clone());

        let not_finalized = ContractViolation::NotFinalized { name: pending.name().to_string() };
        prop_assert_eq!(record.to_file_entry(true).unwrap_err(), not_finalized.clone());
        prop_assert_eq!(record.outcome().unwrap_err(), not_finalized);

        record
            .finalize(StatusKind::Skipped, Some(first_size), None)
            .expect("consistent finalize");

        let error = (second == StatusKind::Failed).then(|| TransferError::msg("late"));
        let rejected = record.finalize(second, Some(1), error);
        prop_assert_eq!(
            rejected.unwrap_err(),
            ContractViolation::AlreadyFinalized { name: pending.name().to_string() }
        );

        let outcome = record.outcome().expect("finalized");
        prop_assert!(outcome.is_skipped());
        prop_assert_eq!(outcome.size(), first_size);
        prop_assert!(outcome.error().is_none());
    }
}
