//! # Mirror Engine - transfer outcomes for bulk mirroring
//!
//! A headless engine that mirrors a directory tree and records, for every
//! file, directory and link, one immutable outcome of its transfer attempt.
//!
//! ## Overview
//!
//! - Per-item outcomes with a single terminal status
//!   (succeeded, skipped, skipped by rule, failed with its error)
//! - Projection of outcomes back onto a generic `FileEntry`, so a finished
//!   transfer can be re-compared with a fresh listing of the destination
//! - Rules deciding which items are skipped
//! - Configurable handling of existing destination files
//! - Progress reporting via callbacks (decoupled from UI technology)
//!
//! ## Recording a single outcome
//!
//! ```
//! use mirror_engine::{EntryKind, FileEntry, PendingOutcome, StatusKind};
//!
//! let pending = PendingOutcome::new(EntryKind::File, "a.txt", "/r/a.txt", "/l/a.txt");
//! let outcome = pending.finalize(StatusKind::Succeeded, Some(42), None)?;
//!
//! assert!(outcome.is_succeeded());
//! assert_eq!(
//!     outcome.to_file_entry(false),
//!     FileEntry::new(EntryKind::File, 42, "a.txt", "/r/a.txt"),
//! );
//! # Ok::<(), mirror_engine::ContractViolation>(())
//! ```
//!
//! ## Mirroring a tree
//!
//! ```no_run
//! use mirror_engine::{create_job, plan_job, run_job, Direction, JobOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut job = create_job("/data/src", "/mnt/backup", Direction::Upload, JobOptions::default())?;
//! plan_job(&mut job)?;
//! run_job(&mut job, None)?;
//!
//! for outcome in job.outcomes() {
//!     println!("{outcome}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - **outcome**: Outcome lifecycle (PendingOutcome, TransferOutcome, TransferRecord)
//! - **model**: Shared data structures (FileEntry, TransferJob, enums)
//! - **error**: Contract violations and job-level errors
//! - **rules**: Skip-by-rule filters
//! - **compare**: Entry comparison for re-checking a destination
//! - **fs_ops**: Low-level filesystem operations
//! - **job**: Job orchestration (create, plan, run, verify)
//! - **progress**: Progress callback trait
//! - **summary**: Per-status totals

pub mod compare;
pub mod error;
pub mod fs_ops;
pub mod job;
pub mod model;
pub mod outcome;
pub mod progress;
pub mod rules;
pub mod summary;

// Re-export main types and functions
pub use compare::{compare_entries, EntryDiff, Mismatch};
pub use error::{ContractViolation, EngineError};
pub use job::{create_job, plan_job, run_job, verify_job};
pub use model::{
    Direction, EntryKind, ExistsPolicy, FileEntry, JobItem, JobOptions, JobState, TransferJob,
};
pub use outcome::{
    PendingOutcome, StatusKind, TransferError, TransferOutcome, TransferRecord, TransferStatus,
};
pub use progress::ProgressCallback;
pub use rules::{ExtensionRule, NameRule, RuleMode, RuleSet, SizeRule, TransferRule};
pub use summary::TransferSummary;
