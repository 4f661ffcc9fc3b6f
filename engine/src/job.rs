//! Job orchestration module.
//!
//! This module provides the main job lifecycle functions:
//! - Creating a job from source/destination paths
//! - Planning a job (enumerating the source tree into pending records)
//! - Running a job (finalizing one outcome per item)
//! - Verifying a job (re-comparing the destination with the outcomes)

use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::compare::{compare_entries, Mismatch};
use crate::error::EngineError;
use crate::fs_ops::{self, PlannedEntry};
use crate::model::{
    Direction, EntryKind, ExistsPolicy, FileEntry, JobItem, JobOptions, JobState, TransferJob,
};
use crate::outcome::{StatusKind, TransferError, TransferOutcome, TransferRecord};
use crate::progress::ProgressCallback;
use crate::summary::TransferSummary;

impl TransferJob {
    /// Finalized outcomes, in item order.
    pub fn outcomes(&self) -> impl Iterator<Item = &TransferOutcome> + '_ {
        self.items
            .iter()
            .filter_map(|item| item.record.outcome().ok())
    }

    pub fn summary(&self) -> TransferSummary {
        TransferSummary::from_outcomes(self.outcomes())
    }
}

fn ensure_state(job: &TransferJob, expected: JobState) -> Result<(), EngineError> {
    if job.state == expected {
        Ok(())
    } else {
        Err(EngineError::InvalidJobState {
            expected: format!("{:?}", expected),
            actual: format!("{:?}", job.state),
        })
    }
}

/// Determine whether an item must be written given what is already there.
fn should_transfer(source: &FileEntry, destination: &Path, policy: ExistsPolicy) -> bool {
    let Ok(existing) = fs_ops::stat_entry(destination) else {
        return true;
    };

    match policy {
        ExistsPolicy::Skip => false,
        ExistsPolicy::Overwrite => true,
        ExistsPolicy::SmartUpdate => !compare_entries(source, Some(&existing)).is_match(),
    }
}

/// Create a new mirroring job.
///
/// Validates that the source path exists and is a directory. The destination
/// may not exist yet; it is created during execution.
///
/// # Errors
/// Returns EngineError if source doesn't exist or a path is invalid
pub fn create_job<P, Q>(
    source: P,
    destination: Q,
    direction: Direction,
    options: JobOptions,
) -> Result<TransferJob, EngineError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let source = source.as_ref();
    let destination = destination.as_ref();

    match std::fs::metadata(source) {
        Ok(metadata) if !metadata.is_dir() => {
            return Err(EngineError::InvalidPath {
                path: source.to_path_buf(),
                reason: "Source must be a directory".to_string(),
            });
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(EngineError::SourceNotFound {
                path: source.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(EngineError::SourceAccessDenied {
                path: source.to_path_buf(),
                source: e,
            });
        }
    }

    if destination.as_os_str().is_empty() {
        return Err(EngineError::InvalidPath {
            path: destination.to_path_buf(),
            reason: "Destination path is empty".to_string(),
        });
    }

    // both roots end up inside outcome paths
    fs_ops::path_to_string(source)?;
    fs_ops::path_to_string(destination)?;

    Ok(TransferJob {
        id: Uuid::new_v4(),
        direction,
        source_path: source.to_path_buf(),
        destination_path: destination.to_path_buf(),
        options,
        items: Vec::new(),
        state: JobState::Pending,
        total_bytes_to_transfer: 0,
        total_bytes_transferred: 0,
        current_item_index: None,
        created_at: Utc::now(),
        start_time: None,
        end_time: None,
        verification: None,
    })
}

fn plan_item(direction: Direction, planned: PlannedEntry) -> Result<JobItem, EngineError> {
    let source = fs_ops::path_to_string(&planned.source_path)?;
    let destination = fs_ops::path_to_string(&planned.destination_path)?;
    let (remote_path, local_path) = match direction {
        Direction::Upload => (destination, source),
        Direction::Download => (source, destination),
    };

    let mut record = TransferRecord::new(
        planned.entry.kind,
        planned.entry.name.clone(),
        remote_path,
        local_path,
    );

    // a directory that could not be listed is already decided
    if let Some(error) = planned.enumeration_error {
        record.finalize(StatusKind::Failed, None, Some(error.into()))?;
    }

    Ok(JobItem {
        source: planned.entry,
        source_path: planned.source_path,
        destination_path: planned.destination_path,
        record,
    })
}

/// Plan a job by enumerating the source tree.
///
/// Populates job.items with one pending record per entry and calculates
/// job.total_bytes_to_transfer. Planning again replaces the previous plan.
///
/// # Errors
/// Returns EngineError if the job is not Pending or enumeration fails
pub fn plan_job(job: &mut TransferJob) -> Result<(), EngineError> {
    ensure_state(job, JobState::Pending)?;

    let planned = fs_ops::enumerate_tree(&job.source_path, &job.destination_path)?;
    job.items = planned
        .into_iter()
        .map(|entry| plan_item(job.direction, entry))
        .collect::<Result<Vec<_>, _>>()?;

    job.total_bytes_to_transfer = job
        .items
        .iter()
        .filter(|item| item.source.kind == EntryKind::File)
        .map(|item| item.source.size)
        .sum();

    tracing::debug!(
        job_id = %job.id,
        items = job.items.len(),
        bytes = job.total_bytes_to_transfer,
        "job planned"
    );

    Ok(())
}

/// Decide and perform one item. Returns the final status and size, or the
/// error that failed the attempt.
fn process_item(
    job: &mut TransferJob,
    item_index: usize,
    rejected_dirs: &mut Vec<PathBuf>,
    progress_callback: Option<&dyn ProgressCallback>,
) -> Result<(StatusKind, u64), TransferError> {
    let item = &job.items[item_index];
    let source = item.source.clone();
    let source_path = item.source_path.clone();
    let destination = item.destination_path.clone();

    let under_rejected = rejected_dirs.iter().any(|dir| source_path.starts_with(dir));
    if under_rejected || !job.options.rules.accepts(&source) {
        tracing::trace!(name = %source.name, "rejected by rule");
        if source.kind == EntryKind::Directory {
            rejected_dirs.push(source_path);
        }
        return Ok((StatusKind::SkippedByRule, source.size));
    }

    match source.kind {
        EntryKind::Directory => {
            fs_ops::ensure_dir(&destination)?;
            Ok((StatusKind::Succeeded, 0))
        }
        EntryKind::File => {
            if !should_transfer(&source, &destination, job.options.exists_policy) {
                return Ok((StatusKind::Skipped, source.size));
            }

            let bytes = fs_ops::copy_file_with_metadata(&source_path, &destination)?;
            job.total_bytes_transferred += bytes;
            if let Some(callback) = progress_callback {
                callback.on_bytes_transferred(job, item_index, bytes);
            }
            Ok((StatusKind::Succeeded, bytes))
        }
        EntryKind::Link => {
            if !should_transfer(&source, &destination, job.options.exists_policy) {
                return Ok((StatusKind::Skipped, source.size));
            }

            let size = fs_ops::copy_link(&source_path, &destination)?;
            Ok((StatusKind::Succeeded, size))
        }
    }
}

/// Run a job, finalizing one outcome per item.
///
/// Transitions job state from Pending to Running to Completed.
/// Item failures are recorded in the item's outcome and do NOT stop the job.
///
/// # Errors
/// Returns EngineError if the job is not Pending, if the orchestration broke
/// the outcome lifecycle, or if the destination cannot be re-checked.
pub fn run_job(
    job: &mut TransferJob,
    progress_callback: Option<&dyn ProgressCallback>,
) -> Result<(), EngineError> {
    ensure_state(job, JobState::Pending)?;

    job.state = JobState::Running;
    job.start_time = Some(Utc::now());
    tracing::info!(
        job_id = %job.id,
        direction = %job.direction,
        policy = %job.options.exists_policy,
        items = job.items.len(),
        "job started"
    );

    if let Some(callback) = progress_callback {
        callback.on_job_started(job);
    }

    let mut rejected_dirs = Vec::new();
    for item_index in 0..job.items.len() {
        job.current_item_index = Some(item_index);

        if let Some(callback) = progress_callback {
            callback.on_item_started(job, item_index, &job.items[item_index]);
        }

        if !job.items[item_index].record.is_finalized() {
            let attempt = process_item(job, item_index, &mut rejected_dirs, progress_callback);
            let record = &mut job.items[item_index].record;
            let finalized = match attempt {
                Ok((status, size)) => record.finalize(status, Some(size), None),
                Err(error) => record.finalize(StatusKind::Failed, None, Some(error)),
            };
            if let Err(violation) = finalized {
                tracing::warn!(error = %violation, "outcome contract violated");
                return Err(violation.into());
            }
        }

        let outcome = job.items[item_index].record.outcome()?;
        if let Some(error) = outcome.error() {
            tracing::warn!(name = %outcome.name(), error = %error, "item failed");
        }

        if let Some(callback) = progress_callback {
            callback.on_item_completed(job, item_index, outcome);
        }
    }

    job.state = JobState::Completed;
    job.end_time = Some(Utc::now());
    job.current_item_index = None;

    if job.options.verify_after_transfer {
        job.verification = Some(verify_job(job)?);
    }

    let summary = job.summary();
    tracing::info!(
        job_id = %job.id,
        succeeded = summary.succeeded,
        skipped = summary.skipped,
        skipped_by_rule = summary.skipped_by_rule,
        failed = summary.failed,
        bytes = job.total_bytes_transferred,
        "job completed"
    );

    if let Some(callback) = progress_callback {
        callback.on_job_completed(job);
    }

    Ok(())
}

/// Re-compare the destination with what the outcomes say is there.
///
/// Every in-place outcome (transferred, or skipped because it existed) is
/// projected onto the destination side and compared with a fresh listing of
/// that path. Only differing items are returned.
///
/// # Errors
/// Returns EngineError if the job is not Completed or the destination cannot
/// be read.
pub fn verify_job(job: &TransferJob) -> Result<Vec<Mismatch>, EngineError> {
    ensure_state(job, JobState::Completed)?;

    let use_local_path = job.direction.destination_is_local();
    let mut mismatches = Vec::new();

    for (index, item) in job.items.iter().enumerate() {
        let outcome = item.record.outcome()?;
        if !outcome.is_in_place() {
            continue;
        }

        let expected = outcome.to_file_entry(use_local_path);
        let actual = match fs_ops::stat_entry(Path::new(&expected.full_path)) {
            Ok(entry) => Some(entry),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(EngineError::DestinationAccessDenied {
                    path: PathBuf::from(&expected.full_path),
                    source: e,
                });
            }
        };

        let diff = compare_entries(&expected, actual.as_ref());
        if !diff.is_match() {
            tracing::warn!(path = %expected.full_path, ?diff, "destination differs");
            mismatches.push(Mismatch {
                index,
                expected,
                diff,
            });
        }
    }

    Ok(mismatches)
}
