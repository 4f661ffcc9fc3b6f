//! Progress reporting trait.
//!
//! This module defines the ProgressCallback trait, which keeps the engine
//! independent of how progress is shown.

use crate::model::{JobItem, TransferJob};
use crate::outcome::TransferOutcome;

/// Trait for receiving progress updates from a job.
///
/// All methods are called synchronously during `run_job`.
pub trait ProgressCallback: Send {
    /// Called when job execution starts.
    fn on_job_started(&self, job: &TransferJob);

    /// Called when an item is about to be processed.
    fn on_item_started(&self, job: &TransferJob, item_index: usize, item: &JobItem);

    /// Called after bytes were written for the current item.
    fn on_bytes_transferred(&self, job: &TransferJob, item_index: usize, bytes_this_item: u64);

    /// Called once the item's outcome is final.
    fn on_item_completed(&self, job: &TransferJob, item_index: usize, outcome: &TransferOutcome);

    /// Called when every item has been processed.
    fn on_job_completed(&self, job: &TransferJob);
}
