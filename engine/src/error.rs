//! Error types for the mirroring engine.
//!
//! Two families live here:
//! - `ContractViolation`: a caller misused the outcome lifecycle. These are
//!   bugs in the orchestrator and are never retried.
//! - `EngineError`: job-level errors that stop a job from being planned or
//!   run. Per-item failures are recorded in the item's outcome instead.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::outcome::StatusKind;

/// Misuse of the create/finalize lifecycle of a transfer outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    /// Status was Failed but no error was supplied
    #[error("outcome for '{name}' finalized as failed without an error")]
    MissingError { name: String },

    /// An error was supplied alongside a non-failed status
    #[error("outcome for '{name}' finalized as {status} but carries an error")]
    UnexpectedError { name: String, status: StatusKind },

    /// Size is mandatory unless the transfer failed
    #[error("outcome for '{name}' finalized as {status} without a size")]
    MissingSize { name: String, status: StatusKind },

    /// Finalize was called on an outcome that is already final
    #[error("outcome for '{name}' is already finalized")]
    AlreadyFinalized { name: String },

    /// A finalized view was requested from a pending outcome
    #[error("outcome for '{name}' is not finalized yet")]
    NotFinalized { name: String },
}

/// Errors that can occur at the job level (preventing execution).
#[derive(Debug, Error)]
pub enum EngineError {
    /// Source directory does not exist
    #[error("Source directory not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// Source directory is not accessible (permissions)
    #[error("Source directory access denied: {}", path.display())]
    SourceAccessDenied { path: PathBuf, source: io::Error },

    /// Destination is not accessible
    #[error("Destination access denied: {}", path.display())]
    DestinationAccessDenied { path: PathBuf, source: io::Error },

    /// Failed to read from source
    #[error("Failed to read: {}", path.display())]
    ReadError { path: PathBuf, source: io::Error },

    /// Failed to write to destination
    #[error("Failed to write: {}", path.display())]
    WriteError { path: PathBuf, source: io::Error },

    /// Path is invalid for this engine (empty, not UTF-8, ...)
    #[error("Invalid path: {} ({})", path.display(), reason)]
    InvalidPath { path: PathBuf, reason: String },

    /// Failed to enumerate source directory
    #[error("Failed to enumerate directory: {}", path.display())]
    EnumerationFailed { path: PathBuf, source: io::Error },

    /// Failed to create a directory
    #[error("Failed to create directory: {}", path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    /// Operation not available on this platform
    #[error("Unsupported operation on {}: {}", path.display(), reason)]
    Unsupported { path: PathBuf, reason: String },

    /// Job is not in the state the operation requires
    #[error("Job must be in {expected} state; current state: {actual}")]
    InvalidJobState { expected: String, actual: String },

    /// The orchestrator broke the outcome lifecycle
    #[error(transparent)]
    Contract(#[from] ContractViolation),
}

impl EngineError {
    /// Extract the OS error code from this error, if available.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::SourceAccessDenied { source, .. }
            | Self::DestinationAccessDenied { source, .. }
            | Self::ReadError { source, .. }
            | Self::WriteError { source, .. }
            | Self::EnumerationFailed { source, .. }
            | Self::DirectoryCreationFailed { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}
