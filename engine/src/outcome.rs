//! Per-item transfer outcomes.
//!
//! An outcome goes through exactly two phases: it is created when the
//! orchestrator starts on one item (kind and paths known), and finalized once
//! when the attempt concludes (status, size and error fixed together).
//!
//! - `PendingOutcome` is the created-but-unfinished value. Finalizing consumes
//!   it, so a finished outcome has no setters left.
//! - `TransferOutcome` is the finished, read-only record.
//! - `TransferRecord` holds either of the two in place, for collaborators that
//!   keep a list of items across the whole job.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::error::{ContractViolation, EngineError};
use crate::model::{EntryKind, FileEntry};

/// Why a specific transfer attempt failed.
///
/// Opaque to the engine: it is stored and handed to reporters verbatim.
/// Cloning shares the underlying error.
#[derive(Clone)]
pub struct TransferError(Arc<dyn StdError + Send + Sync + 'static>);

#[derive(Debug, Error)]
#[error("{0}")]
struct Message(String);

impl TransferError {
    /// Wrap any error as a transfer failure.
    pub fn new<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        TransferError(Arc::new(err))
    }

    /// A failure described only by a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }

    /// Recover the concrete error type, if it is `E`.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        self.0.downcast_ref::<E>()
    }

    pub fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.0
    }
}

impl fmt::Debug for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl StdError for TransferError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<io::Error> for TransferError {
    fn from(err: io::Error) -> Self {
        Self::new(err)
    }
}

impl From<EngineError> for TransferError {
    fn from(err: EngineError) -> Self {
        Self::new(err)
    }
}

/// The terminal classification of an attempt, without its error payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// Transferred
    Succeeded,
    /// Not transferred; the destination already had it
    Skipped,
    /// Not transferred; a rule rejected it
    SkippedByRule,
    /// Attempted and failed
    Failed,
}

impl StatusKind {
    /// SkippedByRule counts as skipped too.
    pub fn is_skipped(&self) -> bool {
        matches!(self, StatusKind::Skipped | StatusKind::SkippedByRule)
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusKind::Succeeded => write!(f, "succeeded"),
            StatusKind::Skipped => write!(f, "skipped"),
            StatusKind::SkippedByRule => write!(f, "skipped by rule"),
            StatusKind::Failed => write!(f, "failed"),
        }
    }
}

/// The terminal status of a finalized outcome.
///
/// The error only exists inside `Failed`, so a status can never be both
/// failed and something else, and an error can never sit next to a success.
#[derive(Debug, Clone)]
pub enum TransferStatus {
    Succeeded,
    Skipped,
    SkippedByRule,
    Failed(TransferError),
}

impl TransferStatus {
    pub fn kind(&self) -> StatusKind {
        match self {
            TransferStatus::Succeeded => StatusKind::Succeeded,
            TransferStatus::Skipped => StatusKind::Skipped,
            TransferStatus::SkippedByRule => StatusKind::SkippedByRule,
            TransferStatus::Failed(_) => StatusKind::Failed,
        }
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, TransferStatus::Succeeded)
    }

    /// True for both plain skips and rule skips.
    pub fn is_skipped(&self) -> bool {
        self.kind().is_skipped()
    }

    pub fn is_skipped_by_rule(&self) -> bool {
        matches!(self, TransferStatus::SkippedByRule)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TransferStatus::Failed(_))
    }

    /// True when the destination holds the item after this attempt:
    /// it was transferred, or it was already there and left alone.
    pub fn is_in_place(&self) -> bool {
        matches!(self, TransferStatus::Succeeded | TransferStatus::Skipped)
    }

    pub fn error(&self) -> Option<&TransferError> {
        match self {
            TransferStatus::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Checks a (status, size, error) triple and turns it into a status value.
fn resolve(
    name: &str,
    status: StatusKind,
    size: Option<u64>,
    error: Option<TransferError>,
) -> Result<(TransferStatus, u64), ContractViolation> {
    let status = match (status, error) {
        (StatusKind::Failed, Some(error)) => {
            // nothing may have been confirmed before the failure
            return Ok((TransferStatus::Failed(error), size.unwrap_or(0)));
        }
        (StatusKind::Failed, None) => {
            return Err(ContractViolation::MissingError {
                name: name.to_string(),
            });
        }
        (status, Some(_)) => {
            return Err(ContractViolation::UnexpectedError {
                name: name.to_string(),
                status,
            });
        }
        (StatusKind::Succeeded, None) => TransferStatus::Succeeded,
        (StatusKind::Skipped, None) => TransferStatus::Skipped,
        (StatusKind::SkippedByRule, None) => TransferStatus::SkippedByRule,
    };

    let size = size.ok_or_else(|| ContractViolation::MissingSize {
        name: name.to_string(),
        status: status.kind(),
    })?;

    Ok((status, size))
}

/// An outcome whose attempt has started but not yet concluded.
///
/// Finalizing consumes the value, so finalizing twice does not compile:
///
/// ```compile_fail
/// use mirror_engine::{EntryKind, PendingOutcome};
///
/// let pending = PendingOutcome::new(EntryKind::File, "a.txt", "/r/a.txt", "/l/a.txt");
/// let first = pending.succeeded(42);
/// let second = pending.succeeded(7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOutcome {
    kind: EntryKind,
    name: String,
    remote_path: String,
    local_path: String,
}

impl PendingOutcome {
    pub fn new(
        kind: EntryKind,
        name: impl Into<String>,
        remote_path: impl Into<String>,
        local_path: impl Into<String>,
    ) -> Self {
        PendingOutcome {
            kind,
            name: name.into(),
            remote_path: remote_path.into(),
            local_path: local_path.into(),
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }

    pub fn local_path(&self) -> &str {
        &self.local_path
    }

    /// Conclude the attempt.
    ///
    /// `error` must be given exactly when `status` is `Failed`. `size` is
    /// required unless the attempt failed, in which case a missing size is
    /// recorded as 0.
    ///
    /// # Errors
    /// Returns a `ContractViolation` when the inputs contradict each other.
    pub fn finalize(
        self,
        status: StatusKind,
        size: Option<u64>,
        error: Option<TransferError>,
    ) -> Result<TransferOutcome, ContractViolation> {
        let (status, size) = resolve(&self.name, status, size, error)?;
        Ok(self.complete(status, size))
    }

    pub fn succeeded(self, size: u64) -> TransferOutcome {
        self.complete(TransferStatus::Succeeded, size)
    }

    pub fn skipped(self, size: u64) -> TransferOutcome {
        self.complete(TransferStatus::Skipped, size)
    }

    pub fn skipped_by_rule(self, size: u64) -> TransferOutcome {
        self.complete(TransferStatus::SkippedByRule, size)
    }

    pub fn failed(self, error: TransferError, size: Option<u64>) -> TransferOutcome {
        self.complete(TransferStatus::Failed(error), size.unwrap_or(0))
    }

    fn complete(self, status: TransferStatus, size: u64) -> TransferOutcome {
        tracing::debug!(
            name = %self.name,
            kind = %self.kind,
            status = %status.kind(),
            size,
            "outcome finalized"
        );

        TransferOutcome {
            kind: self.kind,
            size,
            name: self.name,
            remote_path: self.remote_path,
            local_path: self.local_path,
            status,
        }
    }
}

/// The finished record of one transfer attempt.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    kind: EntryKind,
    size: u64,
    name: String,
    remote_path: String,
    local_path: String,
    status: TransferStatus,
}

impl TransferOutcome {
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Byte length of the object (0 for directories and early failures).
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Base name with extension.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }

    pub fn local_path(&self) -> &str {
        &self.local_path
    }

    pub fn status(&self) -> &TransferStatus {
        &self.status
    }

    /// Present exactly when the status is `Failed`.
    pub fn error(&self) -> Option<&TransferError> {
        self.status.error()
    }

    pub fn is_succeeded(&self) -> bool {
        self.status.is_succeeded()
    }

    pub fn is_skipped(&self) -> bool {
        self.status.is_skipped()
    }

    pub fn is_skipped_by_rule(&self) -> bool {
        self.status.is_skipped_by_rule()
    }

    pub fn is_failed(&self) -> bool {
        self.status.is_failed()
    }

    pub fn is_in_place(&self) -> bool {
        self.status.is_in_place()
    }

    /// Project this outcome onto a generic entry descriptor.
    ///
    /// `full_path` is the local path when `use_local_path` is set, the
    /// remote path otherwise. Kind, size and name are copied verbatim.
    pub fn to_file_entry(&self, use_local_path: bool) -> FileEntry {
        let full_path = if use_local_path {
            &self.local_path
        } else {
            &self.remote_path
        };

        FileEntry::new(self.kind, self.size, self.name.clone(), full_path.clone())
    }
}

impl fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            TransferStatus::Failed(error) => write!(f, "{}: failed ({})", self.name, error),
            status => write!(f, "{}: {}", self.name, status.kind()),
        }
    }
}

impl Serialize for TransferOutcome {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        struct Report<'a> {
            kind: EntryKind,
            size: u64,
            name: &'a str,
            remote_path: &'a str,
            local_path: &'a str,
            status: StatusKind,
            error: Option<String>,
        }

        Report {
            kind: self.kind,
            size: self.size,
            name: &self.name,
            remote_path: &self.remote_path,
            local_path: &self.local_path,
            status: self.status.kind(),
            error: self.error().map(|e| e.to_string()),
        }
        .serialize(serializer)
    }
}

/// An outcome held in place across its lifecycle.
///
/// Unlike `PendingOutcome`, misuse is caught at runtime: finalizing twice or
/// reading a pending record returns a `ContractViolation`.
#[derive(Debug, Clone)]
pub enum TransferRecord {
    Pending(PendingOutcome),
    Finalized(TransferOutcome),
}

impl TransferRecord {
    pub fn new(
        kind: EntryKind,
        name: impl Into<String>,
        remote_path: impl Into<String>,
        local_path: impl Into<String>,
    ) -> Self {
        TransferRecord::Pending(PendingOutcome::new(kind, name, remote_path, local_path))
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self, TransferRecord::Finalized(_))
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            TransferRecord::Pending(pending) => pending.kind(),
            TransferRecord::Finalized(outcome) => outcome.kind(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TransferRecord::Pending(pending) => pending.name(),
            TransferRecord::Finalized(outcome) => outcome.name(),
        }
    }

    pub fn remote_path(&self) -> &str {
        match self {
            TransferRecord::Pending(pending) => pending.remote_path(),
            TransferRecord::Finalized(outcome) => outcome.remote_path(),
        }
    }

    pub fn local_path(&self) -> &str {
        match self {
            TransferRecord::Pending(pending) => pending.local_path(),
            TransferRecord::Finalized(outcome) => outcome.local_path(),
        }
    }

    /// Finalize the record in place.
    ///
    /// A rejected call leaves the record untouched, pending or not.
    ///
    /// # Errors
    /// `AlreadyFinalized` on a second call, otherwise the same violations as
    /// `PendingOutcome::finalize`.
    pub fn finalize(
        &mut self,
        status: StatusKind,
        size: Option<u64>,
        error: Option<TransferError>,
    ) -> Result<&TransferOutcome, ContractViolation> {
        let pending = match self {
            TransferRecord::Finalized(outcome) => {
                return Err(ContractViolation::AlreadyFinalized {
                    name: outcome.name().to_string(),
                });
            }
            TransferRecord::Pending(pending) => pending,
        };

        let (status, size) = resolve(pending.name(), status, size, error)?;
        let outcome = pending.clone().complete(status, size);
        *self = TransferRecord::Finalized(outcome);
        self.outcome()
    }

    /// The finalized outcome.
    ///
    /// # Errors
    /// `NotFinalized` while the record is pending.
    pub fn outcome(&self) -> Result<&TransferOutcome, ContractViolation> {
        match self {
            TransferRecord::Finalized(outcome) => Ok(outcome),
            TransferRecord::Pending(pending) => Err(ContractViolation::NotFinalized {
                name: pending.name().to_string(),
            }),
        }
    }

    pub fn into_outcome(self) -> Result<TransferOutcome, ContractViolation> {
        match self {
            TransferRecord::Finalized(outcome) => Ok(outcome),
            TransferRecord::Pending(pending) => Err(ContractViolation::NotFinalized {
                name: pending.name,
            }),
        }
    }

    /// See `TransferOutcome::to_file_entry`.
    ///
    /// # Errors
    /// `NotFinalized` while the record is pending.
    pub fn to_file_entry(&self, use_local_path: bool) -> Result<FileEntry, ContractViolation> {
        self.outcome().map(|outcome| outcome.to_file_entry(use_local_path))
    }
}

impl From<PendingOutcome> for TransferRecord {
    fn from(pending: PendingOutcome) -> Self {
        TransferRecord::Pending(pending)
    }
}

impl From<TransferOutcome> for TransferRecord {
    fn from(outcome: TransferOutcome) -> Self {
        TransferRecord::Finalized(outcome)
    }
}
