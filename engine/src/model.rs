//! Core data model for mirroring jobs.
//!
//! This module defines the main data structures shared across the engine:
//! - EntryKind, FileEntry: a uniform descriptor for filesystem entries
//! - TransferJob, JobItem: one mirroring operation and its items
//! - Direction, ExistsPolicy, JobState: enums controlling behavior

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::compare::Mismatch;
use crate::outcome::TransferRecord;
use crate::rules::RuleSet;

/// The type of filesystem object an entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Symbolic link (never followed)
    Link,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Directory => write!(f, "directory"),
            EntryKind::Link => write!(f, "link"),
        }
    }
}

/// A generic filesystem-entry descriptor.
///
/// Local listings and projected transfer outcomes share this shape, so the
/// same comparison logic applies to both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileEntry {
    /// What kind of object this is
    pub kind: EntryKind,

    /// Size in bytes (0 for directories)
    pub size: u64,

    /// Base name with extension
    pub name: String,

    /// Absolute path of the entry
    pub full_path: String,
}

impl FileEntry {
    pub fn new(
        kind: EntryKind,
        size: u64,
        name: impl Into<String>,
        full_path: impl Into<String>,
    ) -> Self {
        FileEntry {
            kind,
            size,
            name: name.into(),
            full_path: full_path.into(),
        }
    }

    /// Extension of the entry name without the leading dot, if any.
    pub fn extension(&self) -> Option<&str> {
        match self.name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
            _ => None,
        }
    }
}

/// Which side of a job plays the "local" role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Source tree is local, destination is remote
    #[default]
    Upload,
    /// Source tree is remote, destination is local
    Download,
}

impl Direction {
    /// True when the destination side is recorded as the local path.
    pub fn destination_is_local(&self) -> bool {
        matches!(self, Direction::Download)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Upload => write!(f, "Upload"),
            Direction::Download => write!(f, "Download"),
        }
    }
}

/// Policy for handling files that already exist at the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistsPolicy {
    /// Don't overwrite; skip existing files
    #[default]
    Skip,
    /// Always overwrite existing files
    Overwrite,
    /// Overwrite only if the size differs
    SmartUpdate,
}

impl fmt::Display for ExistsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExistsPolicy::Skip => write!(f, "Skip"),
            ExistsPolicy::Overwrite => write!(f, "Overwrite"),
            ExistsPolicy::SmartUpdate => write!(f, "SmartUpdate"),
        }
    }
}

/// The state of an entire job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Created, not yet started
    Pending,
    /// Currently executing
    Running,
    /// All items processed (some may have failed)
    Completed,
}

/// Options controlling how a job treats each item.
#[derive(Debug, Default)]
pub struct JobOptions {
    /// How to handle existing destination files
    pub exists_policy: ExistsPolicy,

    /// Filters deciding which items are skipped by rule
    pub rules: RuleSet,

    /// Re-compare the destination against the outcomes after the run
    pub verify_after_transfer: bool,
}

/// Represents a single mirroring job.
#[derive(Debug)]
pub struct TransferJob {
    /// Unique identifier for this job
    pub id: Uuid,

    /// Which side is local
    pub direction: Direction,

    /// Root source directory
    pub source_path: PathBuf,

    /// Root destination directory
    pub destination_path: PathBuf,

    pub options: JobOptions,

    /// All items in this job, in planning order
    pub items: Vec<JobItem>,

    /// Current job state (Pending, Running, Completed)
    pub state: JobState,

    /// Total bytes of all planned files
    pub total_bytes_to_transfer: u64,

    /// Bytes actually written so far
    pub total_bytes_transferred: u64,

    /// Index of currently processing item (if Running)
    pub current_item_index: Option<usize>,

    /// When job was created
    pub created_at: DateTime<Utc>,

    /// When job execution started
    pub start_time: Option<DateTime<Utc>>,

    /// When job execution completed
    pub end_time: Option<DateTime<Utc>>,

    /// Destination re-check results, when `verify_after_transfer` is set
    pub verification: Option<Vec<Mismatch>>,
}

/// One planned item of a job and its transfer record.
#[derive(Debug, Clone)]
pub struct JobItem {
    /// Source-side listing of the item
    pub source: FileEntry,

    pub source_path: PathBuf,

    /// Where the item lands
    pub destination_path: PathBuf,

    /// Pending until the item is processed, finalized afterwards
    pub record: TransferRecord,
}
