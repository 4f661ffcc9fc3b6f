//! Entry-level comparison between an expected and an observed entry.
//!
//! Used to re-check a destination after a run: the expected side is usually a
//! projected outcome, the observed side a fresh listing of the same path.

use serde::Serialize;

use crate::model::{EntryKind, FileEntry};

/// Result of comparing two entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "diff")]
pub enum EntryDiff {
    /// Same kind and, for files, same size
    Match,
    /// Nothing at the expected path
    Missing,
    KindMismatch { expected: EntryKind, actual: EntryKind },
    SizeMismatch { expected: u64, actual: u64 },
}

impl EntryDiff {
    pub fn is_match(&self) -> bool {
        matches!(self, EntryDiff::Match)
    }
}

/// An item whose destination does not match its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    /// Index of the item within its job
    pub index: usize,

    /// What the outcome says should be at the destination
    pub expected: FileEntry,

    pub diff: EntryDiff,
}

/// Compare an expected entry with what was actually found.
///
/// Sizes are only compared for files; directory and link sizes are not
/// meaningful across filesystems.
pub fn compare_entries(expected: &FileEntry, actual: Option<&FileEntry>) -> EntryDiff {
    let Some(actual) = actual else {
        return EntryDiff::Missing;
    };

    if expected.kind != actual.kind {
        return EntryDiff::KindMismatch {
            expected: expected.kind,
            actual: actual.kind,
        };
    }

    if expected.kind == EntryKind::File && expected.size != actual.size {
        return EntryDiff::SizeMismatch {
            expected: expected.size,
            actual: actual.size,
        };
    }

    EntryDiff::Match
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_files_match() {
        let entry = FileEntry::new(EntryKind::File, 42, "a.txt", "/r/a.txt");
        assert!(compare_entries(&entry, Some(&entry.clone())).is_match());
    }

    #[test]
    fn test_missing_entry() {
        let entry = FileEntry::new(EntryKind::File, 42, "a.txt", "/r/a.txt");
        assert_eq!(compare_entries(&entry, None), EntryDiff::Missing);
    }

    #[test]
    fn test_size_mismatch_for_files_only() {
        let expected = FileEntry::new(EntryKind::File, 42, "a.txt", "/r/a.txt");
        let actual = FileEntry::new(EntryKind::File, 41, "a.txt", "/r/a.txt");
        assert_eq!(
            compare_entries(&expected, Some(&actual)),
            EntryDiff::SizeMismatch {
                expected: 42,
                actual: 41
            }
        );

        let expected = FileEntry::new(EntryKind::Directory, 0, "d", "/r/d");
        let actual = FileEntry::new(EntryKind::Directory, 4096, "d", "/r/d");
        assert!(compare_entries(&expected, Some(&actual)).is_match());
    }

    #[test]
    fn test_kind_mismatch() {
        let expected = FileEntry::new(EntryKind::Link, 7, "l", "/r/l");
        let actual = FileEntry::new(EntryKind::File, 7, "l", "/r/l");
        assert_eq!(
            compare_entries(&expected, Some(&actual)),
            EntryDiff::KindMismatch {
                expected: EntryKind::Link,
                actual: EntryKind::File
            }
        );
    }
}
