//! Filesystem operations module.
//!
//! This module provides low-level operations for:
//! - Listing single entries and whole trees as `FileEntry` values
//! - Copying files with metadata preservation
//! - Recreating links and directories

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::EngineError;
use crate::model::{EntryKind, FileEntry};

/// One source entry found during planning.
#[derive(Debug)]
pub struct PlannedEntry {
    /// Source-side listing (`full_path` is the source path)
    pub entry: FileEntry,

    pub source_path: PathBuf,

    pub destination_path: PathBuf,

    /// Set on a directory whose contents could not be listed
    pub enumeration_error: Option<EngineError>,
}

/// Convert a path to a string, rejecting anything that is not UTF-8.
pub fn path_to_string(path: &Path) -> Result<String, EngineError> {
    path.to_str()
        .map(str::to_owned)
        .ok_or_else(|| EngineError::InvalidPath {
            path: path.to_path_buf(),
            reason: "path is not valid UTF-8".to_string(),
        })
}

fn kind_of(metadata: &fs::Metadata) -> EntryKind {
    let file_type = metadata.file_type();
    if file_type.is_symlink() {
        EntryKind::Link
    } else if file_type.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    }
}

fn size_of(kind: EntryKind, metadata: &fs::Metadata) -> u64 {
    match kind {
        EntryKind::Directory => 0,
        EntryKind::File | EntryKind::Link => metadata.len(),
    }
}

/// List a single path as a `FileEntry`. Links are not followed.
pub fn stat_entry(path: &Path) -> io::Result<FileEntry> {
    let metadata = fs::symlink_metadata(path)?;
    let kind = kind_of(&metadata);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(FileEntry::new(
        kind,
        size_of(kind, &metadata),
        name,
        path.to_string_lossy().into_owned(),
    ))
}

/// Build the planned entry for one child of a listed directory. A child that
/// cannot be stat'ed is kept as a file of size 0 with its error attached.
fn planned_child(
    name: &str,
    entry_path: &Path,
    dest_path: &Path,
    metadata: io::Result<fs::Metadata>,
) -> PlannedEntry {
    let (kind, size, enumeration_error) = match metadata {
        Ok(metadata) => {
            let kind = kind_of(&metadata);
            (kind, size_of(kind, &metadata), None)
        }
        Err(e) => {
            tracing::warn!(path = %entry_path.display(), error = %e, "cannot stat entry");
            let error = EngineError::EnumerationFailed {
                path: entry_path.to_path_buf(),
                source: e,
            };
            (EntryKind::File, 0, Some(error))
        }
    };

    PlannedEntry {
        entry: FileEntry::new(kind, size, name, entry_path.to_string_lossy().into_owned()),
        source_path: entry_path.to_path_buf(),
        destination_path: dest_path.to_path_buf(),
        enumeration_error,
    }
}

/// Enumerate the source directory tree and return all entries below it.
///
/// Entries are sorted by name within each directory and every directory
/// comes before its contents.
///
/// # Errors
/// Returns EngineError if the root itself cannot be listed. A subdirectory
/// that cannot be listed, or a child that cannot be stat'ed, is kept with
/// its error attached.
pub fn enumerate_tree(
    source: &Path,
    destination_root: &Path,
) -> Result<Vec<PlannedEntry>, EngineError> {
    fn list_sorted(path: &Path) -> Result<Vec<fs::DirEntry>, EngineError> {
        let reader = fs::read_dir(path).map_err(|e| EngineError::EnumerationFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut entries = reader
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| EngineError::EnumerationFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
        entries.sort_by_key(|entry| entry.file_name());
        Ok(entries)
    }

    fn recurse(
        path: &Path,
        destination: &Path,
        items: &mut Vec<PlannedEntry>,
    ) -> Result<(), EngineError> {
        for dir_entry in list_sorted(path)? {
            let entry_path = dir_entry.path();
            let file_name = dir_entry.file_name();
            let Some(name) = file_name.to_str() else {
                tracing::warn!(path = %entry_path.display(), "skipping entry with non UTF-8 name");
                continue;
            };

            let dest_path = destination.join(name);
            let planned = planned_child(
                name,
                &entry_path,
                &dest_path,
                fs::symlink_metadata(&entry_path),
            );
            let is_dir = planned.entry.kind == EntryKind::Directory
                && planned.enumeration_error.is_none();
            items.push(planned);

            if is_dir {
                let index = items.len() - 1;
                if let Err(e) = recurse(&entry_path, &dest_path, items) {
                    tracing::warn!(path = %entry_path.display(), error = %e, "cannot list directory");
                    items[index].enumeration_error = Some(e);
                }
            }
        }
        Ok(())
    }

    let mut items = Vec::new();
    recurse(source, destination_root, &mut items)?;
    Ok(items)
}

/// Copy a file from source to destination with metadata preservation.
///
/// A link at the destination is replaced, never followed.
///
/// # Returns
/// Number of bytes copied
///
/// # Errors
/// Returns EngineError if the copy fails
pub fn copy_file_with_metadata(src: &Path, dst: &Path) -> Result<u64, EngineError> {
    ensure_parent_dir_exists(dst)?;

    let mut src_file = fs::File::open(src).map_err(|e| EngineError::ReadError {
        path: src.to_path_buf(),
        source: e,
    })?;

    let src_mtime = src_file
        .metadata()
        .map_err(|e| EngineError::ReadError {
            path: src.to_path_buf(),
            source: e,
        })?
        .modified()
        .ok();

    clear_destination(dst, "a directory is in the way of the file")?;

    let mut dst_file = fs::File::create(dst).map_err(|e| EngineError::WriteError {
        path: dst.to_path_buf(),
        source: e,
    })?;

    let bytes_copied = io::copy(&mut src_file, &mut dst_file).map_err(|e| {
        if e.kind() == io::ErrorKind::PermissionDenied {
            EngineError::WriteError {
                path: dst.to_path_buf(),
                source: e,
            }
        } else {
            EngineError::ReadError {
                path: src.to_path_buf(),
                source: e,
            }
        }
    })?;
    drop(dst_file);

    if let Some(mtime) = src_mtime {
        if let Err(e) = filetime::set_file_mtime(dst, filetime::FileTime::from_system_time(mtime)) {
            tracing::debug!(path = %dst.display(), error = %e, "could not preserve mtime");
        }
    }

    Ok(bytes_copied)
}

/// Remove a file or link sitting at `dst`, so nothing is written through a
/// link into its target. A directory at `dst` is a write error.
fn clear_destination(dst: &Path, in_the_way: &str) -> Result<(), EngineError> {
    let Ok(existing) = fs::symlink_metadata(dst) else {
        return Ok(());
    };

    if existing.is_dir() {
        return Err(EngineError::WriteError {
            path: dst.to_path_buf(),
            source: io::Error::new(io::ErrorKind::AlreadyExists, in_the_way),
        });
    }

    fs::remove_file(dst).map_err(|e| EngineError::WriteError {
        path: dst.to_path_buf(),
        source: e,
    })
}

/// Recreate the symbolic link `src` at `dst`, replacing an existing link or file.
///
/// # Returns
/// Size of the new link as reported by the filesystem
pub fn copy_link(src: &Path, dst: &Path) -> Result<u64, EngineError> {
    let target = fs::read_link(src).map_err(|e| EngineError::ReadError {
        path: src.to_path_buf(),
        source: e,
    })?;

    ensure_parent_dir_exists(dst)?;

    clear_destination(dst, "a directory is in the way of the link")?;

    create_symlink(&target, dst)?;

    fs::symlink_metadata(dst)
        .map(|m| m.len())
        .map_err(|e| EngineError::WriteError {
            path: dst.to_path_buf(),
            source: e,
        })
}

#[cfg(unix)]
fn create_symlink(target: &Path, dst: &Path) -> Result<(), EngineError> {
    std::os::unix::fs::symlink(target, dst).map_err(|e| EngineError::WriteError {
        path: dst.to_path_buf(),
        source: e,
    })
}

#[cfg(not(unix))]
fn create_symlink(_target: &Path, dst: &Path) -> Result<(), EngineError> {
    Err(EngineError::Unsupported {
        path: dst.to_path_buf(),
        reason: "symbolic links are only recreated on unix".to_string(),
    })
}

/// Create a directory and any missing parents.
pub fn ensure_dir(path: &Path) -> Result<(), EngineError> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(EngineError::DirectoryCreationFailed {
            path: path.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::AlreadyExists,
                "path exists but is not a directory",
            ),
        }),
        Err(_) => fs::create_dir_all(path).map_err(|e| EngineError::DirectoryCreationFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Ensure the parent directory of a path exists, creating it if necessary.
pub fn ensure_parent_dir_exists(path: &Path) -> Result<(), EngineError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}
