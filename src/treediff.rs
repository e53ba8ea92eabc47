//! Structural diff between two directory trees
//!
//! Compares two resolved filesystem roots entry by entry and yields three
//! ordered lists: modified, removed, and added. Entries are keyed by path
//! relative to their root; files compare by kind, executable bit, and
//! SHA-256 content hash, symlinks by target. The result is built fully in
//! memory, consumed once by the report renderer, then discarded.

use crate::error::{Result, RevDiffError};
use crate::types::CancellationToken;
use crate::util::hash_file;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// What a tree entry is, with enough detail to decide equality
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file
    File {
        /// Whether the executable bit is set
        executable: bool,
    },
    /// Directory
    Dir,
    /// Symbolic link
    Symlink {
        /// Link target
        target: PathBuf,
    },
}

/// One entry of a tree diff result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    /// Path relative to the compared roots
    pub path: PathBuf,
    /// Entry kind on the side the entry was taken from (the new side for
    /// modified entries)
    pub kind: EntryKind,
}

/// Result of comparing two directory trees
///
/// All three lists are ordered by relative path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeDiff {
    /// Entries present in both trees with differing content or metadata
    pub modified: Vec<DiffEntry>,
    /// Entries present only in the first tree
    pub removed: Vec<DiffEntry>,
    /// Entries present only in the second tree
    pub added: Vec<DiffEntry>,
}

impl TreeDiff {
    /// Whether the two trees were identical
    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.removed.is_empty() && self.added.is_empty()
    }
}

/// A scanned entry: kind plus content hash for regular files
#[derive(Debug, Clone)]
struct ScannedEntry {
    kind: EntryKind,
    content_hash: Option<String>,
}

impl ScannedEntry {
    fn differs_from(&self, other: &ScannedEntry) -> bool {
        self.kind != other.kind || self.content_hash != other.content_hash
    }
}

/// Compare two directory trees
///
/// Both roots must be readable directories; any walk or read failure
/// aborts the diff. Cancellation is checked between entries.
pub fn diff_dirs(a: &Path, b: &Path, cancel: &CancellationToken) -> Result<TreeDiff> {
    debug!("diffing trees {:?} and {:?}", a, b);
    let old = scan_tree(a, cancel)?;
    let new = scan_tree(b, cancel)?;

    let mut diff = TreeDiff::default();

    for (path, old_entry) in &old {
        match new.get(path) {
            Some(new_entry) => {
                if old_entry.differs_from(new_entry) {
                    diff.modified.push(DiffEntry {
                        path: path.clone(),
                        kind: new_entry.kind.clone(),
                    });
                }
            }
            None => diff.removed.push(DiffEntry {
                path: path.clone(),
                kind: old_entry.kind.clone(),
            }),
        }
    }

    for (path, new_entry) in &new {
        if !old.contains_key(path) {
            diff.added.push(DiffEntry {
                path: path.clone(),
                kind: new_entry.kind.clone(),
            });
        }
    }

    trace!(
        "tree diff: {} modified, {} removed, {} added",
        diff.modified.len(),
        diff.removed.len(),
        diff.added.len()
    );
    Ok(diff)
}

/// Render a tree diff as a human-readable report
///
/// One line per entry: `M <path>` for modified, `D <path>` for removed,
/// `A <path>` for added, in that order.
pub fn render_diff<W: Write>(out: &mut W, diff: &TreeDiff) -> io::Result<()> {
    for entry in &diff.modified {
        writeln!(out, "M    {}", entry.path.display())?;
    }
    for entry in &diff.removed {
        writeln!(out, "D    {}", entry.path.display())?;
    }
    for entry in &diff.added {
        writeln!(out, "A    {}", entry.path.display())?;
    }
    Ok(())
}

/// Index every entry under a root by its relative path
///
/// Uses a `BTreeMap` so the resulting diff lists come out ordered by path.
fn scan_tree(root: &Path, cancel: &CancellationToken) -> Result<BTreeMap<PathBuf, ScannedEntry>> {
    if !root.is_dir() {
        return Err(RevDiffError::diff(format!(
            "not a directory: {}",
            root.display()
        )));
    }

    let mut entries = BTreeMap::new();

    for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
        cancel.check()?;
        let entry = entry.map_err(|e| RevDiffError::diff(e.to_string()))?;
        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| RevDiffError::diff(e.to_string()))?
            .to_path_buf();

        // Read failures during the scan are diff failures, same as walk
        // failures, so callers can classify them uniformly.
        let file_type = entry.file_type();
        let scanned = if file_type.is_symlink() {
            let target = fs::read_link(entry.path())
                .map_err(|e| RevDiffError::diff(format!("{}: {e}", entry.path().display())))?;
            ScannedEntry {
                kind: EntryKind::Symlink { target },
                content_hash: None,
            }
        } else if file_type.is_dir() {
            ScannedEntry {
                kind: EntryKind::Dir,
                content_hash: None,
            }
        } else {
            let hash = hash_file(entry.path())
                .map_err(|e| RevDiffError::diff(format!("{}: {e}", entry.path().display())))?;
            ScannedEntry {
                kind: EntryKind::File {
                    executable: is_executable(entry.path()),
                },
                content_hash: Some(hash),
            }
        };

        entries.insert(rel, scanned);
    }

    Ok(entries)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::symlink_metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    false
}
