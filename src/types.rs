//! Core data types used throughout the revdiff library
//!
//! This module contains the fundamental data structures shared across
//! components:
//!
//! - **Object identity**: [`ObjectId`], [`ObjectKind`] - identifying one
//!   stored object by content checksum and kind
//! - **Set algebra**: [`ReachableSet`] - everything reachable from a commit
//! - **Stored objects**: [`Commit`], [`Tree`], [`TreeEntry`] - the
//!   serialized forms kept in the object store
//! - **Comparison**: [`CompareOptions`], [`CompareStats`] - mode selection
//!   and the transient statistics result
//! - **Cancellation**: [`CancellationToken`] - cooperative, coarse-grained
//!   cancellation checked between long-running store steps

use crate::error::{Result, RevDiffError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Kind of a stored object
///
/// Every object in the store is one of these kinds; the kind participates
/// in object identity, so a file and a tree with the same checksum are
/// distinct objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Regular file content
    File,
    /// Directory listing
    Tree,
    /// Commit metadata
    Commit,
}

impl ObjectKind {
    /// File extension used for this kind in the objects directory
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::File => "file",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one stored object: (content checksum, object kind)
///
/// Equality and hashing are structural over both fields, so identities
/// originating from different traversal calls compare correctly when
/// collected into sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId {
    /// SHA-256 content checksum (64 hexadecimal characters)
    pub checksum: String,
    /// Kind of the object
    pub kind: ObjectKind,
}

impl ObjectId {
    /// Create an object identity from a checksum and kind
    pub fn new(checksum: impl Into<String>, kind: ObjectKind) -> Self {
        ObjectId {
            checksum: checksum.into(),
            kind,
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.checksum, self.kind)
    }
}

/// All objects transitively reachable from one commit
///
/// Set semantics guarantee no duplicate identities even when an object is
/// reachable via multiple paths within a single commit.
pub type ReachableSet = HashSet<ObjectId>;

/// One entry in a stored directory tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeEntry {
    /// A regular file, referenced by content checksum
    File {
        /// Checksum of the file object
        checksum: String,
        /// Whether the executable bit was set
        executable: bool,
    },
    /// A subdirectory, referenced by tree checksum
    Dir {
        /// Checksum of the tree object
        checksum: String,
    },
}

/// A stored directory listing
///
/// Entries are keyed by name in a `BTreeMap` so the serialized form is
/// deterministic and identical directory contents hash to the same tree
/// checksum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    /// Entries keyed by file or directory name
    pub entries: BTreeMap<String, TreeEntry>,
}

/// A stored commit: an immutable, content-addressed snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    /// Checksum of the root tree object
    pub root: String,
    /// Checksum of the parent commit, if any
    pub parent: Option<String>,
    /// Optional human-readable description
    pub message: Option<String>,
    /// Creation timestamp
    pub timestamp: DateTime<Utc>,
}

/// Which analysis passes a comparison runs
///
/// This replaces process-wide mutable flag state with an explicit value
/// threaded through function parameters. The two modes are independent;
/// when neither is requested, the filesystem diff is implied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompareOptions {
    /// Print shared-storage statistics
    pub stats: bool,
    /// Print the filesystem diff
    pub fs_diff: bool,
}

impl CompareOptions {
    /// Apply the default-mode rule: neither pass requested implies fs-diff
    pub fn normalized(self) -> Self {
        if !self.stats && !self.fs_diff {
            CompareOptions {
                stats: false,
                fs_diff: true,
            }
        } else {
            self
        }
    }
}

/// Shared-storage statistics for one comparison
///
/// Transient result of a stats pass; printed once and discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareStats {
    /// Number of objects reachable from side A
    pub objects_a: usize,
    /// Number of objects reachable from side B
    pub objects_b: usize,
    /// Number of objects reachable from both sides
    pub common_objects: usize,
    /// Aggregate on-disk size of the common objects, in bytes
    pub common_size: u64,
}

/// Cooperative cancellation signal for an in-progress comparison
///
/// The store checks the token between long-running traversal and checkout
/// steps; a cancelled token aborts the comparison with
/// [`RevDiffError::Cancelled`] and no partial output is emitted.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a fresh, non-cancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been signalled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Return `Err(Cancelled)` if cancellation has been signalled
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(RevDiffError::Cancelled)
        } else {
            Ok(())
        }
    }
}
