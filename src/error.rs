//! Error types for the revdiff library
//!
//! This module defines all error types that can occur while resolving
//! revisions, traversing commits, or comparing trees. Errors carry the
//! original reference strings and checksums so that failures can be
//! diagnosed without re-running under a debugger.

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in the revdiff library
pub type Result<T> = std::result::Result<T, RevDiffError>;

/// Main error type for all revdiff operations
#[derive(Debug, Error)]
pub enum RevDiffError {
    /// I/O errors during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed or missing command-line arguments
    #[error("usage error: {0}")]
    Usage(String),

    /// A revision reference could not be turned into a concrete target
    #[error("cannot resolve revision '{reference}': {reason}")]
    Resolution {
        /// The reference string as supplied by the caller
        reference: String,
        /// Why resolution failed
        reason: String,
    },

    /// Commit traversal failed while building a reachable set
    #[error("traversal error: {0}")]
    Traversal(String),

    /// A per-object storage size query failed
    #[error("storage size query failed for object {checksum}: {reason}")]
    StorageQuery {
        /// Checksum of the object whose size could not be read
        checksum: String,
        /// Why the query failed
        reason: String,
    },

    /// The directory-tree diff failed
    #[error("diff error: {0}")]
    Diff(String),

    /// The in-progress comparison was cancelled
    #[error("operation cancelled")]
    Cancelled,

    /// Object not found in content-addressable storage
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// Repository is not initialized at the given path
    #[error("repository not initialized at path: {0:?}")]
    RepoNotInitialized(PathBuf),

    /// Repository already exists at the given path
    #[error("repository already exists at path: {0:?}")]
    RepoAlreadyExists(PathBuf),

    /// Stored object or metadata is malformed
    #[error("corrupt repository: {0}")]
    Corrupt(String),
}

impl RevDiffError {
    /// Create a resolution error for a reference
    pub fn resolution(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        RevDiffError::Resolution {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// Create a traversal error with a custom message
    pub fn traversal(msg: impl Into<String>) -> Self {
        RevDiffError::Traversal(msg.into())
    }

    /// Create a storage query error for an object checksum
    pub fn storage_query(checksum: impl Into<String>, reason: impl Into<String>) -> Self {
        RevDiffError::StorageQuery {
            checksum: checksum.into(),
            reason: reason.into(),
        }
    }

    /// Create a diff error with a custom message
    pub fn diff(msg: impl Into<String>) -> Self {
        RevDiffError::Diff(msg.into())
    }

    /// Check if this error indicates repository corruption
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            RevDiffError::Corrupt(_) | RevDiffError::ObjectNotFound(_)
        )
    }
}
