//! # revdiff - Revision comparison for content-addressable snapshots
//!
//! A comparison and shared-storage analysis engine for content-addressable
//! versioned filesystems. Given two revision references — each either a
//! live filesystem path or a named commit in an object store — revdiff
//! computes a structural diff of the two resolved trees and/or aggregate
//! statistics about how much object storage the two commits share.
//!
//! ## Overview
//!
//! - **Revision resolution**: path-like references (`/...`, `./...`) are
//!   compared in place; commit-like references are resolved through the
//!   store, including trailing `^` parent selection
//! - **Filesystem diff**: modified/removed/added entry lists between two
//!   resolved trees, rendered as an `M`/`D`/`A` report
//! - **Shared-storage stats**: reachable-set intersection between two
//!   commits and the aggregate on-disk size of the common objects
//! - **Content-addressable store**: a simple sharded repository
//!   ([`Repo`]) with named refs, deduplicated file/tree/commit objects,
//!   and temporary checkouts
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use revdiff::{CancellationToken, CompareOptions, RefPair, Repo};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = Repo::open("./.revdiff")?;
//!
//! // Snapshot two states of a directory
//! let _first = repo.commit_directory(Path::new("./project"), "main", None)?;
//! // ... edit files ...
//! let _second = repo.commit_directory(Path::new("./project"), "main", None)?;
//!
//! // Compare the latest commit against its parent, printing both the
//! // tree diff and shared-storage statistics
//! let refs = RefPair::from_refs(&["main".to_string()])?;
//! let options = CompareOptions { stats: true, fs_diff: true };
//! let cancel = CancellationToken::new();
//! revdiff::run_compare(&repo, &refs, options, &cancel, &mut std::io::stdout())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Design notes
//!
//! The engine itself is independent of any concrete store: it orchestrates
//! against the narrow [`ObjectStore`] and [`SizeLookup`] traits, so both
//! the set algebra and the orchestrator are testable with fabricated
//! in-memory stores. Comparisons hold no shared mutable state; reachable
//! sets and diff results are built per comparison and discarded. A
//! [`CancellationToken`] checked between store steps aborts an in-progress
//! comparison without partial output.

// Public API modules
pub mod compare;
pub mod error;
pub mod repo;
pub mod resolve;
pub mod setops;
pub mod store;
pub mod treediff;
pub mod types;

// Internal modules (not part of public API)
mod util;

// Re-export main types for convenience
pub use compare::{collect_stats, render_stats, run_compare, RefPair};
pub use error::{Result, RevDiffError};
pub use repo::Repo;
pub use resolve::{is_path_reference, resolve_target, ResolvedTarget};
pub use setops::{intersect, total_size};
pub use store::{ObjectStore, SizeLookup};
pub use treediff::{diff_dirs, render_diff, DiffEntry, EntryKind, TreeDiff};
pub use types::{
    CancellationToken, Commit, CompareOptions, CompareStats, ObjectId, ObjectKind, ReachableSet,
    Tree, TreeEntry,
};
