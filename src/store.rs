//! Capability traits for the object store consumed by the comparison engine
//!
//! The engine never reads or writes object data itself; it orchestrates
//! against these two traits. Keeping them narrow means the orchestrator,
//! set algebra, and storage aggregator are all testable with fabricated
//! in-memory stores, without a real repository on disk.

use crate::error::Result;
use crate::resolve::ResolvedTarget;
use crate::types::{CancellationToken, ObjectId, ReachableSet};

/// Read-only view of a content-addressable commit store
pub trait ObjectStore {
    /// Resolve a symbolic revision (ref name, checksum, trailing `^`
    /// parent selection) to a concrete commit checksum
    fn resolve_rev(&self, reference: &str) -> Result<String>;

    /// Resolve a revision and materialize its root directory, returning a
    /// handle that owns any temporary checkout
    fn read_commit(&self, reference: &str, cancel: &CancellationToken) -> Result<ResolvedTarget>;

    /// Enumerate every object transitively reachable from a commit
    ///
    /// The returned set is deduplicated by object identity; an object
    /// reachable via multiple paths appears exactly once.
    fn traverse_commit(
        &self,
        commit_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ReachableSet>;
}

/// Per-object storage size queries
///
/// Split from [`ObjectStore`] so the storage aggregator depends on exactly
/// the capability it needs.
pub trait SizeLookup {
    /// On-disk storage size of one object, in bytes
    fn query_object_size(&self, id: &ObjectId) -> Result<u64>;
}
