//! Revision resolution: turning a reference string into a comparison target
//!
//! A revision reference is an opaque, caller-supplied string in one of two
//! syntactic classes:
//!
//! - *path-like* (begins with `/` or `./`): the literal filesystem path is
//!   the target and the store is never consulted, even if a commit with
//!   the same name exists
//! - *commit-like* (anything else): delegated to the store, which resolves
//!   symbolic names including trailing `^` parent selection
//!
//! The resolved target owns any temporary checkout directory and removes
//! it on drop, so resources are released whether the comparison succeeds,
//! fails, or is cancelled.

use crate::error::Result;
use crate::store::ObjectStore;
use crate::types::CancellationToken;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A concrete filesystem root ready for tree comparison
///
/// Either a literal path supplied by the caller, or the root of a commit
/// checked out into a temporary directory. The temporary directory, when
/// present, is deleted when the target is dropped.
#[derive(Debug)]
pub struct ResolvedTarget {
    path: PathBuf,
    checkout: Option<TempDir>,
}

impl ResolvedTarget {
    /// Target backed by a literal filesystem path
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        ResolvedTarget {
            path: path.into(),
            checkout: None,
        }
    }

    /// Target backed by a temporary checkout, owned until drop
    pub fn from_checkout(checkout: TempDir) -> Self {
        ResolvedTarget {
            path: checkout.path().to_path_buf(),
            checkout: Some(checkout),
        }
    }

    /// Root directory of this target
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this target is a temporary checkout of a commit
    pub fn is_checkout(&self) -> bool {
        self.checkout.is_some()
    }
}

/// Check whether a reference is path-like
///
/// Path-like syntax takes precedence over commit names; `./main` is always
/// a directory, never the ref `main`.
pub fn is_path_reference(reference: &str) -> bool {
    reference.starts_with('/') || reference.starts_with("./")
}

/// Resolve a revision reference into a concrete comparison target
///
/// Path-like references never touch the store and need not refer to an
/// existing commit. Commit-like references are read through the store and
/// fail with a resolution error carrying the original reference string.
pub fn resolve_target<S: ObjectStore + ?Sized>(
    store: &S,
    reference: &str,
    cancel: &CancellationToken,
) -> Result<ResolvedTarget> {
    if is_path_reference(reference) {
        Ok(ResolvedTarget::from_path(reference))
    } else {
        store.read_commit(reference, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RevDiffError;
    use crate::types::ReachableSet;

    /// A store that refuses every operation; used to prove path-like
    /// references never reach it.
    struct UnreachableStore;

    impl ObjectStore for UnreachableStore {
        fn resolve_rev(&self, reference: &str) -> Result<String> {
            Err(RevDiffError::resolution(reference, "store must not be consulted"))
        }

        fn read_commit(
            &self,
            reference: &str,
            _cancel: &CancellationToken,
        ) -> Result<ResolvedTarget> {
            Err(RevDiffError::resolution(reference, "no such commit"))
        }

        fn traverse_commit(
            &self,
            _commit_id: &str,
            _cancel: &CancellationToken,
        ) -> Result<ReachableSet> {
            unreachable!()
        }
    }

    #[test]
    fn test_path_like_classification() {
        assert!(is_path_reference("/tmp/tree"));
        assert!(is_path_reference("./main"));
        assert!(!is_path_reference("main"));
        assert!(!is_path_reference("main^"));
        assert!(!is_path_reference(".hidden"));
    }

    #[test]
    fn test_path_like_skips_store() {
        let cancel = CancellationToken::new();
        let target = resolve_target(&UnreachableStore, "./main", &cancel).unwrap();
        assert_eq!(target.path(), Path::new("./main"));
        assert!(!target.is_checkout());

        let target = resolve_target(&UnreachableStore, "/var/data", &cancel).unwrap();
        assert_eq!(target.path(), Path::new("/var/data"));
    }

    #[test]
    fn test_commit_like_error_carries_reference() {
        let cancel = CancellationToken::new();
        let err = resolve_target(&UnreachableStore, "no-such-ref", &cancel).unwrap_err();
        match err {
            RevDiffError::Resolution { reference, .. } => {
                assert_eq!(reference, "no-such-ref");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_checkout_target_cleans_up() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();
        let target = ResolvedTarget::from_checkout(dir);
        assert!(target.is_checkout());
        assert!(path.exists());
        drop(target);
        assert!(!path.exists());
    }
}
