//! Filesystem-backed content-addressable object store
//!
//! A repository holds three kinds of immutable objects — file content,
//! directory trees, and commits — addressed by SHA-256 checksum and kind.
//! Identical content is stored once regardless of how many commits
//! reference it, which is what makes shared-storage statistics meaningful.
//!
//! ## Layout
//!
//! ```text
//! repo_root/
//! ├── config.json            # Repository metadata
//! ├── objects/               # Content-addressable objects (sharded)
//! │   └── <prefix>/          # First 2 chars of checksum
//! │       └── <suffix>.<kind>
//! └── refs/                  # Named refs
//!     └── <name>             # File containing a commit checksum
//! ```
//!
//! Tree objects serialize their entries in name order, so identical
//! directory contents always produce identical tree checksums. Commit
//! identity covers the root tree, parent link, message, and timestamp, so
//! two commits of the same content remain distinct commits that share all
//! of their file and tree objects.
//!
//! Revision references resolve through `refs/` first and fall back to a
//! full commit checksum; trailing `^` suffixes select first parents.

use crate::error::{Result, RevDiffError};
use crate::resolve::ResolvedTarget;
use crate::store::{ObjectStore, SizeLookup};
use crate::types::{CancellationToken, Commit, ObjectId, ObjectKind, ReachableSet, Tree, TreeEntry};
use crate::util::{hash_bytes, short_checksum};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

const CONFIG_FILE: &str = "config.json";
const REPO_VERSION: u32 = 1;

/// Repository metadata stored in `config.json`
#[derive(Debug, Serialize, Deserialize)]
struct RepoConfig {
    version: u32,
}

/// A content-addressable commit repository on the local filesystem
#[derive(Debug)]
pub struct Repo {
    root: PathBuf,
}

impl Repo {
    /// Initialize a new repository
    ///
    /// Fails with [`RevDiffError::RepoAlreadyExists`] if a repository is
    /// already present at the path.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if root.join(CONFIG_FILE).exists() {
            return Err(RevDiffError::RepoAlreadyExists(root));
        }

        fs::create_dir_all(root.join("objects"))?;
        fs::create_dir_all(root.join("refs"))?;

        let config = RepoConfig {
            version: REPO_VERSION,
        };
        fs::write(
            root.join(CONFIG_FILE),
            serde_json::to_string_pretty(&config)?,
        )?;

        debug!("initialized repository at {:?}", root);
        Ok(Repo { root })
    }

    /// Open an existing repository
    ///
    /// Fails with [`RevDiffError::RepoNotInitialized`] if the path does
    /// not contain a repository.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config_path = root.join(CONFIG_FILE);
        if !config_path.exists() {
            return Err(RevDiffError::RepoNotInitialized(root));
        }

        let config: RepoConfig = serde_json::from_str(&fs::read_to_string(config_path)?)?;
        if config.version != REPO_VERSION {
            return Err(RevDiffError::Corrupt(format!(
                "unsupported repository version {}",
                config.version
            )));
        }

        Ok(Repo { root })
    }

    /// Root directory of the repository
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Snapshot a live directory into the store and advance a ref
    ///
    /// Builds tree objects bottom-up, storing each file once by content
    /// checksum. The new commit's parent is the ref's previous target, if
    /// the ref existed. Returns the new commit checksum.
    pub fn commit_directory(
        &self,
        path: &Path,
        ref_name: &str,
        message: Option<String>,
    ) -> Result<String> {
        validate_ref_name(ref_name)?;
        if !path.is_dir() {
            return Err(RevDiffError::Io(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                format!("not a directory: {}", path.display()),
            )));
        }

        let parent = self.read_ref(ref_name)?;
        let root_checksum = self.store_tree(path)?;

        let commit = Commit {
            root: root_checksum,
            parent,
            message,
            timestamp: Utc::now(),
        };
        let commit_id = self.write_object(ObjectKind::Commit, &serde_json::to_vec(&commit)?)?;
        self.write_ref(ref_name, &commit_id)?;

        debug!(
            "committed {:?} as {} -> {}",
            path,
            ref_name,
            short_checksum(&commit_id)
        );
        Ok(commit_id)
    }

    /// List all refs as (name, commit checksum) pairs, sorted by name
    pub fn refs(&self) -> Result<Vec<(String, String)>> {
        let mut refs = Vec::new();
        for entry in fs::read_dir(self.root.join("refs"))? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            let target = fs::read_to_string(entry.path())?.trim().to_string();
            refs.push((name, target));
        }
        refs.sort();
        Ok(refs)
    }

    /// Load and deserialize a commit object
    pub fn load_commit(&self, checksum: &str) -> Result<Commit> {
        let data = self.read_object(&ObjectId::new(checksum, ObjectKind::Commit))?;
        serde_json::from_slice(&data)
            .map_err(|e| RevDiffError::Corrupt(format!("commit {checksum}: {e}")))
    }

    /// Load and deserialize a tree object
    pub fn load_tree(&self, checksum: &str) -> Result<Tree> {
        let data = self.read_object(&ObjectId::new(checksum, ObjectKind::Tree))?;
        serde_json::from_slice(&data)
            .map_err(|e| RevDiffError::Corrupt(format!("tree {checksum}: {e}")))
    }

    /// Whether an object exists in the store
    pub fn has_object(&self, id: &ObjectId) -> bool {
        is_checksum(&id.checksum) && self.object_path(id).exists()
    }

    /// Read the target of a ref, if the ref exists
    ///
    /// Names that are not valid ref names (path separators, leading dots)
    /// never match, so a reference like `./main` cannot alias the ref
    /// `main` through path normalization. A ref file whose content is not
    /// a commit checksum is reported as corrupt rather than handed on.
    fn read_ref(&self, name: &str) -> Result<Option<String>> {
        if !is_valid_ref_name(name) {
            return Ok(None);
        }
        let path = self.root.join("refs").join(name);
        if !path.exists() {
            return Ok(None);
        }
        let target = fs::read_to_string(path)?.trim().to_string();
        if !is_checksum(&target) {
            return Err(RevDiffError::Corrupt(format!(
                "ref '{name}' does not contain a commit checksum"
            )));
        }
        Ok(Some(target))
    }

    fn write_ref(&self, name: &str, commit_id: &str) -> Result<()> {
        fs::write(self.root.join("refs").join(name), commit_id)?;
        Ok(())
    }

    /// Store a directory as a tree object, recursing into subdirectories
    fn store_tree(&self, dir: &Path) -> Result<String> {
        let mut tree = Tree::default();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            let file_type = entry.file_type()?;

            if file_type.is_symlink() {
                // Symlinks are not stored; checkouts stay plain trees.
                warn!("skipping symlink {:?}", entry.path());
                continue;
            }

            if file_type.is_dir() {
                let checksum = self.store_tree(&entry.path())?;
                tree.entries.insert(name, TreeEntry::Dir { checksum });
            } else {
                let content = fs::read(entry.path())?;
                let checksum = self.write_object(ObjectKind::File, &content)?;
                tree.entries.insert(
                    name,
                    TreeEntry::File {
                        checksum,
                        executable: is_executable(&entry.metadata()?),
                    },
                );
            }
        }

        self.write_object(ObjectKind::Tree, &serde_json::to_vec(&tree)?)
    }

    /// Store raw object bytes, deduplicating by checksum
    fn write_object(&self, kind: ObjectKind, data: &[u8]) -> Result<String> {
        let checksum = hash_bytes(data);
        let id = ObjectId::new(&checksum, kind);
        let path = self.object_path(&id);

        if !path.exists() {
            let parent = path.parent().ok_or_else(|| {
                RevDiffError::Corrupt(format!("object path {path:?} has no parent"))
            })?;
            fs::create_dir_all(parent)?;
            fs::write(&path, data)?;
            trace!(
                "stored {} object {} ({} bytes)",
                kind,
                short_checksum(&checksum),
                data.len()
            );
        }

        Ok(checksum)
    }

    fn read_object(&self, id: &ObjectId) -> Result<Vec<u8>> {
        if !is_checksum(&id.checksum) {
            return Err(RevDiffError::ObjectNotFound(id.to_string()));
        }
        let path = self.object_path(id);
        if !path.exists() {
            return Err(RevDiffError::ObjectNotFound(id.to_string()));
        }
        Ok(fs::read(path)?)
    }

    /// Path of an object file (sharded by checksum prefix)
    ///
    /// Callers check `is_checksum` first; the split below requires it.
    fn object_path(&self, id: &ObjectId) -> PathBuf {
        let (prefix, suffix) = id.checksum.split_at(2);
        self.root
            .join("objects")
            .join(prefix)
            .join(format!("{}.{}", suffix, id.kind.as_str()))
    }

    /// Resolve a base reference (no `^` suffix) to a commit checksum
    ///
    /// A corrupt or dangling ref is a resolution failure carrying the
    /// original reference, never a panic deeper in the store.
    fn resolve_base(&self, reference: &str, base: &str) -> Result<String> {
        match self.read_ref(base) {
            Ok(Some(target)) => {
                if self.has_object(&ObjectId::new(&target, ObjectKind::Commit)) {
                    return Ok(target);
                }
                return Err(RevDiffError::resolution(
                    reference,
                    format!("ref '{base}' points to a missing commit"),
                ));
            }
            Ok(None) => {}
            Err(e) => return Err(RevDiffError::resolution(reference, e.to_string())),
        }
        if is_checksum(base) && self.has_object(&ObjectId::new(base, ObjectKind::Commit)) {
            return Ok(base.to_string());
        }
        Err(RevDiffError::resolution(reference, "no such ref or commit"))
    }

    /// Materialize a stored tree under a destination directory
    fn checkout_tree(
        &self,
        tree_checksum: &str,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<()> {
        cancel.check()?;
        let tree = self.load_tree(tree_checksum)?;

        for (name, entry) in &tree.entries {
            let target = dest.join(name);
            match entry {
                TreeEntry::Dir { checksum } => {
                    fs::create_dir(&target)?;
                    self.checkout_tree(checksum, &target, cancel)?;
                }
                TreeEntry::File {
                    checksum,
                    executable,
                } => {
                    cancel.check()?;
                    let content = self.read_object(&ObjectId::new(checksum, ObjectKind::File))?;
                    fs::write(&target, content)?;
                    if *executable {
                        set_executable(&target)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Collect a tree and everything below it into a reachable set
    fn traverse_tree(
        &self,
        tree_checksum: &str,
        reachable: &mut ReachableSet,
        cancel: &CancellationToken,
    ) -> Result<()> {
        cancel.check()?;
        if !reachable.insert(ObjectId::new(tree_checksum, ObjectKind::Tree)) {
            // Already visited via another path; the whole subtree is known.
            return Ok(());
        }

        let tree = self.load_tree(tree_checksum)?;
        for entry in tree.entries.values() {
            match entry {
                TreeEntry::File { checksum, .. } => {
                    reachable.insert(ObjectId::new(checksum, ObjectKind::File));
                }
                TreeEntry::Dir { checksum } => {
                    self.traverse_tree(checksum, reachable, cancel)?;
                }
            }
        }
        Ok(())
    }
}

impl ObjectStore for Repo {
    fn resolve_rev(&self, reference: &str) -> Result<String> {
        let base = reference.trim_end_matches('^');
        let parents = reference.len() - base.len();
        if base.is_empty() {
            return Err(RevDiffError::resolution(reference, "empty revision"));
        }

        let mut commit_id = self.resolve_base(reference, base)?;
        for _ in 0..parents {
            let commit = self.load_commit(&commit_id).map_err(|e| {
                RevDiffError::resolution(reference, format!("cannot read commit: {e}"))
            })?;
            commit_id = commit.parent.ok_or_else(|| {
                RevDiffError::resolution(reference, format!("commit {commit_id} has no parent"))
            })?;
            if !is_checksum(&commit_id) {
                return Err(RevDiffError::resolution(reference, "corrupt parent link"));
            }
        }

        trace!("resolved '{}' -> {}", reference, short_checksum(&commit_id));
        Ok(commit_id)
    }

    fn read_commit(&self, reference: &str, cancel: &CancellationToken) -> Result<ResolvedTarget> {
        let commit_id = self.resolve_rev(reference)?;
        let commit = self.load_commit(&commit_id)?;

        let checkout = tempfile::tempdir()?;
        self.checkout_tree(&commit.root, checkout.path(), cancel)?;

        debug!(
            "checked out {} to {:?}",
            short_checksum(&commit_id),
            checkout.path()
        );
        Ok(ResolvedTarget::from_checkout(checkout))
    }

    fn traverse_commit(&self, commit_id: &str, cancel: &CancellationToken) -> Result<ReachableSet> {
        cancel.check()?;
        let commit = self.load_commit(commit_id).map_err(|e| match e {
            RevDiffError::Cancelled => e,
            other => RevDiffError::traversal(other.to_string()),
        })?;

        let mut reachable = ReachableSet::new();
        reachable.insert(ObjectId::new(commit_id, ObjectKind::Commit));
        self.traverse_tree(&commit.root, &mut reachable, cancel)
            .map_err(|e| match e {
                RevDiffError::Cancelled => e,
                other => RevDiffError::traversal(other.to_string()),
            })?;

        trace!(
            "traversed commit {}: {} reachable objects",
            short_checksum(commit_id),
            reachable.len()
        );
        Ok(reachable)
    }
}

impl SizeLookup for Repo {
    fn query_object_size(&self, id: &ObjectId) -> Result<u64> {
        if !is_checksum(&id.checksum) {
            return Err(RevDiffError::storage_query(&id.checksum, "malformed checksum"));
        }
        let path = self.object_path(id);
        let metadata = fs::metadata(&path)
            .map_err(|e| RevDiffError::storage_query(&id.checksum, e.to_string()))?;
        Ok(metadata.len())
    }
}

/// Whether a string is a full SHA-256 checksum
fn is_checksum(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Ref names must be usable as single path components under `refs/`
fn is_valid_ref_name(name: &str) -> bool {
    !(name.is_empty()
        || name.ends_with('^')
        || name.starts_with('.')
        || name.contains("..")
        || name.contains(std::path::is_separator))
}

fn validate_ref_name(name: &str) -> Result<()> {
    if is_valid_ref_name(name) {
        Ok(())
    } else {
        Err(RevDiffError::Usage(format!("invalid ref name '{name}'")))
    }
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    false
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o755);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}
