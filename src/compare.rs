//! Top-level comparison orchestration
//!
//! Selects the pair of revision references to compare, runs the requested
//! analysis passes, and writes the reports. Two independent passes exist:
//!
//! - **fs-diff**: resolve both references (paths or commits) and diff the
//!   resolved trees
//! - **stats**: resolve both references strictly as commits, traverse each
//!   side, and report object counts plus the aggregate size of the shared
//!   objects
//!
//! When both passes are requested they run in order, fs-diff first. A
//! failure inside the tree diff itself does not prevent an independently
//! requested stats pass from running; the diff error still fails the
//! invocation afterwards. Resolution and store failures abort the whole
//! comparison immediately.

use crate::error::{Result, RevDiffError};
use crate::resolve::resolve_target;
use crate::setops::{intersect, total_size};
use crate::store::{ObjectStore, SizeLookup};
use crate::treediff::{diff_dirs, render_diff};
use crate::types::{CancellationToken, CompareOptions, CompareStats};
use crate::util::format_bytes;
use std::io::{self, Write};
use tracing::debug;

/// The pair of revision references one comparison operates on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefPair {
    /// Source side (A) of the comparison
    pub src: String,
    /// Target side (B) of the comparison
    pub target: String,
}

impl RefPair {
    /// Build the comparison pair from positional arguments
    ///
    /// One reference `R` compares `R^` (its first parent) against `R`;
    /// two references compare directly. Zero references is a usage error
    /// and more than two is rejected.
    pub fn from_refs(refs: &[String]) -> Result<RefPair> {
        match refs {
            [] => Err(RevDiffError::Usage(
                "a revision reference is required".to_string(),
            )),
            [rev] => Ok(RefPair {
                src: format!("{rev}^"),
                target: rev.clone(),
            }),
            [src, target] => Ok(RefPair {
                src: src.clone(),
                target: target.clone(),
            }),
            _ => Err(RevDiffError::Usage(
                "at most two revision references are accepted".to_string(),
            )),
        }
    }
}

/// Run one comparison, writing reports to `out`
///
/// Mode selection follows [`CompareOptions::normalized`]: with neither
/// flag set, the filesystem diff runs alone.
pub fn run_compare<S, W>(
    store: &S,
    refs: &RefPair,
    options: CompareOptions,
    cancel: &CancellationToken,
    out: &mut W,
) -> Result<()>
where
    S: ObjectStore + SizeLookup + ?Sized,
    W: Write,
{
    let options = options.normalized();
    debug!(
        "comparing '{}' against '{}' (fs_diff={}, stats={})",
        refs.src, refs.target, options.fs_diff, options.stats
    );

    let mut deferred_diff_error = None;

    if options.fs_diff {
        match run_fs_diff(store, refs, cancel, out) {
            Ok(()) => {}
            // Only tree-diff failures leave a still-requested stats pass
            // runnable; resolution and store errors abort the comparison.
            Err(e @ RevDiffError::Diff(_)) if options.stats => deferred_diff_error = Some(e),
            Err(e) => return Err(e),
        }
    }

    if options.stats {
        let stats = collect_stats(store, refs, cancel)?;
        render_stats(out, &stats)?;
    }

    match deferred_diff_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// The fs-diff pass: resolve both sides, diff, render
fn run_fs_diff<S, W>(
    store: &S,
    refs: &RefPair,
    cancel: &CancellationToken,
    out: &mut W,
) -> Result<()>
where
    S: ObjectStore + SizeLookup + ?Sized,
    W: Write,
{
    let src = resolve_target(store, &refs.src, cancel)?;
    let target = resolve_target(store, &refs.target, cancel)?;

    let diff = diff_dirs(src.path(), target.path(), cancel)?;
    render_diff(out, &diff)?;
    Ok(())
    // src and target drop here, releasing any temporary checkouts.
}

/// The stats pass: traverse both commits and measure shared storage
///
/// Both references resolve strictly as commits; a filesystem path is not
/// a valid stats operand. Reachable sets are built fresh per comparison
/// and discarded afterwards.
pub fn collect_stats<S>(
    store: &S,
    refs: &RefPair,
    cancel: &CancellationToken,
) -> Result<CompareStats>
where
    S: ObjectStore + SizeLookup + ?Sized,
{
    let rev_a = store.resolve_rev(&refs.src)?;
    let rev_b = store.resolve_rev(&refs.target)?;

    let reachable_a = store.traverse_commit(&rev_a, cancel)?;
    let reachable_b = store.traverse_commit(&rev_b, cancel)?;

    let common = intersect(&reachable_a, &reachable_b);
    let common_size = total_size(&common, store)?;

    Ok(CompareStats {
        objects_a: reachable_a.len(),
        objects_b: reachable_b.len(),
        common_objects: common.len(),
        common_size,
    })
}

/// Write the shared-storage statistics report
pub fn render_stats<W: Write>(out: &mut W, stats: &CompareStats) -> io::Result<()> {
    writeln!(out, "[A] Object Count: {}", stats.objects_a)?;
    writeln!(out, "[B] Object Count: {}", stats.objects_b)?;
    writeln!(out, "Common Object Count: {}", stats.common_objects)?;
    writeln!(out, "Common Object Size: {}", format_bytes(stats.common_size))?;
    Ok(())
}
