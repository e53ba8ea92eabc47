//! Set algebra and size aggregation over reachable object sets
//!
//! Pure CPU-bound helpers for the stats pass: intersecting two reachable
//! sets and summing per-object storage sizes across an intersection.

use crate::error::Result;
use crate::store::SizeLookup;
use crate::types::ReachableSet;
use tracing::trace;

/// Intersect two reachable sets
///
/// Returns exactly the identities present in both inputs. Iterates the
/// smaller set and probes membership in the larger one; membership is
/// order-independent, so the result does not depend on which side is
/// iterated. Pure function with no failure mode.
pub fn intersect(a: &ReachableSet, b: &ReachableSet) -> ReachableSet {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    let common: ReachableSet = small
        .iter()
        .filter(|id| large.contains(*id))
        .cloned()
        .collect();

    trace!(
        "intersected {} x {} objects -> {} common",
        a.len(),
        b.len(),
        common.len()
    );
    common
}

/// Sum the storage size of every object in a set, exactly once each
///
/// The first failed lookup abandons the whole aggregation; a statistics
/// report must never present an undercount as if it were complete.
pub fn total_size<S: SizeLookup + ?Sized>(ids: &ReachableSet, sizer: &S) -> Result<u64> {
    let mut total = 0u64;
    for id in ids {
        total += sizer.query_object_size(id)?;
    }
    Ok(total)
}
