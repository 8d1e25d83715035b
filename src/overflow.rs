//! Max-cluster overflow strategies (`spec.md` §4.6).

use crate::cluster::{ClusterId, ClusterStore};
use crate::config::MaxClustStrategy;
use crate::dcc::DistanceCache;
use crate::error::ClusterError;
use crate::transition::TransitionMatrix;

/// Outcome of applying an overflow strategy when a new cluster is needed
/// but the store is already at `N_max`.
pub enum OverflowOutcome {
    /// `stop`: the run should terminate after this frame; it is left
    /// unassigned.
    Stop,
    /// `discard`: a slot is now free; the caller may proceed to create
    /// the new cluster in it.
    Discarded,
    /// `merge`: no slot is freed for a *new* cluster — the caller must
    /// instead route the current frame to the surviving cluster id.
    Merged(ClusterId),
}

/// Apply `strategy` to `store`, freeing capacity for a new cluster.
/// `discard_fraction` governs how many clusters `discard` retires in one
/// call (at least one). Returns `Err` only for a strategy misconfiguration
/// that would otherwise free nothing (e.g. `discard_fraction` of zero
/// clusters, or fewer than two live clusters to `merge`).
pub fn apply(
    strategy: MaxClustStrategy,
    store: &mut ClusterStore,
    dcc: &mut DistanceCache,
    transitions: &mut TransitionMatrix,
    discard_fraction: f64,
) -> Result<OverflowOutcome, ClusterError> {
    match strategy {
        MaxClustStrategy::Stop => Ok(OverflowOutcome::Stop),
        MaxClustStrategy::Discard => {
            discard(store, discard_fraction)?;
            Ok(OverflowOutcome::Discarded)
        }
        MaxClustStrategy::Merge => {
            let survivor = merge_closest_pair(store, dcc, transitions)?;
            Ok(OverflowOutcome::Merged(survivor))
        }
    }
}

/// Retire the lowest-`discard_fraction` fraction of live clusters by
/// ascending prior, ties broken by ascending id (oldest first). This is
/// the implementer's resolution of `spec.md` §9's open discard-ordering
/// question, pinned and exercised by scenario 6.
fn discard(store: &mut ClusterStore, discard_fraction: f64) -> Result<(), ClusterError> {
    let mut ranked: Vec<(f64, ClusterId)> = store
        .iter_active()
        .map(|c| (c.prior, c.id))
        .collect();
    ranked.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap().then(a.1.cmp(&b.1)));

    let n = ranked.len();
    let count = ((n as f64) * discard_fraction).ceil() as usize;
    let count = count.max(1).min(n);

    if count == 0 {
        return Err(ClusterError::Overflow {
            max: store.len(),
            strategy: MaxClustStrategy::Discard,
        });
    }

    for &(_, id) in ranked.iter().take(count) {
        store.retire(id);
    }
    Ok(())
}

/// Merge the closest live pair `(i, j)` found in the distance cache:
/// `j`'s prior, visitors, and transition rows/columns fold into `i`;
/// `i`'s anchor is kept; `j` is retired. Returns `i`, the surviving id.
fn merge_closest_pair(
    store: &mut ClusterStore,
    dcc: &mut DistanceCache,
    transitions: &mut TransitionMatrix,
) -> Result<ClusterId, ClusterError> {
    let ids: Vec<ClusterId> = store.iter_active_ids().collect();
    if ids.len() < 2 {
        return Err(ClusterError::Overflow {
            max: store.len(),
            strategy: MaxClustStrategy::Merge,
        });
    }

    let mut best: Option<(f64, ClusterId, ClusterId)> = None;
    for a in 0..ids.len() {
        for b in (a + 1)..ids.len() {
            let (i, j) = (ids[a], ids[b]);
            let anchor_i = &store.get(i).anchor;
            let anchor_j = &store.get(j).anchor;
            let d = dcc.get(i, j, anchor_i, anchor_j);
            if best.map(|(bd, _, _)| d < bd).unwrap_or(true) {
                best = Some((d, i, j));
            }
        }
    }
    let (_, into, from) = best.expect("checked len >= 2 above");

    let from_prior = store.get(from).prior;
    let from_visitors = store.get(from).visitors.clone();

    let target = store.get_mut(into);
    target.prior += from_prior;
    for v in from_visitors.iter() {
        target.visitors.push(v);
    }
    store.retire(from);
    transitions.merge_into(into, from);
    Ok(into)
}
