//! Cluster store (`spec.md` §2 item 2, §3).
//!
//! A grow-only ordered sequence of clusters. `ClusterId` equals insertion
//! index and is stable for the cluster's lifetime, even across discard —
//! discarded slots are tombstoned rather than compacted, so ids already
//! handed out never point at a different cluster.

/// Stable handle into the cluster store; equals insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterId(pub usize);

use crate::frame::Frame;
use crate::visitor::VisitorList;

#[derive(Debug, Clone)]
pub struct Cluster {
    pub id: ClusterId,
    pub anchor: Frame,
    pub prior: f64,
    pub visitors: VisitorList,
    /// Tombstoned clusters are skipped by every scoring/pruning pass but
    /// keep their slot and id, per §4.6 discard semantics.
    pub retired: bool,
}

impl Cluster {
    fn new(id: ClusterId, anchor: Frame, prior: f64) -> Self {
        Self {
            id,
            anchor,
            prior,
            visitors: VisitorList::new(),
            retired: false,
        }
    }
}

/// Grow-only sequence of clusters, indexed by `ClusterId`.
#[derive(Debug, Default)]
pub struct ClusterStore {
    clusters: Vec<Cluster>,
}

impl ClusterStore {
    pub fn new() -> Self {
        Self { clusters: Vec::new() }
    }

    pub fn with_capacity(n_max: usize) -> Self {
        Self {
            clusters: Vec::with_capacity(n_max),
        }
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Number of non-retired clusters, i.e. the live candidate set size.
    pub fn active_count(&self) -> usize {
        self.clusters.iter().filter(|c| !c.retired).count()
    }

    /// Insert a new cluster with `anchor` and `prior = 1.0`. The caller is
    /// responsible for populating the distance cache's row for the
    /// returned id, per §4.3's "inserting cluster k fills c(k,·) in
    /// advance" rule.
    pub fn insert(&mut self, anchor: Frame) -> ClusterId {
        let id = ClusterId(self.clusters.len());
        self.clusters.push(Cluster::new(id, anchor, 1.0));
        id
    }

    pub fn get(&self, id: ClusterId) -> &Cluster {
        &self.clusters[id.0]
    }

    pub fn get_mut(&mut self, id: ClusterId) -> &mut Cluster {
        &mut self.clusters[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter()
    }

    /// Live (non-retired) clusters, in id order.
    pub fn iter_active(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter().filter(|c| !c.retired)
    }

    pub fn iter_active_ids(&self) -> impl Iterator<Item = ClusterId> + '_ {
        self.clusters
            .iter()
            .filter(|c| !c.retired)
            .map(|c| c.id)
    }

    /// Anchor frames of every live cluster, for a host-supplied output
    /// writer (`spec.md` §6's anchor-output interface; the writer itself
    /// is out of scope here).
    pub fn anchors(&self) -> impl Iterator<Item = &Frame> {
        self.iter_active().map(|c| &c.anchor)
    }

    /// Divide each live cluster's prior by the sum of live priors
    /// (§4.1 step 2). A no-op on an empty store.
    pub fn normalize_priors(&mut self) {
        let sum: f64 = self.iter_active().map(|c| c.prior).sum();
        if sum <= 0.0 {
            return;
        }
        for c in self.clusters.iter_mut().filter(|c| !c.retired) {
            c.prior /= sum;
        }
    }

    pub fn retire(&mut self, id: ClusterId) {
        self.clusters[id.0].retired = true;
    }
}
