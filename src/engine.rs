//! The assignment engine (`spec.md` §4.1): the per-frame state machine
//! that ties every other module together.

use crate::cluster::{ClusterId, ClusterStore};
use crate::concurrency::{CancellationToken, WorkerPool};
use crate::config::{EngineConfig, RadiusMode};
use crate::dcc::DistanceCache;
use crate::distance::frame_distance;
use crate::error::ClusterError;
use crate::frame::{Frame, FrameId, FrameSource};
use crate::gprob::{self, fmatch};
use crate::output::ProbeDistanceWriter;
use crate::overflow::{self, OverflowOutcome};
use crate::prediction::predict_candidates;
use crate::pruning::{four_point_bound, five_point_bound, two_point_bound, ReferenceTriple};
use crate::record::{Assignment, FrameRecord, RecordLog};
use crate::stats::RunStats;
use crate::transition::TransitionMatrix;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// Resolve the effective radius from `config`, running the auto-radius
/// scanner against `source` and resetting it afterward when
/// `auto_rlim_factor` is set (`spec.md` §4.7). Callers drive this before
/// constructing a [`ClusteringEngine`].
pub fn resolve_radius(
    config: &EngineConfig,
    source: &mut dyn FrameSource,
) -> Result<f64, ClusterError> {
    match config.radius_mode() {
        Some(RadiusMode::Fixed(r)) => Ok(r),
        Some(RadiusMode::AutoFactor(factor)) => {
            let stats = crate::scanner::scan(source, config.maxnbfr)?
                .ok_or(ClusterError::InsufficientFramesForScan)?;
            let radius = stats.auto_radius(factor);
            tracing::info!(
                target: "scanner",
                median = stats.median,
                factor,
                radius,
                "auto_rlim resolved"
            );
            Ok(radius)
        }
        None => Err(ClusterError::MissingRadius),
    }
}

/// Outcome of processing a single frame (`spec.md` §4.1, §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The frame attached to an existing cluster, or anchored a new one.
    Assigned(ClusterId),
    /// The `stop` overflow policy fired: the frame is left unassigned and
    /// the caller's run loop should stop consuming further frames.
    Stopped,
}

/// Summary returned by [`ClusteringEngine::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_processed: u64,
    pub stopped_by_overflow: bool,
}

pub struct ClusteringEngine {
    config: EngineConfig,
    radius: f64,
    store: ClusterStore,
    dcc: DistanceCache,
    transitions: TransitionMatrix,
    records: RecordLog,
    stats: RunStats,
    prev: Option<ClusterId>,
    pool: WorkerPool,
    cancellation: CancellationToken,
    probe_log: Vec<String>,
    scratch_active: Vec<ClusterId>,
}

impl ClusteringEngine {
    /// Construct a fresh engine. Validates `maxcl` up front against
    /// `spec.md` §4.8: the distance cache is a full `n*n` pairwise matrix,
    /// so capacity is rejected here, before any scratch buffer is
    /// allocated, if `n*n` would overflow `usize` or exceed a practical
    /// allocation limit.
    pub fn new(config: EngineConfig, radius: f64) -> Result<Self, ClusterError> {
        let threads = config.worker_threads();
        let n = config.maxcl.max(1);

        let cells = n.checked_mul(n).ok_or(ClusterError::CapacityExceeded {
            requested: n,
            limit: usize::MAX,
        })?;
        const MAX_CACHE_CELLS: usize = 1 << 34;
        if cells > MAX_CACHE_CELLS {
            return Err(ClusterError::CapacityExceeded {
                requested: cells,
                limit: MAX_CACHE_CELLS,
            });
        }

        Ok(Self {
            dcc: DistanceCache::new(n),
            transitions: {
                let mut tm = TransitionMatrix::new();
                tm.grow_to(n);
                tm
            },
            store: ClusterStore::with_capacity(n),
            records: RecordLog::new(),
            stats: RunStats::new(),
            prev: None,
            pool: WorkerPool::new(threads),
            cancellation: CancellationToken::new(),
            probe_log: Vec::new(),
            scratch_active: Vec::with_capacity(n),
            config,
            radius,
        })
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn store(&self) -> &ClusterStore {
        &self.store
    }

    pub fn distance_cache(&self) -> &DistanceCache {
        &self.dcc
    }

    pub fn transitions(&self) -> &TransitionMatrix {
        &self.transitions
    }

    pub fn records(&self) -> &RecordLog {
        &self.records
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn probe_log(&self) -> &[String] {
        &self.probe_log
    }

    pub fn worker_pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Drive `source` to completion, calling [`process_frame`] on every
    /// frame it yields. Stops early on cancellation, overflow-`stop`, or
    /// the `maxim` frame cap, all of which are graceful terminations
    /// rather than failures (`spec.md` §5, §7).
    ///
    /// [`process_frame`]: Self::process_frame
    pub fn run(&mut self, source: &mut dyn FrameSource) -> anyhow::Result<RunSummary> {
        self.stats.start();
        let mut processed = 0u64;
        let mut stopped_by_overflow = false;

        while processed < self.config.maxim {
            if self.cancellation.is_cancelled() {
                tracing::info!(target: "engine", processed, "cancellation observed, stopping");
                break;
            }
            let Some(frame) = source.next() else {
                break;
            };
            match self.process_frame(frame)? {
                StepOutcome::Assigned(_) => {}
                StepOutcome::Stopped => {
                    stopped_by_overflow = true;
                    break;
                }
            }
            processed += 1;
        }

        self.stats.stop();
        Ok(RunSummary {
            frames_processed: processed,
            stopped_by_overflow,
        })
    }

    /// Process exactly one frame through the §4.1 state machine.
    pub fn process_frame(&mut self, frame: Frame) -> Result<StepOutcome, ClusterError> {
        let frame_id = frame.id;

        if self.store.is_empty() {
            return Ok(self.bootstrap(frame));
        }

        self.store.normalize_priors();

        self.scratch_active.clear();
        self.scratch_active.extend(self.store.iter_active_ids());
        let considered = self.scratch_active.len() as u64;
        let mut active: HashSet<ClusterId> = self.scratch_active.iter().copied().collect();
        let mut gprob: HashMap<ClusterId, f64> =
            self.scratch_active.iter().map(|&id| (id, 1.0)).collect();

        let mut record = FrameRecord::new(frame_id);
        let mut assigned: Option<ClusterId> = None;

        if self.config.pred {
            let committed: Vec<ClusterId> = self
                .records
                .assignments()
                .filter_map(|a| match a {
                    Assignment::Cluster(id) => Some(id),
                    _ => None,
                })
                .collect();
            let predicted = predict_candidates(
                &committed,
                self.config.pred_len,
                self.config.pred_h,
                self.config.pred_n,
            );
            for p in predicted {
                if !active.contains(&p) {
                    continue;
                }
                if self.probe(p, &frame, frame_id, &mut active, &mut gprob, &mut record)? {
                    assigned = Some(p);
                    break;
                }
            }
        }

        while assigned.is_none() && !active.is_empty() {
            let j = self.pick_best(&active, &gprob);
            if self.probe(j, &frame, frame_id, &mut active, &mut gprob, &mut record)? {
                assigned = Some(j);
            }
        }

        let pruned = considered.saturating_sub(record.probes.len() as u64);
        self.stats.record_step(considered, pruned);

        let outcome = match assigned {
            Some(id) => self.commit(id),
            None => self.handle_new_cluster_or_overflow(frame, frame_id, &mut record)?,
        };

        if let StepOutcome::Assigned(id) = outcome {
            self.post_commit(id);
        }

        self.records.push(record);
        Ok(outcome)
    }

    fn bootstrap(&mut self, frame: Frame) -> StepOutcome {
        let frame_id = frame.id;
        self.dcc.grow_to(1);
        self.transitions.grow_to(1);
        let id = self.store.insert(frame);
        self.store.get_mut(id).visitors.push(frame_id);
        let mut record = FrameRecord::new(frame_id);
        record.push_probe(id, 0.0);
        record.assignment = Assignment::Cluster(id);
        tracing::info!(target: "engine", cluster = id.0, frame = frame_id.0, "bootstrap cluster created");
        self.records.push(record);
        self.post_commit(id);
        StepOutcome::Assigned(id)
    }

    /// Pick the active cluster with the highest current score, ties
    /// broken by smaller id (`spec.md` §4.1 step 6a). Rescans live every
    /// call; when `gprob` is disabled and `tm_mix` is zero this is
    /// equivalent to the source's once-sorted candidate order, since the
    /// score of every untouched cluster is unchanged between iterations.
    fn pick_best(&self, active: &HashSet<ClusterId>, gprob: &HashMap<ClusterId, f64>) -> ClusterId {
        let alpha = self.config.tm_mix;
        let mut best: Option<(f64, ClusterId)> = None;
        for &id in active {
            let prior = self.store.get(id).prior;
            let base = if alpha > 0.0 {
                let tmrow = self.transitions.row_fraction(self.prev, id);
                (1.0 - alpha) * prior + alpha * tmrow
            } else {
                prior
            };
            let score = base * gprob.get(&id).copied().unwrap_or(1.0);
            best = match best {
                None => Some((score, id)),
                Some((bs, bid)) if score > bs || (score == bs && id.0 < bid.0) => Some((score, id)),
                keep => keep,
            };
        }
        best.expect("active set is non-empty").1
    }

    /// Probe body (`spec.md` §4.1 steps 6b–6h): measure, check hit, prune,
    /// reweight. Returns `true` on a hit (the frame attaches to `j`).
    fn probe(
        &mut self,
        j: ClusterId,
        frame: &Frame,
        frame_id: FrameId,
        active: &mut HashSet<ClusterId>,
        gprob: &mut HashMap<ClusterId, f64>,
        record: &mut FrameRecord,
    ) -> Result<bool, ClusterError> {
        let dfc = frame_distance(frame, &self.store.get(j).anchor)?;
        self.stats.record_distance_call();
        record.push_probe(j, dfc);
        self.store.get_mut(j).visitors.push(frame_id);

        if self.config.distall {
            let prior = self.store.get(j).prior;
            let g = gprob.get(&j).copied().unwrap_or(1.0);
            self.probe_log.push(ProbeDistanceWriter::line(
                frame_id.0, frame_id.0, dfc, self.radius, j.0, prior, g,
            ));
        }

        if dfc < self.radius {
            active.remove(&j);
            gprob.remove(&j);
            return Ok(true);
        }

        // Step 6d: 2-point triangle pruning. Every candidate's bound check
        // is independent, so this farms out over the rayon pool and merges
        // serially into `active`/`gprob` (`spec.md` §5 bullet 1). Every
        // pairwise anchor distance here is already cached: `create_cluster`
        // fills cluster `k`'s whole row against every existing anchor at
        // insertion time, so this never touches the slow `dcc.get` path.
        let candidates: Vec<ClusterId> = active.iter().copied().filter(|&ell| ell != j).collect();
        let dcc = &self.dcc;
        let radius = self.radius;
        let pruned: Vec<ClusterId> = self.pool.install(|| {
            candidates
                .par_iter()
                .copied()
                .filter(|&ell| {
                    let d_j_ell = dcc
                        .peek(j, ell)
                        .expect("pairwise anchor distance pre-filled at cluster creation");
                    two_point_bound(d_j_ell, dfc) > radius
                })
                .collect()
        });
        for &ell in &pruned {
            active.remove(&ell);
            gprob.remove(&ell);
        }

        // Step 6f: 4-point pruning using every previous probe this frame.
        if self.config.te4 {
            self.four_point_prune(j, dfc, frame_id, active, gprob, record);
        }

        // Step 6g: 5-point pruning, once at least 3 clusters have been
        // probed this frame (the reference triple needs `j` plus two
        // earlier probes).
        if self.config.te5 && record.probes.len() >= 3 {
            self.five_point_prune(j, dfc, active, gprob, record);
        }

        // Step 6e: gprob suffix-scan update.
        if self.config.gprob && active.len() > 1 {
            let visitors = self.store.get(j).visitors.clone();
            let radius = self.radius;
            let a = self.config.fmatch_a;
            let b = self.config.fmatch_b;
            let cap = self.config.max_gprob_visitors;
            let records = &self.records;
            gprob::update_suffix(
                gprob,
                &visitors,
                j,
                frame_id,
                dfc,
                radius,
                cap,
                a,
                b,
                |v| {
                    records
                        .iter()
                        .rev()
                        .find(|r| r.frame == v)
                        .and_then(|r| match r.assignment {
                            Assignment::Cluster(id) => Some(id),
                            _ => None,
                        })
                },
                |v, cluster| {
                    records
                        .iter()
                        .rev()
                        .find(|r| r.frame == v)
                        .and_then(|r| r.probe_distance(cluster))
                },
            );
        }

        active.remove(&j);
        gprob.remove(&j);
        Ok(false)
    }

    /// 4-point lower-bound pruning against every cluster still active
    /// after the 2-point pass, using each earlier probe `(p, d_p)` from
    /// this same frame (`spec.md` §4.1 step 6f).
    /// Same farm-out-and-merge shape as the 2-point pass above: the inner
    /// scan over candidates is independent per earlier probe `p`, so each
    /// `p` dispatches its candidate scan to the rayon pool and the results
    /// are merged serially afterward.
    fn four_point_prune(
        &mut self,
        j: ClusterId,
        dfc: f64,
        _frame_id: FrameId,
        active: &mut HashSet<ClusterId>,
        gprob: &mut HashMap<ClusterId, f64>,
        record: &FrameRecord,
    ) {
        let radius = self.radius;
        let earlier_probes: Vec<(ClusterId, f64)> = record
            .probes
            .iter()
            .filter(|p| p.cluster != j)
            .map(|p| (p.cluster, p.distance))
            .collect();

        let candidates: Vec<ClusterId> = active.iter().copied().collect();
        let dcc = &self.dcc;
        let mut pruned: Vec<ClusterId> = Vec::new();
        for (p, d_p) in &earlier_probes {
            let d_j_p = dcc
                .peek(j, *p)
                .expect("pairwise anchor distance pre-filled at cluster creation");
            let found: Vec<ClusterId> = self.pool.install(|| {
                candidates
                    .par_iter()
                    .copied()
                    .filter(|&ell| {
                        if ell == j || ell == *p {
                            return false;
                        }
                        let d_j_ell = dcc
                            .peek(j, ell)
                            .expect("pairwise anchor distance pre-filled at cluster creation");
                        let d_p_ell = dcc
                            .peek(*p, ell)
                            .expect("pairwise anchor distance pre-filled at cluster creation");
                        four_point_bound(dfc, *d_p, d_j_p, d_j_ell, d_p_ell) > radius
                    })
                    .collect()
            });
            pruned.extend(found);
        }
        for ell in pruned {
            active.remove(&ell);
            gprob.remove(&ell);
        }
    }

    /// 5-point lower-bound pruning against every cluster still active
    /// after the 2-point/4-point passes, using `j` plus every pair of
    /// earlier probes from this frame as the reference triple
    /// (`spec.md` §4.1 step 6g). Fixing `c1 = j` for every triple mirrors
    /// [`four_point_prune`]'s choice of anchor, so this bound is computed
    /// against a strict superset of the constraints `four_point_prune`
    /// used for the same `(j, p)` pair — it can only prune at least as
    /// much, never less.
    fn five_point_prune(
        &mut self,
        j: ClusterId,
        dfc: f64,
        active: &mut HashSet<ClusterId>,
        gprob: &mut HashMap<ClusterId, f64>,
        record: &FrameRecord,
    ) {
        let radius = self.radius;
        let earlier_probes: Vec<(ClusterId, f64)> = record
            .probes
            .iter()
            .filter(|p| p.cluster != j)
            .map(|p| (p.cluster, p.distance))
            .collect();

        let candidates: Vec<ClusterId> = active.iter().copied().collect();
        let dcc = &self.dcc;
        let mut pruned: Vec<ClusterId> = Vec::new();

        for a in 0..earlier_probes.len() {
            for b in (a + 1)..earlier_probes.len() {
                let (c2, d_f_c2) = earlier_probes[a];
                let (c3, d_f_c3) = earlier_probes[b];
                let refs = ReferenceTriple {
                    d12: dcc
                        .peek(j, c2)
                        .expect("pairwise anchor distance pre-filled at cluster creation"),
                    d13: dcc
                        .peek(j, c3)
                        .expect("pairwise anchor distance pre-filled at cluster creation"),
                    d23: dcc
                        .peek(c2, c3)
                        .expect("pairwise anchor distance pre-filled at cluster creation"),
                };

                let found: Vec<ClusterId> = self.pool.install(|| {
                    candidates
                        .par_iter()
                        .copied()
                        .filter(|&ell| {
                            if ell == j || ell == c2 || ell == c3 {
                                return false;
                            }
                            let d_ell_c1 = dcc
                                .peek(j, ell)
                                .expect("pairwise anchor distance pre-filled at cluster creation");
                            let d_ell_c2 = dcc
                                .peek(c2, ell)
                                .expect("pairwise anchor distance pre-filled at cluster creation");
                            let d_ell_c3 = dcc
                                .peek(c3, ell)
                                .expect("pairwise anchor distance pre-filled at cluster creation");
                            match five_point_bound(
                                refs, dfc, d_f_c2, d_f_c3, d_ell_c1, d_ell_c2, d_ell_c3,
                            ) {
                                Some(bound) => bound > radius,
                                None => false,
                            }
                        })
                        .collect()
                });
                pruned.extend(found);
            }
        }
        for ell in pruned {
            active.remove(&ell);
            gprob.remove(&ell);
        }
    }

    fn commit(&mut self, id: ClusterId) -> StepOutcome {
        let prior_increment = self.config.dprob;
        self.store.get_mut(id).prior += prior_increment;
        StepOutcome::Assigned(id)
    }

    fn handle_new_cluster_or_overflow(
        &mut self,
        frame: Frame,
        frame_id: FrameId,
        record: &mut FrameRecord,
    ) -> Result<StepOutcome, ClusterError> {
        if self.store.active_count() < self.config.maxcl {
            let id = self.create_cluster(frame, frame_id);
            record.push_probe(id, 0.0);
            record.assignment = Assignment::Cluster(id);
            return Ok(StepOutcome::Assigned(id));
        }

        tracing::warn!(
            target: "overflow",
            strategy = ?self.config.maxcl_strategy,
            maxcl = self.config.maxcl,
            "cluster store at capacity"
        );

        match overflow::apply(
            self.config.maxcl_strategy,
            &mut self.store,
            &mut self.dcc,
            &mut self.transitions,
            self.config.discard_fraction,
        )? {
            OverflowOutcome::Stop => {
                record.assignment = Assignment::Unassigned;
                Ok(StepOutcome::Stopped)
            }
            OverflowOutcome::Discarded => {
                let retired: Vec<ClusterId> = self
                    .store
                    .iter()
                    .filter(|c| c.retired)
                    .map(|c| c.id)
                    .collect();
                self.records.mark_discarded(&retired);
                let id = self.create_cluster(frame, frame_id);
                record.push_probe(id, 0.0);
                record.assignment = Assignment::Cluster(id);
                Ok(StepOutcome::Assigned(id))
            }
            OverflowOutcome::Merged(survivor) => {
                // The merged survivor captures the current frame
                // directly, per §4.6 — no new cluster is created.
                let d = frame_distance(&frame, &self.store.get(survivor).anchor)?;
                self.stats.record_distance_call();
                record.push_probe(survivor, d);
                record.assignment = Assignment::Cluster(survivor);
                self.store.get_mut(survivor).visitors.push(frame_id);
                self.store.get_mut(survivor).prior += self.config.dprob;
                Ok(StepOutcome::Assigned(survivor))
            }
        }
    }

    fn create_cluster(&mut self, frame: Frame, frame_id: FrameId) -> ClusterId {
        let new_len = self.store.len() + 1;
        self.dcc.grow_to(new_len);
        self.transitions.grow_to(new_len);

        let existing: Vec<ClusterId> = self.store.iter().map(|c| c.id).collect();
        let id = self.store.insert(frame);
        for other in existing {
            let d = {
                let a = &self.store.get(id).anchor;
                let b = &self.store.get(other).anchor;
                crate::distance::euclidean(&a.data, &b.data)
            };
            self.dcc.set(id, other, d);
        }
        self.store.get_mut(id).visitors.push(frame_id);
        tracing::info!(target: "engine", cluster = id.0, frame = frame_id.0, "new cluster created");
        id
    }
}

// `commit`/post-commit bookkeeping (transition matrix, `prev`) runs for
// every successful assignment, whether newly created or attached.
impl ClusteringEngine {
    fn post_commit(&mut self, assignment: ClusterId) {
        if let Some(prev) = self.prev {
            self.transitions.increment(prev, assignment);
        }
        self.prev = Some(assignment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameId, VecFrameSource};
    use std::io::Write;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    fn cfg(rlim: f64) -> EngineConfig {
        let mut c = EngineConfig::default();
        c.rlim = Some(rlim);
        c
    }

    fn vec_frame(id: u64, v: f64) -> Frame {
        Frame::vector(FrameId(id), vec![v])
    }

    #[test]
    fn scenario_1_five_frame_line() {
        let mut engine = ClusteringEngine::new(cfg(3.0), 3.0).unwrap();
        let values = [0.0, 1.0, 2.0, 4.0, 7.0];
        let mut assignments = Vec::new();
        for (i, &v) in values.iter().enumerate() {
            let outcome = engine.process_frame(vec_frame(i as u64, v)).unwrap();
            match outcome {
                StepOutcome::Assigned(id) => assignments.push(id.0),
                StepOutcome::Stopped => panic!("unexpected stop"),
            }
        }
        assert_eq!(assignments, vec![0, 0, 0, 1, 2]);
        assert_eq!(engine.store().len(), 3);
    }

    #[test]
    fn scenario_2_identical_frames_form_one_cluster() {
        let mut engine = ClusteringEngine::new(cfg(0.1), 0.1).unwrap();
        for i in 0..100u64 {
            engine.process_frame(vec_frame(i, 0.0)).unwrap();
        }
        assert_eq!(engine.store().len(), 1);
        assert_eq!(engine.transitions().get(ClusterId(0), ClusterId(0)), 99);
    }

    #[test]
    fn rlim_zero_forces_a_new_cluster_per_frame() {
        let mut engine = ClusteringEngine::new(cfg(0.0), 0.0).unwrap();
        for i in 0..5u64 {
            engine.process_frame(vec_frame(i, i as f64)).unwrap();
        }
        assert_eq!(engine.store().len(), 5);
    }

    #[test]
    fn discard_overflow_marks_retired_clusters_assignments_as_discarded() {
        let mut c = cfg(0.5);
        c.maxcl = 2;
        c.maxcl_strategy = crate::config::MaxClustStrategy::Discard;
        c.discard_fraction = 1.0 / 2.0;
        let mut engine = ClusteringEngine::new(c, 0.5).unwrap();

        // Two well-separated clusters fill capacity, then a third, distant
        // frame forces one of them out.
        engine.process_frame(vec_frame(0, 0.0)).unwrap();
        engine.process_frame(vec_frame(1, 10.0)).unwrap();
        let outcome = engine.process_frame(vec_frame(2, 100.0)).unwrap();

        match outcome {
            StepOutcome::Assigned(id) => assert_eq!(id, ClusterId(2)),
            StepOutcome::Stopped => panic!("discard should free a slot, not stop"),
        }
        assert_eq!(engine.store().active_count(), 2);
        let discarded_count = engine
            .records()
            .iter()
            .filter(|r| r.assignment == Assignment::Discarded)
            .count();
        assert_eq!(discarded_count, 1);
    }

    #[test]
    fn merge_overflow_routes_the_frame_to_the_surviving_cluster() {
        let mut c = cfg(0.5);
        c.maxcl = 2;
        c.maxcl_strategy = crate::config::MaxClustStrategy::Merge;
        let mut engine = ClusteringEngine::new(c, 0.5).unwrap();

        engine.process_frame(vec_frame(0, 0.0)).unwrap();
        engine.process_frame(vec_frame(1, 10.0)).unwrap();
        let outcome = engine.process_frame(vec_frame(2, 100.0)).unwrap();

        // No third cluster is created under `merge`; capacity stays at 2.
        assert_eq!(engine.store().len(), 2);
        match outcome {
            StepOutcome::Assigned(id) => assert!(id == ClusterId(0) || id == ClusterId(1)),
            StepOutcome::Stopped => panic!("merge should free a slot, not stop"),
        }
    }

    #[test]
    fn new_cluster_creation_logs_under_the_engine_target() {
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut engine = ClusteringEngine::new(cfg(1.0), 1.0).unwrap();
            engine.process_frame(vec_frame(0, 0.0)).unwrap();
            engine.process_frame(vec_frame(1, 100.0)).unwrap();
        });

        let logged = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("engine"));
        assert!(logged.contains("new cluster created"));
    }

    #[test]
    fn run_drives_a_frame_source_to_completion() {
        let mut engine = ClusteringEngine::new(cfg(3.0), 3.0).unwrap();
        let frames = [0.0, 1.0, 2.0, 4.0, 7.0]
            .iter()
            .enumerate()
            .map(|(i, &v)| vec_frame(i as u64, v))
            .collect();
        let mut source = VecFrameSource::new(frames);
        let summary = engine.run(&mut source).unwrap();
        assert_eq!(summary.frames_processed, 5);
        assert!(!summary.stopped_by_overflow);
    }
}
