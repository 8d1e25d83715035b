//! Frame record log (`spec.md` §3, §6): per processed frame, the final
//! assignment plus every probe taken to reach it. The log is append-only
//! and prefix-stable — truncating at any point yields a valid state,
//! per §8's testable property.

use crate::cluster::ClusterId;
use crate::frame::FrameId;

/// One measurement `d(frame, anchor(cluster))` taken during a frame's
/// assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probe {
    pub cluster: ClusterId,
    pub distance: f64,
}

/// Outcome of a single frame's assignment step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    Cluster(ClusterId),
    /// The frame was consumed by the `stop` overflow policy and left
    /// unassigned; it still occupies a slot in the log (§4.6).
    Unassigned,
    /// The frame was retired by the `discard` overflow policy.
    Discarded,
}

#[derive(Debug, Clone)]
pub struct FrameRecord {
    pub frame: FrameId,
    pub assignment: Assignment,
    pub probes: Vec<Probe>,
}

impl FrameRecord {
    pub fn new(frame: FrameId) -> Self {
        Self {
            frame,
            assignment: Assignment::Unassigned,
            probes: Vec::new(),
        }
    }

    pub fn push_probe(&mut self, cluster: ClusterId, distance: f64) {
        self.probes.push(Probe { cluster, distance });
    }

    /// The probe this frame recorded against `cluster`, if any. Gprob's
    /// suffix scan relies on this always existing for a visitor of that
    /// cluster (§4.1 step 6e).
    pub fn probe_distance(&self, cluster: ClusterId) -> Option<f64> {
        self.probes
            .iter()
            .find(|p| p.cluster == cluster)
            .map(|p| p.distance)
    }

    pub fn to_assignment_line(&self) -> Option<String> {
        match self.assignment {
            Assignment::Cluster(id) => Some(format!("{} {}", self.frame.0, id.0)),
            Assignment::Unassigned | Assignment::Discarded => None,
        }
    }
}

/// Append-only sequence of frame records, indexed by processing order
/// (not necessarily by `FrameId`, though in practice they coincide).
#[derive(Debug, Default)]
pub struct RecordLog {
    records: Vec<FrameRecord>,
}

impl RecordLog {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: FrameRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FrameRecord> {
        self.records.get(index)
    }

    pub fn last(&self) -> Option<&FrameRecord> {
        self.records.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameRecord> {
        self.records.iter()
    }

    /// Every prior assignment, in processing order; used by the
    /// transition matrix and by prediction's pattern scan.
    pub fn assignments(&self) -> impl Iterator<Item = Assignment> + '_ {
        self.records.iter().map(|r| r.assignment)
    }

    /// Truncate to the first `len` records; exists chiefly so tests can
    /// exercise the "valid state at any prefix" invariant directly.
    pub fn truncate(&mut self, len: usize) {
        self.records.truncate(len);
    }

    /// Rewrite every record currently assigned to a retired cluster in
    /// `ids` to `Assignment::Discarded` (`spec.md` §4.6: discarded
    /// clusters' frames are marked discarded in the assignment log, not
    /// silently reassigned).
    pub fn mark_discarded(&mut self, ids: &[ClusterId]) {
        if ids.is_empty() {
            return;
        }
        for record in &mut self.records {
            if let Assignment::Cluster(id) = record.assignment {
                if ids.contains(&id) {
                    record.assignment = Assignment::Discarded;
                }
            }
        }
    }
}
