//! Crate-wide error type for the clustering core.
//!
//! Maps onto the error kinds in `spec.md` §7: shape mismatch and capacity
//! exhaustion are fatal bugs, overflow is recovered per policy and only
//! informational under `stop`. Source exhaustion and user interrupt are
//! graceful terminations, not failures, so they never surface as a
//! `ClusterError` variant — `run`'s loop observes them directly (an
//! exhausted `FrameSource::next` returning `None`, a cancelled
//! `CancellationToken`) and reports them through [`crate::engine::RunSummary`]
//! instead.

use crate::config::MaxClustStrategy;

#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("frame {frame_id} has shape {got:?}, expected {expected:?}")]
    ShapeMismatch {
        frame_id: usize,
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("requested capacity {requested} exceeds addressable limit {limit}")]
    CapacityExceeded { requested: usize, limit: usize },

    #[error("max cluster limit {max} reached under strategy {strategy:?}")]
    Overflow {
        max: usize,
        strategy: MaxClustStrategy,
    },

    #[error("no radius configured: set `rlim` or `auto_rlim_factor`")]
    MissingRadius,

    #[error("distance scanner found fewer than two frames to derive an auto radius")]
    InsufficientFramesForScan,
}
