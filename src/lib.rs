//! Online, single-pass, prior-biased incremental clustering over frame
//! sequences. Each frame is measured against a growing set of anchor
//! clusters and either attaches to the closest one within the radius `R`
//! or anchors a new cluster, with triangle-inequality and geometric
//! lower-bound pruning keeping the number of distance computations well
//! below the naive `O(N_cl)` per frame.
//!
//! [`engine::ClusteringEngine`] is the entry point: construct one from an
//! [`config::EngineConfig`] and a resolved radius (see
//! [`engine::resolve_radius`]), then drive it with [`frame::FrameSource`]
//! implementations via [`engine::ClusteringEngine::run`] or
//! [`engine::ClusteringEngine::process_frame`] one frame at a time.

pub mod cluster;
pub mod concurrency;
pub mod config;
pub mod dcc;
pub mod distance;
pub mod engine;
pub mod error;
pub mod frame;
pub mod gprob;
pub mod output;
pub mod overflow;
pub mod prediction;
pub mod pruning;
pub mod record;
pub mod scanner;
pub mod stats;
pub mod transition;
pub mod visitor;

pub use cluster::{Cluster, ClusterId, ClusterStore};
pub use config::{EngineConfig, MaxClustStrategy, RadiusMode};
pub use engine::{ClusteringEngine, RunSummary, StepOutcome};
pub use error::ClusterError;
pub use frame::{Frame, FrameId, FrameSource};
pub use record::{Assignment, FrameRecord, RecordLog};
