//! Concurrency primitives (`spec.md` §5): a rayon pool for the
//! vectorizable inner loops, and a cancellation token polled exactly
//! once per frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A thin `Arc<AtomicBool>` wrapper. Cloned freely; every clone observes
/// the same flag. Only `ClusteringEngine`'s frame loop polls it — no
/// other code path does, per §5's explicit prohibition.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Owns the rayon pool sized by `EngineConfig::worker_threads`, used by
/// the distance kernel and pruning inner loops when they farm work out
/// over active cluster indices (`spec.md` §5 bullet 1).
pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    pub fn new(threads: usize) -> Self {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .build()
            .expect("rayon thread pool construction cannot fail for a positive thread count");
        Self { pool }
    }

    /// Run `f` on the pool, returning its result. Every caller passes a
    /// closure that only reads shared state and writes to its own
    /// per-frame scratch slice, per §5's serial-merge requirement.
    pub fn install<R: Send>(&self, f: impl FnOnce() -> R + Send) -> R {
        self.pool.install(f)
    }
}
