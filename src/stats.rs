//! Run statistics (`spec.md` §6's run-log fields): distance-computation
//! counters, per-step pruning fractions, timing, and peak RSS.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub framedist_calls: u64,
    /// `(clusters_considered, clusters_pruned)` recorded once per
    /// processed frame, for the "fraction pruned per step" histogram.
    per_step: Vec<(u64, u64)>,
    started: Option<Instant>,
    elapsed: Duration,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    pub fn stop(&mut self) {
        if let Some(start) = self.started.take() {
            self.elapsed += start.elapsed();
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn record_distance_call(&mut self) {
        self.framedist_calls += 1;
    }

    pub fn record_step(&mut self, considered: u64, pruned: u64) {
        self.per_step.push((considered, pruned));
    }

    pub fn steps(&self) -> usize {
        self.per_step.len()
    }

    /// Mean fraction of clusters pruned per step, matching the source's
    /// final "Average fraction of clusters pruned per step" stat.
    pub fn average_pruned_fraction(&self) -> f64 {
        if self.per_step.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .per_step
            .iter()
            .map(|&(considered, pruned)| {
                if considered == 0 {
                    0.0
                } else {
                    pruned as f64 / considered as f64
                }
            })
            .sum();
        sum / self.per_step.len() as f64
    }

    /// `(bin, count, pruned)` histogram of distance computations per
    /// frame, bucketed by the number of distances measured that frame
    /// (the source's `distall` histogram, reused here at the probe-count
    /// level since probe count and distance-computation count coincide
    /// per frame).
    pub fn distance_count_histogram(&self) -> Vec<(u64, u64, u64)> {
        use std::collections::BTreeMap;
        let mut bins: BTreeMap<u64, (u64, u64)> = BTreeMap::new();
        for &(considered, pruned) in &self.per_step {
            let entry = bins.entry(considered).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += pruned;
        }
        bins.into_iter()
            .map(|(bin, (count, pruned))| (bin, count, pruned))
            .collect()
    }

    /// Best-effort peak resident-set size in kilobytes, read from
    /// `/proc/self/status` on Linux. `None` on any other platform or if
    /// the read fails — this is a single ambient stat, not worth a
    /// dependency.
    pub fn peak_rss_kb(&self) -> Option<u64> {
        #[cfg(target_os = "linux")]
        {
            let status = std::fs::read_to_string("/proc/self/status").ok()?;
            for line in status.lines() {
                if let Some(rest) = line.strip_prefix("VmHWM:") {
                    return rest.trim().split_whitespace().next()?.parse().ok();
                }
            }
            None
        }
        #[cfg(not(target_os = "linux"))]
        {
            None
        }
    }
}
