//! Line-format writers (`spec.md` §6). These render in-memory strings
//! rather than touching the filesystem themselves — the library has no
//! hidden I/O, and callers decide where the bytes land.

use crate::cluster::ClusterStore;
use crate::config::{EngineConfig, MaxClustStrategy};
use crate::dcc::DistanceCache;
use crate::stats::RunStats;
use crate::transition::TransitionMatrix;
use std::fmt;

/// `"<i> <j> <distance>"` for every populated cache cell with valid ids.
pub struct DccWriter;

impl DccWriter {
    pub fn render(store: &ClusterStore, dcc: &DistanceCache) -> String {
        let n = store.len();
        let mut out = String::new();
        for i in 0..n {
            for j in (i + 1)..n {
                if let Some(d) = dcc.peek(crate::cluster::ClusterId(i), crate::cluster::ClusterId(j)) {
                    out.push_str(&format!("{i} {j} {d:.6}\n"));
                }
            }
        }
        out
    }
}

/// `"<i> <j> <count>"` for every non-zero transition-matrix cell.
pub struct TransitionWriter;

impl TransitionWriter {
    pub fn render(matrix: &TransitionMatrix) -> String {
        let mut out = String::new();
        for (i, j, count) in matrix.nonzero() {
            out.push_str(&format!("{i} {j} {count}\n"));
        }
        out
    }
}

/// One line per measured distance (`spec.md` §6's optional probe-distance
/// output): frame id, peer (anchor) frame id, distance, ratio-to-R,
/// probed cluster id, cluster prior, current gprob.
pub struct ProbeDistanceWriter;

impl ProbeDistanceWriter {
    pub fn line(
        frame_id: u64,
        peer_frame_id: u64,
        distance: f64,
        radius: f64,
        cluster: usize,
        prior: f64,
        gprob: f64,
    ) -> String {
        let ratio = if radius > 0.0 { distance / radius } else { -1.0 };
        format!(
            "{frame_id} {peer_frame_id} {distance:.6} {ratio:.6} {cluster} {prior:.6} {gprob:.6}"
        )
    }
}

/// Key:value run log plus the two delimited histograms described in
/// `spec.md` §6, field names matching the source's `write_results`
/// output.
pub struct RunLog<'a> {
    pub config: &'a EngineConfig,
    pub stats: &'a RunStats,
    pub total_clusters: usize,
    pub radius: f64,
}

impl<'a> fmt::Display for RunLog<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "rlim {:.6}", self.radius)?;
        writeln!(f, "dprob {:.6}", self.config.dprob)?;
        writeln!(f, "maxcl {}", self.config.maxcl)?;
        writeln!(f, "maxim {}", self.config.maxim)?;
        writeln!(f, "gprob_mode {}", self.config.gprob)?;
        writeln!(f, "fmatcha {:.6}", self.config.fmatch_a)?;
        writeln!(f, "fmatchb {:.6}", self.config.fmatch_b)?;
        writeln!(f, "maxcl_strategy {}", strategy_name(self.config.maxcl_strategy))?;
        writeln!(f, "total_clusters {}", self.total_clusters)?;
        writeln!(f, "framedist_calls {}", self.stats.framedist_calls)?;
        writeln!(
            f,
            "avg_pruned_fraction {:.6}",
            self.stats.average_pruned_fraction()
        )?;
        writeln!(f, "elapsed_seconds {:.6}", self.stats.elapsed().as_secs_f64())?;
        if let Some(rss) = self.stats.peak_rss_kb() {
            writeln!(f, "peak_rss_kb {rss}")?;
        }

        writeln!(f, "STATS_DIST_HIST_START")?;
        for (bin, count, pruned) in self.stats.distance_count_histogram() {
            writeln!(f, "{bin} {count} {pruned}")?;
        }
        writeln!(f, "STATS_DIST_HIST_END")?;
        Ok(())
    }
}

fn strategy_name(strategy: MaxClustStrategy) -> &'static str {
    match strategy {
        MaxClustStrategy::Stop => "stop",
        MaxClustStrategy::Discard => "discard",
        MaxClustStrategy::Merge => "merge",
    }
}
