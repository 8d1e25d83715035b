//! Auto-radius / distance scanner (`spec.md` §4.7).
//!
//! Streams consecutive-frame distances from a `FrameSource`, reports
//! summary statistics, and — in auto-radius mode — derives the
//! clustering radius from the median. The source is reset to index 0
//! afterward so the clustering pass can reread it from the start.

use crate::distance::frame_distance;
use crate::error::ClusterError;
use crate::frame::FrameSource;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanStats {
    pub count: usize,
    pub min: f64,
    pub p20: f64,
    pub median: f64,
    pub p80: f64,
    pub max: f64,
}

impl ScanStats {
    pub fn auto_radius(&self, factor: f64) -> f64 {
        factor * self.median
    }
}

/// Scan up to `maxnbfr` consecutive-frame intervals (i.e. at most
/// `maxnbfr` distances from `maxnbfr + 1` frames), per §4.7's "caps
/// intervals, not frames" clarification. Returns `None` if fewer than two
/// frames are available.
pub fn scan(source: &mut dyn FrameSource, maxnbfr: u64) -> Result<Option<ScanStats>, ClusterError> {
    let Some(mut prev) = source.next() else {
        return Ok(None);
    };

    let mut distances = Vec::new();
    let mut scanned = 0u64;
    while scanned < maxnbfr {
        let Some(curr) = source.next() else { break };
        let d = frame_distance(&prev, &curr)?;
        distances.push(d);
        prev = curr;
        scanned += 1;
    }
    source.reset();

    if distances.is_empty() {
        return Ok(None);
    }

    distances.sort_by(|a, b| a.partial_cmp(b).unwrap());
    Ok(Some(summarize(&distances)))
}

fn summarize(sorted: &[f64]) -> ScanStats {
    let n = sorted.len();
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };
    ScanStats {
        count: n,
        min: sorted[0],
        p20: percentile(sorted, 0.2),
        median,
        p80: percentile(sorted, 0.8),
        max: sorted[n - 1],
    }
}

/// Linear-interpolated percentile at index `(n-1) * q`, matching the
/// source's `p20`/`p80` derivation exactly.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    let idx = (n - 1) as f64 * q;
    let i = idx.floor() as usize;
    let frac = idx - i as f64;
    if i + 1 < n {
        sorted[i] * (1.0 - frac) + sorted[i + 1] * frac
    } else {
        sorted[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Frame, FrameId, VecFrameSource};

    fn source(values: &[f64]) -> VecFrameSource {
        VecFrameSource::new(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| Frame::vector(FrameId(i as u64), vec![v]))
                .collect(),
        )
    }

    #[test]
    fn uniform_spacing_gives_equal_percentiles() {
        let mut src = source(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        let stats = scan(&mut src, 100).unwrap().unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.median, 1.0);
        assert_eq!(stats.max, 1.0);
        assert_eq!(stats.p20, 1.0);
        assert_eq!(stats.p80, 1.0);
    }

    #[test]
    fn maxnbfr_caps_intervals_not_frames() {
        let mut src = source(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let stats = scan(&mut src, 2).unwrap().unwrap();
        assert_eq!(stats.count, 2);
    }

    #[test]
    fn resets_source_after_scanning() {
        let mut src = source(&[0.0, 1.0, 2.0]);
        scan(&mut src, 100).unwrap();
        assert_eq!(src.next().unwrap().id, FrameId(0));
    }

    #[test]
    fn fewer_than_two_frames_yields_none() {
        let mut src = source(&[0.0]);
        assert!(scan(&mut src, 100).unwrap().is_none());
    }

    #[test]
    fn auto_radius_scales_median() {
        let stats = ScanStats {
            count: 3,
            min: 1.0,
            p20: 1.0,
            median: 2.0,
            p80: 3.0,
            max: 3.0,
        };
        assert_eq!(stats.auto_radius(1.5), 3.0);
    }
}
