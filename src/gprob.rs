//! Geometrical-probability reweighting (`spec.md` §4.4).
//!
//! `fmatch` is a direct port of the C source's piecewise-linear curve;
//! the suffix-scan update lives here too since it has no state of its own
//! beyond the per-frame gprob accumulator the engine owns.

use crate::cluster::ClusterId;
use crate::frame::FrameId;
use crate::visitor::VisitorList;
use std::collections::HashMap;

/// `fm(dr) = a − (a−b)·dr/2` for `dr ≤ 2`, else `0`. `dr` is always
/// non-negative in callers (`|dfc − d_v| / R`), so only the upper bound
/// needs guarding.
pub fn fmatch(dr: f64, a: f64, b: f64) -> f64 {
    if dr > 2.0 {
        0.0
    } else {
        a - (a - b) * dr / 2.0
    }
}

/// Apply the gprob suffix-scan update for probed cluster `j` (§4.1 step
/// 6e) into `gprob`, a per-frame accumulator keyed by cluster id. Only
/// clusters present as a key in `gprob` (i.e. still active) are updated;
/// others are left untouched.
///
/// `assignment_of` and `probe_distance_of` look a visitor's own recorded
/// assignment and its probe distance to `j` up in the frame record log;
/// both are `None` only defensively (`spec.md` §4.1 step 6e notes this
/// should never happen by construction).
pub fn update_suffix(
    gprob: &mut HashMap<ClusterId, f64>,
    visitors: &VisitorList,
    j: ClusterId,
    current: FrameId,
    dfc: f64,
    radius: f64,
    cap: usize,
    a: f64,
    b: f64,
    assignment_of: impl Fn(FrameId) -> Option<ClusterId>,
    probe_distance_of: impl Fn(FrameId, ClusterId) -> Option<f64>,
) {
    if radius <= 0.0 {
        return;
    }
    for &v in visitors.recent_suffix(cap, current) {
        let Some(ell) = assignment_of(v) else { continue };
        if !gprob.contains_key(&ell) {
            continue;
        }
        let Some(d_v) = probe_distance_of(v, j) else {
            continue;
        };
        let dr = (dfc - d_v).abs() / radius;
        let fm = fmatch(dr, a, b);
        *gprob.get_mut(&ell).unwrap() *= fm;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmatch_endpoints() {
        assert_eq!(fmatch(0.0, 2.0, 0.5), 2.0);
        assert_eq!(fmatch(2.0, 2.0, 0.5), 0.5);
        assert_eq!(fmatch(3.0, 2.0, 0.5), 0.0);
    }

    #[test]
    fn fmatch_is_linear_between_endpoints() {
        let mid = fmatch(1.0, 2.0, 0.5);
        assert!((mid - 1.25).abs() < 1e-12);
    }
}
