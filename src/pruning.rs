//! Geometric pruning lower bounds (`spec.md` §4.1 steps 6d/6f/6g).
//!
//! All three bounds answer the same question — "can the distance from `f`
//! to `anchor(ell)` possibly be under R?" — using progressively more known
//! pairwise distances to get a tighter answer. None of them ever measure
//! `f` against `anchor(ell)` directly; that is the point.

/// Tolerance for clamping a near-zero negative discriminant to zero before
/// a `sqrt`, per `spec.md` §9's explicit floating-point note.
const EPS: f64 = 1e-9;

fn clamp_sqrt(x: f64) -> Option<f64> {
    if x < 0.0 {
        if x > -EPS {
            Some(0.0)
        } else {
            None
        }
    } else {
        Some(x.sqrt())
    }
}

/// 2-point (triangle-inequality) bound: `|c(j, ell) − dfc|`. Sound by the
/// reverse triangle inequality under any metric (`spec.md` §4.1
/// rationale).
pub fn two_point_bound(dcc_j_ell: f64, dfc: f64) -> f64 {
    (dcc_j_ell - dfc).abs()
}

/// 4-point embedding bound (`spec.md` §4.1 step 6f), a direct port of the
/// C source's `calc_min_dist_4pt`.
///
/// Treats `anchor(j)` and `anchor(p)` as two fixed points in a plane
/// (`anchor(j)` at the origin, `anchor(p)` on the x-axis at distance
/// `d_j_p`), then independently solves for the positions of `f` (known
/// distances `dfc` to `anchor(j)`, `d_fp` to `anchor(p)`) and `anchor(ell)`
/// (known distances `d_j_ell`, `d_p_ell`) as the "upper half-plane"
/// solution of each triangle. The planar distance between those two
/// positions is the minimum `d(f, anchor(ell))` consistent with all five
/// known pairwise distances — if it already exceeds R, no actual position
/// of either point (reflected to the lower half-plane) can be closer.
pub fn four_point_bound(
    dfc: f64,
    d_fp: f64,
    d_j_p: f64,
    d_j_ell: f64,
    d_p_ell: f64,
) -> f64 {
    if d_j_p < EPS {
        return (dfc - d_j_ell).abs();
    }

    let x_f = (dfc * dfc + d_j_p * d_j_p - d_fp * d_fp) / (2.0 * d_j_p);
    let y_f = clamp_sqrt(dfc * dfc - x_f * x_f).unwrap_or(0.0);

    let x_ell = (d_j_ell * d_j_ell + d_j_p * d_j_p - d_p_ell * d_p_ell) / (2.0 * d_j_p);
    let y_ell = clamp_sqrt(d_j_ell * d_j_ell - x_ell * x_ell).unwrap_or(0.0);

    let dx = x_f - x_ell;
    let dy = y_f - y_ell;
    (dx * dx + dy * dy).sqrt()
}

/// A single anchor-to-anchor/probe triple consumed by
/// [`five_point_bound`]: the known mutual distances among three already-
/// probed reference points.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceTriple {
    pub d12: f64,
    pub d13: f64,
    pub d23: f64,
}

/// 5-point embedding bound (`spec.md` §4.1 step 6g). Authored fresh — the
/// source never implements this path (`te5_mode` is read by the plotting
/// tool only). Embeds three mutually-probed reference anchors `c1, c2, c3`
/// plus `f` and `anchor(ell)` in 3-D: `c1` at the origin, `c2` on the
/// x-axis, `c3` in the xy-plane (both solved by the same 2-D
/// law-of-cosines step `four_point_bound` already performs), then `f` and
/// `anchor(ell)` each as the point with non-negative z consistent with
/// their three known distances to `c1, c2, c3`. The planar arrangement of
/// `c1, c2, c3` is shared by both solves, so the returned distance is a
/// valid lower bound on `d(f, anchor(ell))`: any other geometrically
/// consistent placement of either point is its mirror image across the
/// `z = 0` plane or further away.
pub fn five_point_bound(
    refs: ReferenceTriple,
    d_f_c1: f64,
    d_f_c2: f64,
    d_f_c3: f64,
    d_ell_c1: f64,
    d_ell_c2: f64,
    d_ell_c3: f64,
) -> Option<f64> {
    let c1 = (0.0, 0.0, 0.0);
    let c2 = (refs.d12, 0.0, 0.0);

    if refs.d12 < EPS {
        // Degenerate base: fall back to the 2-point bound against c1.
        return Some((d_f_c1 - d_ell_c1).abs());
    }

    let x3 = (refs.d13 * refs.d13 + refs.d12 * refs.d12 - refs.d23 * refs.d23) / (2.0 * refs.d12);
    let y3 = clamp_sqrt(refs.d13 * refs.d13 - x3 * x3)?;
    let c3 = (x3, y3, 0.0);

    let f = solve_third_coordinate(c1, c2, c3, d_f_c1, d_f_c2, d_f_c3)?;
    let ell = solve_third_coordinate(c1, c2, c3, d_ell_c1, d_ell_c2, d_ell_c3)?;

    let dx = f.0 - ell.0;
    let dy = f.1 - ell.1;
    let dz = f.2 - ell.2;
    Some((dx * dx + dy * dy + dz * dz).sqrt())
}

/// Solve for the non-negative-`z` point at distances `d1, d2, d3` from the
/// non-degenerate reference triangle `(p1, p2, p3)`, all lying in the
/// `z = 0` plane.
fn solve_third_coordinate(
    p1: (f64, f64, f64),
    p2: (f64, f64, f64),
    p3: (f64, f64, f64),
    d1: f64,
    d2: f64,
    d3: f64,
) -> Option<(f64, f64, f64)> {
    // x from the p1/p2 pair (p1 at origin, p2 on the x-axis).
    let x = (d1 * d1 - d2 * d2 + p2.0 * p2.0) / (2.0 * p2.0);

    // y from the p1/p3 pair, projected onto p3's own plane coordinates.
    let y = (d1 * d1 - d3 * d3 + p3.0 * p3.0 + p3.1 * p3.1 - 2.0 * p3.0 * x) / (2.0 * p3.1);

    let z_sq = d1 * d1 - x * x - y * y;
    let z = clamp_sqrt(z_sq)?;
    Some((x, y, z))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_point_bound_matches_reverse_triangle_inequality() {
        assert_eq!(two_point_bound(10.0, 3.0), 7.0);
        assert_eq!(two_point_bound(3.0, 10.0), 7.0);
    }

    #[test]
    fn four_point_bound_is_exact_for_collinear_points() {
        // f at 0, j at 1, p at 4 on a line; ell coincides with f.
        let dfc = 1.0; // d(f, j)
        let d_fp = 4.0; // d(f, p)
        let d_j_p = 3.0; // d(j, p)
        let d_j_ell = 1.0; // d(j, ell) == d(j, f)
        let d_p_ell = 4.0; // d(p, ell) == d(p, f)
        let bound = four_point_bound(dfc, d_fp, d_j_p, d_j_ell, d_p_ell);
        assert!(bound < 1e-6);
    }

    #[test]
    fn four_point_bound_degenerate_base_falls_back_to_two_point() {
        let bound = four_point_bound(5.0, 5.0, 0.0, 8.0, 8.0);
        assert!((bound - 3.0).abs() < 1e-9);
    }

    #[test]
    fn five_point_bound_is_exact_for_coincident_points() {
        let refs = ReferenceTriple {
            d12: 3.0,
            d13: 4.0,
            d23: 5.0,
        };
        // f and ell both coincide with c1: zero distance to c1, matching
        // distances to c2/c3 derivable from the right triangle above.
        let bound = five_point_bound(refs, 0.0, 3.0, 4.0, 0.0, 3.0, 4.0).unwrap();
        assert!(bound < 1e-6);
    }

    #[test]
    fn five_point_bound_reconstructs_true_distance_and_dominates_two_point() {
        // c1, c2, c3 form a real base triangle in the z=0 plane; f and ell
        // are real 3-D points with positive z, so the canonical solve
        // recovers the true configuration exactly.
        let d12 = 4.0_f64; // c1=(0,0,0), c2=(4,0,0)
        let d13 = 13.0_f64.sqrt(); // c3=(2,3,0)
        let d23 = 13.0_f64.sqrt();
        let refs = ReferenceTriple { d12, d13, d23 };

        // f=(1,1,2), ell=(3,2,1.5)
        let d_f_c1 = 6.0_f64.sqrt();
        let d_f_c2 = 14.0_f64.sqrt();
        let d_f_c3 = 3.0;
        let d_ell_c1 = 15.25_f64.sqrt();
        let d_ell_c2 = 7.25_f64.sqrt();
        let d_ell_c3 = 4.25_f64.sqrt();

        let five_pt = five_point_bound(
            refs, d_f_c1, d_f_c2, d_f_c3, d_ell_c1, d_ell_c2, d_ell_c3,
        )
        .unwrap();
        let true_dist = 5.25_f64.sqrt();
        assert!((five_pt - true_dist).abs() < 1e-6);

        // Two-point bound against the same base point c1 must never
        // exceed the fully-embedded bound.
        let two_pt = two_point_bound(d_ell_c1, d_f_c1);
        assert!(five_pt >= two_pt - 1e-9);
    }
}
