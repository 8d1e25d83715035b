//! Pattern prediction (`spec.md` §4.1 step 5, §4.5).
//!
//! Looks for prior occurrences of the current assignment pattern within a
//! bounded lookback window and tallies what followed each occurrence,
//! producing a warm-start candidate ordering. This never changes scoring;
//! it only changes which candidate is probed first.

use crate::cluster::ClusterId;
use std::collections::HashMap;

/// Scan `assignments[search_start..search_limit)` for occurrences of the
/// trailing `pattern` and tally the cluster that immediately followed
/// each match, returning up to `top_n` clusters ordered by descending
/// tally (ties broken by smaller id, via decorate-sort-undecorate rather
/// than the source's global-pointer `qsort` comparator).
///
/// `assignments` is the full prefix of committed cluster assignments in
/// processing order (discarded/unassigned frames are not part of this
/// sequence, matching the source's compacted `assignments` array).
pub fn predict_candidates(
    assignments: &[ClusterId],
    pattern_len: usize,
    lookback: usize,
    top_n: usize,
) -> Vec<ClusterId> {
    let total = assignments.len();
    if total < pattern_len + 1 {
        return Vec::new();
    }

    let pattern = &assignments[total - pattern_len..];
    let search_limit = total - pattern_len;
    let search_start = search_limit.saturating_sub(lookback).min(search_limit);

    let mut tally: HashMap<ClusterId, u64> = HashMap::new();
    for start in search_start..search_limit {
        if assignments[start..start + pattern_len] == *pattern {
            let next = assignments[start + pattern_len];
            *tally.entry(next).or_insert(0) += 1;
        }
    }

    if tally.is_empty() {
        return Vec::new();
    }

    let mut decorated: Vec<(u64, ClusterId)> =
        tally.into_iter().map(|(id, count)| (count, id)).collect();
    decorated.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    decorated.truncate(top_n);
    decorated.into_iter().map(|(_, id)| id).collect()
}
