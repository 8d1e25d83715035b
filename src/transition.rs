//! Transition matrix (`spec.md` §3, §4.1 step 3/9): counts of consecutive
//! assignment pairs, used as an auxiliary prior for score mixing.

use crate::cluster::ClusterId;

/// Dense square matrix of `t(i, j)` counts, grown by reallocation as the
/// cluster store grows (mirrors the store's own grow-only discipline).
#[derive(Debug, Default)]
pub struct TransitionMatrix {
    n: usize,
    counts: Vec<u64>,
}

impl TransitionMatrix {
    pub fn new() -> Self {
        Self { n: 0, counts: Vec::new() }
    }

    /// Grow the matrix to at least `n x n`, preserving existing counts.
    pub fn grow_to(&mut self, n: usize) {
        if n <= self.n {
            return;
        }
        let mut next = vec![0u64; n * n];
        for i in 0..self.n {
            for j in 0..self.n {
                next[i * n + j] = self.counts[i * self.n + j];
            }
        }
        self.counts = next;
        self.n = n;
    }

    pub fn increment(&mut self, prev: ClusterId, next: ClusterId) {
        let idx = prev.0 * self.n + next.0;
        self.counts[idx] += 1;
    }

    pub fn get(&self, i: ClusterId, j: ClusterId) -> u64 {
        if i.0 >= self.n || j.0 >= self.n {
            return 0;
        }
        self.counts[i.0 * self.n + j.0]
    }

    /// `tmrow(i) = t(prev, i) / Σⱼ t(prev, j)`; `0.0` if `prev` is `None`
    /// or the row is empty (§4.1 step 3).
    pub fn row_fraction(&self, prev: Option<ClusterId>, i: ClusterId) -> f64 {
        let Some(prev) = prev else { return 0.0 };
        if prev.0 >= self.n {
            return 0.0;
        }
        let row = &self.counts[prev.0 * self.n..prev.0 * self.n + self.n];
        let total: u64 = row.iter().sum();
        if total == 0 {
            return 0.0;
        }
        if i.0 >= self.n {
            return 0.0;
        }
        row[i.0] as f64 / total as f64
    }

    /// Sum cluster `j`'s row and column into cluster `i`'s, for the
    /// `merge` overflow strategy (§4.6).
    pub fn merge_into(&mut self, into: ClusterId, from: ClusterId) {
        if into.0 >= self.n || from.0 >= self.n {
            return;
        }
        for k in 0..self.n {
            let from_row = self.counts[from.0 * self.n + k];
            self.counts[into.0 * self.n + k] += from_row;
            let from_col = self.counts[k * self.n + from.0];
            self.counts[k * self.n + into.0] += from_col;
        }
        for k in 0..self.n {
            self.counts[from.0 * self.n + k] = 0;
            self.counts[k * self.n + from.0] = 0;
        }
    }

    /// Non-zero `(i, j, count)` triples in row-major order, for the
    /// transition-matrix output interface (`spec.md` §6).
    pub fn nonzero(&self) -> impl Iterator<Item = (usize, usize, u64)> + '_ {
        (0..self.n).flat_map(move |i| {
            (0..self.n).filter_map(move |j| {
                let c = self.counts[i * self.n + j];
                (c > 0).then_some((i, j, c))
            })
        })
    }
}
