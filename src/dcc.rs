//! Distance cache (`spec.md` §4.3): a symmetric anchor-to-anchor distance
//! matrix, lazily filled, with a presence bitmap distinguishing "not yet
//! computed" from a genuine `0.0`.

use crate::cluster::ClusterId;
use crate::distance::euclidean;
use crate::frame::Frame;

/// Flat `N × N` symmetric matrix. `present[i * n + j]` mirrors
/// `present[j * n + i]`; both halves are written together so lookups never
/// need to sort the pair first.
///
/// `N` starts at `maxcl` (the steady-state size, sized once up front per
/// the no-per-frame-allocation resource policy) but grows beyond it under
/// the `discard` overflow strategy, which keeps minting new cluster ids
/// even while the *active* count stays under `maxcl` (`spec.md` §4.6:
/// "freed ids remain unused, N_cl monotone as an index set").
pub struct DistanceCache {
    n: usize,
    values: Vec<f64>,
    present: Vec<bool>,
}

impl DistanceCache {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            values: vec![0.0; n * n],
            present: vec![false; n * n],
        }
    }

    /// Grow the matrix to at least `n x n`, preserving existing entries.
    pub fn grow_to(&mut self, n: usize) {
        if n <= self.n {
            return;
        }
        let mut values = vec![0.0; n * n];
        let mut present = vec![false; n * n];
        for i in 0..self.n {
            for j in 0..self.n {
                let old = i * self.n + j;
                let new = i * n + j;
                values[new] = self.values[old];
                present[new] = self.present[old];
            }
        }
        self.values = values;
        self.present = present;
        self.n = n;
    }

    fn index(&self, i: usize, j: usize) -> usize {
        i * self.n + j
    }

    /// `c(i, j)`, computing and caching it on miss via `anchors(i)`/`anchors(j)`.
    /// `i == j` always returns `0.0` without touching the cache.
    pub fn get(&mut self, i: ClusterId, j: ClusterId, anchor_i: &Frame, anchor_j: &Frame) -> f64 {
        if i == j {
            return 0.0;
        }
        if let Some(d) = self.peek(i, j) {
            return d;
        }
        let d = euclidean(&anchor_i.data, &anchor_j.data);
        self.set(i, j, d);
        d
    }

    /// Read without computing; `None` on a cache miss.
    pub fn peek(&self, i: ClusterId, j: ClusterId) -> Option<f64> {
        if i == j {
            return Some(0.0);
        }
        let idx = self.index(i.0, j.0);
        self.present[idx].then(|| self.values[idx])
    }

    /// Store `c(i, j) = c(j, i) = d` directly, used when a new cluster's
    /// row is populated in bulk against every existing anchor (§4.3's
    /// "inserting cluster k fills c(k,·) in advance").
    pub fn set(&mut self, i: ClusterId, j: ClusterId, d: f64) {
        if i == j {
            return;
        }
        let idx = self.index(i.0, j.0);
        let sym = self.index(j.0, i.0);
        self.values[idx] = d;
        self.values[sym] = d;
        self.present[idx] = true;
        self.present[sym] = true;
    }

    pub fn capacity(&self) -> usize {
        self.n
    }
}
