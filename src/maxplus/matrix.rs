use crate::error::{Error, Result};

use super::{otimes, MPTime, MINUS_INFINITY};

/// A dense max-plus matrix, row-major, `rows x cols`. Square matrices arise
/// from strongly consistent scenarios; rectangular matrices arise from the
/// weakly consistent case where the final-token count differs from the
/// initial-token count.
#[derive(Debug, Clone, PartialEq)]
pub struct MPMatrix {
    rows: usize,
    cols: usize,
    data: Vec<MPTime>,
}

impl MPMatrix {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, r: usize, c: usize) -> MPTime {
        self.data[r * self.cols + c]
    }

    pub fn set(&mut self, r: usize, c: usize, value: MPTime) {
        self.data[r * self.cols + c] = value;
    }

    pub fn zero(n: usize) -> Self {
        Self {
            rows: n,
            cols: n,
            data: vec![0.0; n * n],
        }
    }

    pub fn constant(rows: usize, cols: usize, value: MPTime) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    pub fn bottom(rows: usize, cols: usize) -> Self {
        Self::constant(rows, cols, MINUS_INFINITY)
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::bottom(n, n);
        for i in 0..n {
            m.set(i, i, 0.0);
        }
        m
    }

    /// Pointwise maximum of two equally-shaped matrices.
    pub fn maximum(&self, other: &Self) -> Result<Self> {
        if self.shape() != other.shape() {
            return Err(Error::DimensionMismatch {
                op: "maximum",
                lhs: self.shape(),
                rhs: other.shape(),
            });
        }
        let data = self.data.iter().zip(other.data.iter()).map(|(a, b)| a.max(*b)).collect();
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    /// Max-plus matrix product `self ⊗ other`.
    pub fn mul(&self, other: &Self) -> Result<Self> {
        if self.cols != other.rows {
            return Err(Error::DimensionMismatch {
                op: "mul",
                lhs: self.shape(),
                rhs: other.shape(),
            });
        }
        let mut out = Self::bottom(self.rows, other.cols);
        for r in 0..self.rows {
            for c in 0..other.cols {
                let mut acc = MINUS_INFINITY;
                for k in 0..self.cols {
                    acc = acc.max(otimes(self.get(r, k), other.get(k, c)));
                }
                out.set(r, c, acc);
            }
        }
        Ok(out)
    }

    /// `self ⊗ v` for a column vector `v` of length `self.cols()`.
    pub fn mul_vector(&self, v: &[MPTime]) -> Result<Vec<MPTime>> {
        if v.len() != self.cols {
            return Err(Error::DimensionMismatch {
                op: "mul_vector",
                lhs: self.shape(),
                rhs: (v.len(), 1),
            });
        }
        let mut out = vec![MINUS_INFINITY; self.rows];
        for r in 0..self.rows {
            let mut acc = MINUS_INFINITY;
            for c in 0..self.cols {
                acc = acc.max(otimes(self.get(r, c), v[c]));
            }
            out[r] = acc;
        }
        Ok(out)
    }

    /// Selects a subset of rows and columns, in the order given. Used to
    /// restrict the raw exploration matrix down to the persistent-token
    /// subset.
    pub fn submatrix(&self, rows: &[usize], cols: &[usize]) -> Self {
        let mut out = Self::bottom(rows.len(), cols.len());
        for (i, &r) in rows.iter().enumerate() {
            for (j, &c) in cols.iter().enumerate() {
                out.set(i, j, self.get(r, c));
            }
        }
        out
    }

    /// Maximum Cycle Mean of the weighted directed graph with edge `i -> j`
    /// of weight `self[i][j]` whenever it is greater than −∞. Computed via
    /// Karp's theorem, run once per candidate source so that disconnected
    /// components each contribute their own cycle mean (the classic
    /// single-source formulation only covers cycles reachable from the
    /// chosen source). Returns −∞ if the graph has no cycle at all.
    pub fn mcm(&self) -> MPTime {
        assert_eq!(self.rows, self.cols, "mcm is only defined for square matrices");
        let n = self.rows;
        if n == 0 {
            return MINUS_INFINITY;
        }
        let mut best = MINUS_INFINITY;
        for source in 0..n {
            if let Some(m) = self.karp_from_source(source) {
                best = best.max(m);
            }
        }
        best
    }

    fn karp_from_source(&self, source: usize) -> Option<MPTime> {
        let n = self.rows;
        // d[k][v] = max weight of a walk of exactly k edges from `source` to `v`.
        let mut d = vec![vec![MINUS_INFINITY; n]; n + 1];
        d[0][source] = 0.0;
        for k in 1..=n {
            for v in 0..n {
                let mut best = MINUS_INFINITY;
                for u in 0..n {
                    let w = self.get(u, v);
                    if w == MINUS_INFINITY || d[k - 1][u] == MINUS_INFINITY {
                        continue;
                    }
                    best = best.max(d[k - 1][u] + w);
                }
                d[k][v] = best;
            }
        }
        let mut mcm: Option<MPTime> = None;
        for v in 0..n {
            if d[n][v] == MINUS_INFINITY {
                continue;
            }
            let mut min_ratio: Option<MPTime> = None;
            for k in 0..n {
                if d[k][v] == MINUS_INFINITY {
                    continue;
                }
                let ratio = (d[n][v] - d[k][v]) / (n - k) as MPTime;
                min_ratio = Some(min_ratio.map_or(ratio, |m: MPTime| m.min(ratio)));
            }
            if let Some(r) = min_ratio {
                mcm = Some(mcm.map_or(r, |m: MPTime| m.max(r)));
            }
        }
        mcm
    }
}
