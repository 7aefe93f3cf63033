//! Dense linear algebra: a square matrix type and Gaussian elimination.

use crate::error::{NodalError, Result};

use super::PIVOT_EPSILON;

/// Square matrix stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    size: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a zero matrix of the given dimension.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            data: vec![0.0; size * size],
        }
    }

    /// Build a matrix from rows. All rows must have `rows.len()` entries.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let size = rows.len();
        let mut m = Self::new(size);
        for (i, row) in rows.iter().enumerate() {
            check_len(size, row.len())?;
            m.data[i * size..(i + 1) * size].copy_from_slice(row);
        }
        Ok(m)
    }

    /// Matrix dimension.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Set every element to zero without reallocating.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Get matrix element at (row, col).
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.size + col]
    }

    /// Set matrix element at (row, col).
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.size + col] = value;
    }

    /// Add to matrix element at (row, col).
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.size + col] += value;
    }

    /// Borrow one row.
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.size..(row + 1) * self.size]
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let n = self.size;
        let (lo, hi) = (a.min(b), a.max(b));
        let (head, tail) = self.data.split_at_mut(hi * n);
        head[lo * n..(lo + 1) * n].swap_with_slice(&mut tail[..n]);
    }
}

fn check_len(expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(NodalError::DimensionMismatch { expected, found })
    }
}

/// Multiply a matrix by a vector.
pub fn mat_multiply_vec(a: &Matrix, x: &[f64]) -> Result<Vec<f64>> {
    check_len(a.size(), x.len())?;
    Ok((0..a.size())
        .map(|i| a.row(i).iter().zip(x).map(|(aij, xj)| aij * xj).sum())
        .collect())
}

/// Solve `A·x = b` in place by Gaussian elimination with partial pivoting.
///
/// On success `b` holds the solution. `a` is destroyed. A pivot whose
/// magnitude falls below [`PIVOT_EPSILON`] aborts with
/// [`NodalError::SingularMatrix`] naming the offending column.
pub fn solve(a: &mut Matrix, b: &mut [f64]) -> Result<()> {
    let n = a.size();
    check_len(n, b.len())?;

    for k in 0..n {
        // Find pivot
        let mut max_val = a.get(k, k).abs();
        let mut max_row = k;
        for i in (k + 1)..n {
            let val = a.get(i, k).abs();
            if val > max_val {
                max_val = val;
                max_row = i;
            }
        }

        if max_val < PIVOT_EPSILON {
            return Err(NodalError::SingularMatrix { column: k });
        }

        // Swap rows if needed
        if max_row != k {
            a.swap_rows(k, max_row);
            b.swap(k, max_row);
        }

        // Eliminate below the pivot
        let pivot = a.get(k, k);
        for i in (k + 1)..n {
            let factor = a.get(i, k) / pivot;
            if factor == 0.0 {
                continue;
            }
            a.set(i, k, 0.0);
            for j in (k + 1)..n {
                let akj = a.get(k, j);
                a.add(i, j, -factor * akj);
            }
            b[i] -= factor * b[k];
        }
    }

    // Back substitution
    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum -= a.get(i, j) * b[j];
        }
        b[i] = sum / a.get(i, i);
    }

    Ok(())
}
