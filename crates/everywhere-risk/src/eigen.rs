//! Eigendecomposition of symmetric matrices
//!
//! Cyclic Jacobi rotations: every sweep zeroes each off-diagonal pair once and
//! accumulates the rotations into the eigenvector matrix. The loop stops when
//! the off-diagonal Frobenius norm drops below `tolerance` or after
//! `max_sweeps` sweeps.

use ndarray::{Array1, Array2};
use thiserror::Error;

/// Eigendecomposition errors
#[derive(Debug, Error)]
pub enum EigenError {
    /// Input is not square
    #[error("Matrix must be square, got {rows}x{cols}")]
    NotSquare {
        /// Row count
        rows: usize,
        /// Column count
        cols: usize,
    },

    /// Input holds NaN or infinite entries
    #[error("Matrix contains non-finite entries")]
    NonFinite,
}

/// Eigenvalues with their eigenvectors
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    /// Eigenvalues (sorted in descending order)
    pub eigenvalues: Array1<f64>,
    /// Eigenvectors (columns are eigenvectors)
    pub eigenvectors: Array2<f64>,
}

/// Decompose a symmetric matrix.
pub fn symmetric_eigen(
    matrix: &Array2<f64>,
    max_sweeps: usize,
    tolerance: f64,
) -> Result<EigenDecomposition, EigenError> {
    let (n, m) = matrix.dim();
    if n != m {
        return Err(EigenError::NotSquare { rows: n, cols: m });
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(EigenError::NonFinite);
    }

    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(n);

    for _ in 0..max_sweeps {
        if off_diagonal_norm(&a) < tolerance {
            break;
        }
        for p in 0..n {
            for q in (p + 1)..n {
                rotate(&mut a, &mut v, p, q);
            }
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| a[[j, j]].total_cmp(&a[[i, i]]));

    let eigenvalues = order.iter().map(|&i| a[[i, i]]).collect();
    let mut eigenvectors = Array2::<f64>::zeros((n, n));
    for (dst, &src) in order.iter().enumerate() {
        eigenvectors.column_mut(dst).assign(&v.column(src));
    }

    Ok(EigenDecomposition {
        eigenvalues,
        eigenvectors,
    })
}

fn off_diagonal_norm(a: &Array2<f64>) -> f64 {
    a.indexed_iter()
        .filter(|((i, j), _)| i != j)
        .map(|(_, x)| x * x)
        .sum::<f64>()
        .sqrt()
}

/// Zero `a[p][q]` with one rotation and fold it into `v`.
fn rotate(a: &mut Array2<f64>, v: &mut Array2<f64>, p: usize, q: usize) {
    let apq = a[[p, q]];
    if apq.abs() < f64::MIN_POSITIVE {
        return;
    }
    let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
    let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
    let c = 1.0 / (t * t + 1.0).sqrt();
    let s = t * c;

    let n = a.nrows();
    a[[p, p]] -= t * apq;
    a[[q, q]] += t * apq;
    a[[p, q]] = 0.0;
    a[[q, p]] = 0.0;

    for r in 0..n {
        if r != p && r != q {
            let arp = a[[r, p]];
            let arq = a[[r, q]];
            a[[r, p]] = c * arp - s * arq;
            a[[p, r]] = a[[r, p]];
            a[[r, q]] = s * arp + c * arq;
            a[[q, r]] = a[[r, q]];
        }
    }

    for r in 0..n {
        let vrp = v[[r, p]];
        let vrq = v[[r, q]];
        v[[r, p]] = c * vrp - s * vrq;
        v[[r, q]] = s * vrp + c * vrq;
    }
}
