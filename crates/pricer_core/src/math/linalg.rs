//! Dense linear algebra for regression and covariance factorisation.
//!
//! Two routines sit under the Monte Carlo core:
//!
//! - [`least_squares`] solves the continuation-value regression of the
//!   Longstaff-Schwartz engine through a truncated SVD, so collinear basis
//!   functions degrade gracefully to a minimum-norm solution instead of
//!   blowing up a normal-equations solve.
//! - [`rank_reduced_sqrt`] produces the pseudo-square-root `A` with
//!   `A A^T ≈ C` used by the market-model drift calculator and evolver,
//!   keeping only the leading principal components and renormalising rows so
//!   the diagonal of `C` is reproduced exactly.

use nalgebra::{DMatrix, DVector, SymmetricEigen};
use thiserror::Error;

/// Errors from linear algebra routines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinalgError {
    /// Matrix is not square.
    #[error("Matrix is not square: {rows}x{cols}")]
    NotSquare {
        /// Number of rows
        rows: usize,
        /// Number of columns
        cols: usize,
    },

    /// Operand dimensions do not line up.
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        got: usize,
    },

    /// Matrix has a materially negative eigenvalue.
    #[error("Matrix is not positive semi-definite: eigenvalue {eigenvalue}")]
    NotPositiveSemiDefinite {
        /// Offending eigenvalue
        eigenvalue: f64,
    },

    /// Requested rank or retained fraction is unusable.
    #[error("Invalid rank reduction: {0}")]
    InvalidRank(String),

    /// Decomposition failed inside nalgebra.
    #[error("Decomposition failed: {0}")]
    Decomposition(String),
}

/// Minimum-norm least-squares solution of `design * beta ≈ rhs`.
///
/// Singular values below `max(rows, cols) * eps * sigma_max` are treated as
/// zero.
///
/// # Example
///
/// ```
/// use nalgebra::{DMatrix, DVector};
/// use pricer_core::math::least_squares;
///
/// // y = 1 + 2x sampled exactly
/// let x = [0.0, 1.0, 2.0, 3.0];
/// let design = DMatrix::from_fn(4, 2, |i, j| if j == 0 { 1.0 } else { x[i] });
/// let rhs = DVector::from_iterator(4, x.iter().map(|v| 1.0 + 2.0 * v));
///
/// let beta = least_squares(&design, &rhs).unwrap();
/// assert!((beta[0] - 1.0).abs() < 1e-12);
/// assert!((beta[1] - 2.0).abs() < 1e-12);
/// ```
pub fn least_squares(design: &DMatrix<f64>, rhs: &DVector<f64>) -> Result<DVector<f64>, LinalgError> {
    if design.nrows() != rhs.len() {
        return Err(LinalgError::DimensionMismatch {
            expected: design.nrows(),
            got: rhs.len(),
        });
    }
    let svd = design.clone().svd(true, true);
    let sigma_max = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
    let eps = design.nrows().max(design.ncols()) as f64 * f64::EPSILON * sigma_max;
    svd.solve(rhs, eps)
        .map_err(|e| LinalgError::Decomposition(e.to_string()))
}

/// Full-rank pseudo-square-root of a symmetric positive semi-definite matrix.
pub fn pseudo_sqrt(matrix: &DMatrix<f64>) -> Result<DMatrix<f64>, LinalgError> {
    rank_reduced_sqrt(matrix, matrix.nrows(), 1.0)
}

/// Rank-reduced pseudo-square-root via principal components.
///
/// Keeps the fewest leading eigen-components whose eigenvalues explain at
/// least `retained` of the trace, capped at `max_rank`, then rescales each
/// row so that `(A A^T)_ii == C_ii`.
///
/// Returns an `n x k` matrix, `k <= max_rank`.
///
/// # Example
///
/// ```
/// use nalgebra::DMatrix;
/// use pricer_core::math::rank_reduced_sqrt;
///
/// let c = DMatrix::from_row_slice(2, 2, &[1.0, 0.9, 0.9, 1.0]);
/// let a = rank_reduced_sqrt(&c, 1, 1.0).unwrap();
/// assert_eq!(a.ncols(), 1);
///
/// // Diagonal survives the reduction
/// let rebuilt = &a * a.transpose();
/// assert!((rebuilt[(0, 0)] - 1.0).abs() < 1e-12);
/// assert!((rebuilt[(1, 1)] - 1.0).abs() < 1e-12);
/// ```
pub fn rank_reduced_sqrt(
    matrix: &DMatrix<f64>,
    max_rank: usize,
    retained: f64,
) -> Result<DMatrix<f64>, LinalgError> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(LinalgError::NotSquare {
            rows: n,
            cols: matrix.ncols(),
        });
    }
    if max_rank == 0 || max_rank > n {
        return Err(LinalgError::InvalidRank(format!(
            "rank {max_rank} outside 1..={n}"
        )));
    }
    if !(retained > 0.0 && retained <= 1.0) {
        return Err(LinalgError::InvalidRank(format!(
            "retained fraction {retained} outside (0, 1]"
        )));
    }

    let symmetric = 0.5 * (matrix + matrix.transpose());
    let eig = SymmetricEigen::new(symmetric);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| eig.eigenvalues[b].total_cmp(&eig.eigenvalues[a]));

    let largest = eig.eigenvalues[order[0]].max(0.0);
    let tolerance = 1e-12 * largest.max(1.0);
    let mut total = 0.0;
    for &j in &order {
        let lambda = eig.eigenvalues[j];
        if lambda < -tolerance {
            return Err(LinalgError::NotPositiveSemiDefinite { eigenvalue: lambda });
        }
        total += lambda.max(0.0);
    }
    if total <= 0.0 {
        return Ok(DMatrix::zeros(n, max_rank.min(1)));
    }

    let mut rank = 0;
    let mut explained = 0.0;
    while rank < max_rank {
        explained += eig.eigenvalues[order[rank]].max(0.0);
        rank += 1;
        if explained >= retained * total * (1.0 - 1e-12) {
            break;
        }
    }

    let mut root = DMatrix::zeros(n, rank);
    for (col, &j) in order.iter().take(rank).enumerate() {
        let scale = eig.eigenvalues[j].max(0.0).sqrt();
        for i in 0..n {
            root[(i, col)] = eig.eigenvectors[(i, j)] * scale;
        }
    }

    for i in 0..n {
        let norm2: f64 = root.row(i).iter().map(|x| x * x).sum();
        let target = matrix[(i, i)];
        if norm2 > 0.0 && target > 0.0 {
            let factor = (target / norm2).sqrt();
            for col in 0..rank {
                root[(i, col)] *= factor;
            }
        }
    }

    Ok(root)
}
