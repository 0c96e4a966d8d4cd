//! Dense linear solves for small, possibly rank-deficient systems.

use crate::error::{SolverError, SolverResult};
use nalgebra::{DMatrix, DVector};

/// Solve `a * x = b` through an SVD, discarding singular values below
/// `rel_cutoff * sigma_max`.
///
/// Directions the matrix cannot resolve get a zero component, which is the
/// minimum-norm solution. Useful when trace species make a Jacobian
/// numerically singular.
pub fn solve_truncated(
    a: DMatrix<f64>,
    b: &DVector<f64>,
    rel_cutoff: f64,
) -> SolverResult<DVector<f64>> {
    if a.nrows() != b.len() {
        return Err(SolverError::InvalidArg {
            what: "matrix and right-hand side dimensions differ",
        });
    }
    if a.iter().any(|v| !v.is_finite()) || b.iter().any(|v| !v.is_finite()) {
        return Err(SolverError::NonFinite {
            what: "linear system entries",
        });
    }

    let svd = a.svd(true, true);
    let sigma_max = svd.singular_values.max();
    if sigma_max <= 0.0 {
        return Err(SolverError::Numeric {
            what: "linear system matrix is zero".to_string(),
        });
    }

    svd.solve(b, rel_cutoff * sigma_max)
        .map_err(|e| SolverError::Numeric {
            what: e.to_string(),
        })
}
