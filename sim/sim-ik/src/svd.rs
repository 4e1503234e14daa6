//! Truncated SVD least-squares solve.
//!
//! For `J = U·Σ·Vᵀ` the solution is
//!
//! ```text
//! x = V · Σ⁺ · Uᵀ · b,    σᵢ⁺ = 1/σᵢ if σᵢ > ε, else 0
//! ```
//!
//! Directions whose singular value falls at or below `ε` are dropped instead
//! of inverted, which keeps the velocities bounded near a singularity at the
//! cost of not tracking the twist along those directions.

use nalgebra::{DMatrix, DVector, SVD};

use crate::{IkError, Result};

/// Output of [`solve_truncated`].
#[derive(Debug, Clone, PartialEq)]
pub struct TruncatedSolution {
    /// Least-squares solution, one entry per column of the matrix.
    pub solution: DVector<f64>,
    /// Singular values in descending order.
    pub singular_values: DVector<f64>,
    /// How many singular values were at or below the threshold.
    pub truncated: usize,
    /// Smallest singular value that was inverted.
    pub smallest_retained: Option<f64>,
}

impl TruncatedSolution {
    /// Whether any direction was dropped.
    #[must_use]
    pub fn is_near_singular(&self) -> bool {
        self.truncated > 0
    }
}

/// Solve `matrix · x ≈ rhs` with a truncated pseudo-inverse.
///
/// # Errors
///
/// - [`IkError::DimensionMismatch`] if `rhs` does not match the row count.
/// - [`IkError::NonFinite`] if `matrix` or `rhs` holds NaN or infinity.
/// - [`IkError::IterationLimitExceeded`] if the SVD needs more than
///   `max_iterations` sweeps.
pub fn solve_truncated(
    matrix: &DMatrix<f64>,
    rhs: &DVector<f64>,
    epsilon: f64,
    max_iterations: usize,
) -> Result<TruncatedSolution> {
    if rhs.len() != matrix.nrows() {
        return Err(IkError::dimension("right-hand side", matrix.nrows(), rhs.len()));
    }
    // nalgebra panics while sorting NaN singular values
    if !matrix.iter().all(|x| x.is_finite()) {
        return Err(IkError::non_finite("matrix"));
    }
    if !rhs.iter().all(|x| x.is_finite()) {
        return Err(IkError::non_finite("right-hand side"));
    }

    if matrix.ncols() == 0 || matrix.nrows() == 0 {
        return Ok(TruncatedSolution {
            solution: DVector::zeros(matrix.ncols()),
            singular_values: DVector::zeros(0),
            truncated: 0,
            smallest_retained: None,
        });
    }

    let Some(svd) = SVD::try_new(matrix.clone(), true, true, f64::EPSILON, max_iterations)
    else {
        tracing::warn!(
            rows = matrix.nrows(),
            cols = matrix.ncols(),
            max_iterations,
            "SVD did not converge"
        );
        return Err(IkError::IterationLimitExceeded { max_iterations });
    };

    let (Some(u), Some(v_t)) = (svd.u.as_ref(), svd.v_t.as_ref()) else {
        return Err(IkError::decomposition("SVD returned no singular vectors"));
    };

    // Σ⁺ · Uᵀ · b, one entry per singular value
    let mut projected = u.transpose() * rhs;
    let mut truncated = 0;
    let mut smallest_retained: Option<f64> = None;
    for (i, &sigma) in svd.singular_values.iter().enumerate() {
        if sigma > epsilon {
            projected[i] /= sigma;
            smallest_retained = Some(smallest_retained.map_or(sigma, |s| s.min(sigma)));
        } else {
            projected[i] = 0.0;
            truncated += 1;
        }
    }

    let solution = v_t.transpose() * projected;

    Ok(TruncatedSolution {
        solution,
        singular_values: svd.singular_values,
        truncated,
        smallest_retained,
    })
}
