//! Simplified Newton iteration for implicit stage equations.
//!
//! The iteration matrix is factored once by the caller and reused for every
//! iterate, so convergence is linear rather than quadratic; divergence is
//! detected from the contraction rate of successive updates.

use crate::error::{SolverError, SolverResult};
use mc_core::weighted_rms;
use nalgebra::{DMatrix, DVector, Dyn, LU};

/// Newton solver configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Convergence threshold on the scaled update norm
    pub tol: f64,
    /// Contraction rate above which the iteration is declared divergent
    pub max_rate: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            tol: 1e-2,
            max_rate: 0.9,
        }
    }
}

/// Newton iteration result.
#[derive(Debug, Clone)]
pub struct NewtonResult {
    /// Solution vector
    pub x: DVector<f64>,
    /// Scaled norm of the last update
    pub update_norm: f64,
    /// Number of iterations
    pub iterations: usize,
}

/// Solve `residual(x) = 0` with a fixed, pre-factored iteration matrix.
///
/// `scale` holds the per-component error weights (`atol + rtol·|y|`) used to
/// measure update norms.
pub fn simplified_newton<F>(
    x0: DVector<f64>,
    mut residual_fn: F,
    lu: &LU<f64, Dyn, Dyn>,
    scale: &[f64],
    config: &NewtonConfig,
) -> SolverResult<NewtonResult>
where
    F: FnMut(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let mut x = x0;
    let mut previous_norm: Option<f64> = None;

    for iter in 0..config.max_iterations {
        let r = residual_fn(&x)?;
        let dx = lu.solve(&(-r)).ok_or_else(|| SolverError::Numeric {
            what: "iteration matrix is singular".to_string(),
        })?;
        if dx.iter().any(|v| !v.is_finite()) {
            return Err(SolverError::ConvergenceFailed {
                what: "non-finite Newton update".to_string(),
            });
        }
        x += &dx;

        let norm = weighted_rms(dx.as_slice(), scale);
        if norm <= config.tol {
            return Ok(NewtonResult {
                x,
                update_norm: norm,
                iterations: iter + 1,
            });
        }
        if let Some(prev) = previous_norm {
            let rate = norm / prev;
            if rate >= config.max_rate {
                return Err(SolverError::ConvergenceFailed {
                    what: format!("Newton diverging at iteration {iter} (rate {rate:.3})"),
                });
            }
        }
        previous_norm = Some(norm);
    }

    Err(SolverError::ConvergenceFailed {
        what: format!("Maximum iterations {} reached", config.max_iterations),
    })
}

/// Factor `I - c·J`.
pub fn iteration_matrix(jac: &DMatrix<f64>, c: f64) -> LU<f64, Dyn, Dyn> {
    let n = jac.nrows();
    let m = DMatrix::identity(n, n) - jac * c;
    m.lu()
}
