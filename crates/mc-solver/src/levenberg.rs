//! Derivative-free Levenberg–Marquardt nonlinear least squares.
//!
//! The Jacobian is approximated by forward differences and the normal
//! equations are damped with Marquardt scaling (`λ·diag(JᵀJ)`).
//! Termination follows MINPACK: `ftol` bounds the relative reduction of the
//! sum of squares, `xtol` the relative step length.

use crate::error::{SolverError, SolverResult};
use crate::jacobian::finite_difference_jacobian;
use nalgebra::{DMatrix, DVector};

const FD_EPSILON: f64 = 1.0e-8;
const LAMBDA_INIT: f64 = 1.0e-3;
const LAMBDA_MAX: f64 = 1.0e16;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LmConfig {
    /// Relative reduction of the sum of squares below which iteration stops
    pub ftol: f64,
    /// Relative step length below which iteration stops
    pub xtol: f64,
    /// Budget of residual evaluations (Jacobian columns included)
    pub max_evaluations: usize,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            ftol: 1e-5,
            xtol: 1e-15,
            max_evaluations: 200,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LmResult {
    pub x: DVector<f64>,
    /// Half the squared residual norm at `x`
    pub cost: f64,
    pub evaluations: usize,
    /// False when the evaluation budget ran out first.
    pub converged: bool,
}

/// Minimize `½‖residual(x)‖²` starting from `x0`.
pub fn levenberg_marquardt<F>(
    x0: DVector<f64>,
    mut residual_fn: F,
    config: &LmConfig,
) -> SolverResult<LmResult>
where
    F: FnMut(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let n = x0.len();
    let mut evaluations = 0usize;
    let mut eval = |x: &DVector<f64>, count: &mut usize| -> SolverResult<DVector<f64>> {
        *count += 1;
        residual_fn(x)
    };

    let mut x = x0;
    let mut r = eval(&x, &mut evaluations)?;
    if r.iter().any(|v| !v.is_finite()) {
        return Err(SolverError::Numeric {
            what: "non-finite residual at initial guess".to_string(),
        });
    }
    let mut cost = 0.5 * r.norm_squared();
    let mut lambda = LAMBDA_INIT;

    let finish = |x, cost, evaluations, converged| {
        Ok(LmResult {
            x,
            cost,
            evaluations,
            converged,
        })
    };

    if n == 0 || cost == 0.0 {
        return finish(x, cost, evaluations, true);
    }

    while evaluations + n < config.max_evaluations {
        let jac = finite_difference_jacobian(
            &x,
            &r,
            |y: &DVector<f64>| eval(y, &mut evaluations),
            FD_EPSILON,
        )?;
        let jtj = jac.transpose() * &jac;
        let gradient = jac.transpose() * &r;

        loop {
            let mut damped: DMatrix<f64> = jtj.clone();
            for i in 0..n {
                damped[(i, i)] += lambda * jtj[(i, i)].max(1e-12);
            }
            let step = damped
                .lu()
                .solve(&(-&gradient))
                .ok_or_else(|| SolverError::Numeric {
                    what: "damped normal equations are singular".to_string(),
                })?;

            let step_small = step.norm() <= config.xtol * (x.norm() + config.xtol);
            let x_new = &x + &step;
            let r_new = eval(&x_new, &mut evaluations)?;
            let cost_new = 0.5 * r_new.norm_squared();

            if cost_new.is_finite() && cost_new < cost {
                let reduction = (cost - cost_new) / cost;
                x = x_new;
                r = r_new;
                cost = cost_new;
                lambda = (lambda * 0.3).max(1e-12);
                if reduction <= config.ftol || step_small || cost == 0.0 {
                    return finish(x, cost, evaluations, true);
                }
                break;
            }

            if step_small {
                return finish(x, cost, evaluations, true);
            }
            lambda *= 10.0;
            if lambda > LAMBDA_MAX {
                // No descent direction left at this resolution.
                return finish(x, cost, evaluations, true);
            }
            if evaluations >= config.max_evaluations {
                return finish(x, cost, evaluations, false);
            }
        }
    }

    tracing::debug!(evaluations, cost, "Levenberg-Marquardt evaluation budget exhausted");
    finish(x, cost, evaluations, false)
}
