//! TR-BDF2: a trapezoidal stage to `t + γh` followed by a BDF2 stage to
//! `t + h`, written as a singly diagonal implicit Runge–Kutta method with
//! the Hosea–Shampine embedded error estimate.

use mc_core::{Real, weighted_rms};
use nalgebra::{DMatrix, DVector};

use super::{OdeOptions, OdeStats, OdeSystem, Trial, error_scale, eval_rhs};
use crate::error::{SolverError, SolverResult};
use crate::jacobian::{banded_jacobian, finite_difference_jacobian};
use crate::newton::{iteration_matrix, simplified_newton};

const SQRT2: Real = std::f64::consts::SQRT_2;
/// Intermediate stage position `2 − √2`.
const GAMMA: Real = 2.0 - SQRT2;
/// Diagonal coefficient `γ/2`.
const D: Real = GAMMA / 2.0;
/// Off-diagonal weight `√2/4` of the BDF2 stage.
const W: Real = SQRT2 / 4.0;

// b − b̂ with b̂ = [(1−w)/3, (3w+1)/3, d/3].
const E1: Real = (4.0 * W - 1.0) / 3.0;
const E2: Real = -1.0 / 3.0;
const E3: Real = 2.0 * D / 3.0;

const FD_EPSILON: Real = 1.5e-8;

pub(super) struct TrBdf2 {
    bandwidth: Option<(usize, usize)>,
    jacobian: Option<DMatrix<Real>>,
}

impl TrBdf2 {
    pub const ERROR_EXPONENT: Real = 1.0 / 3.0;
    pub const MAX_GROWTH: Real = 5.0;

    pub fn new(bandwidth: Option<(usize, usize)>) -> Self {
        Self {
            bandwidth,
            jacobian: None,
        }
    }

    fn refresh_jacobian<S: OdeSystem + ?Sized>(
        &mut self,
        system: &mut S,
        t: Real,
        y: &DVector<Real>,
        f0: &DVector<Real>,
        stats: &mut OdeStats,
    ) -> SolverResult<()> {
        let f = |z: &DVector<Real>| eval_rhs(system, t, z, stats);
        let jac = match self.bandwidth {
            Some((lower, upper)) => banded_jacobian(y, f0, f, FD_EPSILON, lower, upper)?,
            None => finite_difference_jacobian(y, f0, f, FD_EPSILON)?,
        };
        stats.jacobian_evals += 1;
        self.jacobian = Some(jac);
        Ok(())
    }

    /// Solve both implicit stages with the current Jacobian. `None` when a
    /// Newton iteration fails to converge.
    #[allow(clippy::too_many_arguments)]
    fn stages<S: OdeSystem + ?Sized>(
        &self,
        system: &mut S,
        t: Real,
        y: &DVector<Real>,
        f0: &DVector<Real>,
        h: Real,
        options: &OdeOptions,
        stats: &mut OdeStats,
    ) -> SolverResult<Option<(DVector<Real>, DVector<Real>)>> {
        let jac = self.jacobian.as_ref().ok_or(SolverError::Numeric {
            what: "TR-BDF2 Jacobian missing".to_string(),
        })?;
        let lu = iteration_matrix(jac, D * h);
        let scale = error_scale(y, y, options);

        // Trapezoidal stage: z = y + d·h·(f0 + f(t + γh, z)).
        let t_g = t + GAMMA * h;
        let base = y + f0 * (D * h);
        let guess = y + f0 * (GAMMA * h);
        let stage1 = simplified_newton(
            guess,
            |z: &DVector<Real>| {
                let fz = eval_rhs(system, t_g, z, stats)?;
                Ok(z - &base - fz * (D * h))
            },
            &lu,
            &scale,
            &options.newton,
        );
        let z_g = match stage1 {
            Ok(result) => result.x,
            Err(SolverError::ConvergenceFailed { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        let f_g = eval_rhs(system, t_g, &z_g, stats)?;

        // BDF2 stage: y1 = y + h·(w·f0 + w·f_g + d·f(t + h, y1)).
        let t_1 = t + h;
        let base = y + (f0 + &f_g) * (W * h);
        let guess = &base + &f_g * (D * h);
        let stage2 = simplified_newton(
            guess,
            |z: &DVector<Real>| {
                let fz = eval_rhs(system, t_1, z, stats)?;
                Ok(z - &base - fz * (D * h))
            },
            &lu,
            &scale,
            &options.newton,
        );
        match stage2 {
            Ok(result) => Ok(Some((f_g, result.x))),
            Err(SolverError::ConvergenceFailed { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn attempt<S: OdeSystem + ?Sized>(
        &mut self,
        system: &mut S,
        t: Real,
        y: &DVector<Real>,
        f0: &DVector<Real>,
        h: Real,
        options: &OdeOptions,
        stats: &mut OdeStats,
    ) -> SolverResult<Option<Trial>> {
        let mut fresh = false;
        if self.jacobian.is_none() {
            self.refresh_jacobian(system, t, y, f0, stats)?;
            fresh = true;
        }

        let mut solved = self.stages(system, t, y, f0, h, options, stats)?;
        if solved.is_none() && !fresh {
            // Stale Jacobian: rebuild it before giving up on this step size.
            self.refresh_jacobian(system, t, y, f0, stats)?;
            solved = self.stages(system, t, y, f0, h, options, stats)?;
        }
        let Some((f_g, y_new)) = solved else {
            return Ok(None);
        };

        let f_new = eval_rhs(system, t + h, &y_new, stats)?;
        let est = (f0 * E1 + &f_g * E2 + &f_new * E3) * h;
        let scale = error_scale(y, &y_new, options);
        let err = weighted_rms(est.as_slice(), &scale);
        if !err.is_finite() {
            return Ok(None);
        }

        Ok(Some(Trial {
            y_new,
            f_new,
            err,
            stiff: false,
        }))
    }
}
