//! Adaptive ODE integration over a list of output times.
//!
//! `integrate` advances `y' = f(t, y)` from `t_eval[0]` and records the state
//! exactly at every entry of `t_eval`: steps are shortened to land on each
//! output time instead of interpolating.

mod rk45;
mod trbdf2;

use mc_core::{Real, weighted_rms};
use nalgebra::DVector;

use crate::error::{SolverError, SolverResult};
use crate::newton::NewtonConfig;

use rk45::DormandPrince;
use trbdf2::TrBdf2;

/// A first-order system `y' = f(t, y)`.
pub trait OdeSystem {
    /// Number of state components.
    fn dim(&self) -> usize;

    /// Compute the state derivative.
    ///
    /// Takes `&mut self` so systems can keep scratch state between calls.
    fn rhs(&mut self, t: Real, y: &DVector<Real>) -> SolverResult<DVector<Real>>;

    /// `(lower, upper)` bandwidth of `∂f/∂y`, when known.
    fn bandwidth(&self) -> Option<(usize, usize)> {
        None
    }
}

/// Integration method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Method {
    /// Explicit Dormand–Prince 5(4).
    Rk45,
    /// Implicit trapezoidal rule / BDF2 composite (L-stable).
    TrBdf2,
    /// Start explicit, switch to `TrBdf2` once stiffness is detected.
    #[default]
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OdeOptions {
    pub method: Method,
    pub atol: Real,
    pub rtol: Real,
    /// Upper bound on the step size (defaults to the whole span).
    pub max_step: Option<Real>,
    /// Initial step; estimated from `f(t0, y0)` when absent.
    pub first_step: Option<Real>,
    /// Attempted steps allowed per call before giving up.
    pub max_steps: usize,
    pub newton: NewtonConfig,
}

impl Default for OdeOptions {
    fn default() -> Self {
        Self {
            method: Method::Auto,
            atol: 1e-6,
            rtol: 1e-6,
            max_step: None,
            first_step: None,
            max_steps: 500_000,
            newton: NewtonConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OdeStats {
    pub rhs_evals: usize,
    pub jacobian_evals: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Time at which `Auto` switched to the implicit method.
    pub switched_at: Option<Real>,
}

#[derive(Debug, Clone)]
pub struct OdeSolution {
    pub t: Vec<Real>,
    pub y: Vec<DVector<Real>>,
    pub stats: OdeStats,
}

/// Accepted stiff-flagged steps before `Auto` switches to the implicit method.
const STIFF_STEPS_TO_SWITCH: usize = 15;
/// Consecutive rejections before `Auto` switches to the implicit method.
const REJECTIONS_TO_SWITCH: usize = 10;
const SAFETY: Real = 0.9;
const MIN_FACTOR: Real = 0.2;

/// Outcome of one trial step.
pub(crate) struct Trial {
    pub y_new: DVector<Real>,
    /// `f(t + h, y_new)`
    pub f_new: DVector<Real>,
    /// Scaled error norm; the step is acceptable when `<= 1`.
    pub err: Real,
    /// Explicit method only: stiffness indicator exceeded its threshold.
    pub stiff: bool,
}

pub(crate) fn eval_rhs<S: OdeSystem + ?Sized>(
    system: &mut S,
    t: Real,
    y: &DVector<Real>,
    stats: &mut OdeStats,
) -> SolverResult<DVector<Real>> {
    stats.rhs_evals += 1;
    system.rhs(t, y)
}

/// Error weights `atol + rtol·max(|a|, |b|)`.
pub(crate) fn error_scale(a: &DVector<Real>, b: &DVector<Real>, options: &OdeOptions) -> Vec<Real> {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| options.atol + options.rtol * x.abs().max(y.abs()))
        .collect()
}

fn is_finite(v: &DVector<Real>) -> bool {
    v.iter().all(|x| x.is_finite())
}

/// Hairer–Wanner starting step: `0.01·‖y0‖/‖f0‖`, bounded by `max_step`.
fn initial_step(y0: &DVector<Real>, f0: &DVector<Real>, options: &OdeOptions, max_step: Real) -> Real {
    let scale = error_scale(y0, y0, options);
    let d0 = weighted_rms(y0.as_slice(), &scale);
    let d1 = weighted_rms(f0.as_slice(), &scale);
    let h = if d0 < 1e-5 || d1 < 1e-5 {
        1e-6
    } else {
        0.01 * d0 / d1
    };
    h.min(max_step)
}

fn step_factor(err: Real, exponent: Real, max_growth: Real) -> Real {
    if err == 0.0 {
        return max_growth;
    }
    (SAFETY * err.powf(-exponent)).clamp(MIN_FACTOR, max_growth)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Explicit,
    Implicit,
}

/// Integrate `system` from `t_eval[0]` and return the state at every entry of
/// `t_eval` (which must be strictly increasing).
pub fn integrate<S: OdeSystem + ?Sized>(
    system: &mut S,
    t_eval: &[Real],
    y0: DVector<Real>,
    options: &OdeOptions,
) -> SolverResult<OdeSolution> {
    let (&t0, rest) = t_eval.split_first().ok_or(SolverError::InvalidArg {
        what: "t_eval must not be empty",
    })?;
    if t_eval.windows(2).any(|w| !(w[1] > w[0])) {
        return Err(SolverError::InvalidArg {
            what: "t_eval must be strictly increasing",
        });
    }
    if y0.len() != system.dim() {
        return Err(SolverError::InvalidArg {
            what: "initial state length does not match system dimension",
        });
    }
    if !(options.atol > 0.0 && options.rtol > 0.0) {
        return Err(SolverError::InvalidArg {
            what: "tolerances must be positive",
        });
    }

    let mut stats = OdeStats::default();
    let mut ts = Vec::with_capacity(t_eval.len());
    let mut ys = Vec::with_capacity(t_eval.len());
    ts.push(t0);
    ys.push(y0.clone());

    if y0.is_empty() {
        for &t in rest {
            ts.push(t);
            ys.push(y0.clone());
        }
        return Ok(OdeSolution { t: ts, y: ys, stats });
    }

    let span = t_eval[t_eval.len() - 1] - t0;
    let max_step = options.max_step.unwrap_or(span).min(span.max(Real::MIN_POSITIVE));
    if !(max_step > 0.0) {
        return Err(SolverError::InvalidArg {
            what: "max_step must be positive",
        });
    }

    let mut t = t0;
    let mut y = y0;
    let mut f = eval_rhs(system, t, &y, &mut stats)?;
    if !is_finite(&f) {
        return Err(SolverError::IntegrationFailed {
            t,
            what: "non-finite derivative at initial state".to_string(),
        });
    }
    let mut h = options
        .first_step
        .unwrap_or_else(|| initial_step(&y, &f, options, max_step))
        .min(max_step);

    let mut mode = match options.method {
        Method::TrBdf2 => Mode::Implicit,
        Method::Rk45 | Method::Auto => Mode::Explicit,
    };
    let mut explicit = DormandPrince;
    let mut implicit = TrBdf2::new(system.bandwidth());
    let mut stiff_steps = 0usize;
    let mut rejections = 0usize;

    for &target in rest {
        while t < target {
            let remaining = target - t;
            let min_step = 1e-12 * t.abs().max(1.0);
            if h < min_step {
                return Err(SolverError::StepTooSmall { t, h });
            }
            if stats.accepted + stats.rejected >= options.max_steps {
                return Err(SolverError::IntegrationFailed {
                    t,
                    what: format!("step budget of {} exhausted", options.max_steps),
                });
            }
            let landing = h >= remaining - min_step;
            let h_try = if landing { remaining } else { h };

            let (trial, exponent, max_growth) = match mode {
                Mode::Explicit => (
                    explicit.attempt(system, t, &y, &f, h_try, options, &mut stats)?,
                    DormandPrince::ERROR_EXPONENT,
                    DormandPrince::MAX_GROWTH,
                ),
                Mode::Implicit => (
                    implicit.attempt(system, t, &y, &f, h_try, options, &mut stats)?,
                    TrBdf2::ERROR_EXPONENT,
                    TrBdf2::MAX_GROWTH,
                ),
            };

            match trial {
                Some(trial)
                    if trial.err <= 1.0 && is_finite(&trial.y_new) && is_finite(&trial.f_new) =>
                {
                    t = if landing { target } else { t + h_try };
                    y = trial.y_new;
                    f = trial.f_new;
                    stats.accepted += 1;
                    rejections = 0;

                    let factor = step_factor(trial.err, exponent, max_growth);
                    let next = if landing && factor >= 1.0 {
                        h.max(h_try * factor)
                    } else {
                        h_try * factor
                    };
                    h = next.min(max_step);

                    if options.method == Method::Auto && mode == Mode::Explicit {
                        stiff_steps = if trial.stiff { stiff_steps + 1 } else { 0 };
                        if stiff_steps >= STIFF_STEPS_TO_SWITCH {
                            mode = Mode::Implicit;
                            stats.switched_at = Some(t);
                            tracing::debug!(t, "stiffness detected, switching to TR-BDF2");
                        }
                    }
                }
                other => {
                    stats.rejected += 1;
                    rejections += 1;
                    let factor = match other {
                        Some(trial) if trial.err.is_finite() => {
                            step_factor(trial.err, exponent, 1.0)
                        }
                        _ => 0.5,
                    };
                    h = h_try * factor.min(0.9);

                    if options.method == Method::Auto
                        && mode == Mode::Explicit
                        && rejections >= REJECTIONS_TO_SWITCH
                    {
                        mode = Mode::Implicit;
                        stats.switched_at = Some(t);
                        tracing::debug!(t, rejections, "repeated rejections, switching to TR-BDF2");
                    }
                }
            }
        }
        ts.push(target);
        ys.push(y.clone());
    }

    Ok(OdeSolution { t: ts, y: ys, stats })
}
