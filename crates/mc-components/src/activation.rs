//! Cardiac activation functions.
//!
//! An activation `a(t) ∈ [0, 1]` blends the active and passive
//! pressure–volume laws of a chamber over one cycle.

use std::f64::consts::PI;

use mc_core::Real;

use crate::common::{central_difference, time_shift};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationShape {
    /// Cosine rise up to `t_tr`, exponential relaxation with time constant `tau`.
    CosineExponential,
    /// Cosine rise up to `t_max`, cosine fall over `tau`, then rest.
    CosineCosine,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Activation {
    pub shape: ActivationShape,
    /// Time to peak tension.
    pub t_max: Real,
    /// Transition time (exponential shape only).
    pub t_tr: Real,
    /// Relaxation time constant.
    pub tau: Real,
    /// Phase delay within the cycle, with the cycle length used to wrap it.
    pub delay: Option<(Real, Real)>,
}

impl Activation {
    pub fn new(shape: ActivationShape, t_max: Real, t_tr: Real, tau: Real) -> Self {
        Self {
            shape,
            t_max,
            t_tr,
            tau,
            delay: None,
        }
    }

    /// Shift the activation forward by `delay` within cycles of `t_cycle`.
    pub fn with_delay(mut self, delay: Real, t_cycle: Real) -> Self {
        self.delay = Some((delay, t_cycle));
        self
    }

    pub fn eval(&self, t: Real) -> Real {
        let t = match self.delay {
            Some((shift, t_cycle)) => time_shift(t, shift, t_cycle),
            None => t,
        };
        match self.shape {
            ActivationShape::CosineExponential => {
                if t <= self.t_tr {
                    0.5 * (1.0 - (PI * t / self.t_max).cos())
                } else {
                    let peak = 0.5 * (1.0 - (PI * self.t_tr / self.t_max).cos());
                    (-(t - self.t_tr) / self.tau).exp() * peak
                }
            }
            ActivationShape::CosineCosine => {
                if t < self.t_max {
                    0.5 * (1.0 - (PI * t / self.t_max).cos())
                } else if t - self.t_max < self.tau {
                    0.5 * (1.0 + (PI * (t - self.t_max) / self.tau).cos())
                } else {
                    0.0
                }
            }
        }
    }

    /// Time derivative by central difference.
    pub fn derivative(&self, t: Real) -> Real {
        central_difference(|s| self.eval(s), t)
    }
}
