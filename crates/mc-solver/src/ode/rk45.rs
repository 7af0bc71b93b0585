//! Dormand–Prince 5(4) with Hairer's stiffness indicator.

use mc_core::{Real, weighted_rms};
use nalgebra::DVector;

use super::{OdeOptions, OdeStats, OdeSystem, Trial, error_scale, eval_rhs};
use crate::error::SolverResult;

const C2: Real = 1.0 / 5.0;
const C3: Real = 3.0 / 10.0;
const C4: Real = 4.0 / 5.0;
const C5: Real = 8.0 / 9.0;

const A21: Real = 1.0 / 5.0;
const A31: Real = 3.0 / 40.0;
const A32: Real = 9.0 / 40.0;
const A41: Real = 44.0 / 45.0;
const A42: Real = -56.0 / 15.0;
const A43: Real = 32.0 / 9.0;
const A51: Real = 19372.0 / 6561.0;
const A52: Real = -25360.0 / 2187.0;
const A53: Real = 64448.0 / 6561.0;
const A54: Real = -212.0 / 729.0;
const A61: Real = 9017.0 / 3168.0;
const A62: Real = -355.0 / 33.0;
const A63: Real = 46732.0 / 5247.0;
const A64: Real = 49.0 / 176.0;
const A65: Real = -5103.0 / 18656.0;

const B1: Real = 35.0 / 384.0;
const B3: Real = 500.0 / 1113.0;
const B4: Real = 125.0 / 192.0;
const B5: Real = -2187.0 / 6784.0;
const B6: Real = 11.0 / 84.0;

// Difference between the 5th and embedded 4th order weights.
const E1: Real = 71.0 / 57600.0;
const E3: Real = -71.0 / 16695.0;
const E4: Real = 71.0 / 1920.0;
const E5: Real = -17253.0 / 339200.0;
const E6: Real = 22.0 / 525.0;
const E7: Real = -1.0 / 40.0;

/// `h·‖k7 − k6‖/‖y_new − y6‖` above this flags the step as stiff.
const STIFFNESS_THRESHOLD: Real = 3.25;

/// Linear combination `y + h·Σ cᵢ·kᵢ`.
fn combine(y: &DVector<Real>, h: Real, terms: &[(Real, &DVector<Real>)]) -> DVector<Real> {
    let mut out = y.clone();
    for &(c, k) in terms {
        if c != 0.0 {
            out.axpy(h * c, k, 1.0);
        }
    }
    out
}

#[derive(Debug, Clone, Copy, Default)]
pub(super) struct DormandPrince;

impl DormandPrince {
    pub const ERROR_EXPONENT: Real = 1.0 / 5.0;
    pub const MAX_GROWTH: Real = 10.0;

    #[allow(clippy::too_many_arguments)]
    pub fn attempt<S: OdeSystem + ?Sized>(
        &mut self,
        system: &mut S,
        t: Real,
        y: &DVector<Real>,
        k1: &DVector<Real>,
        h: Real,
        options: &OdeOptions,
        stats: &mut OdeStats,
    ) -> SolverResult<Option<Trial>> {
        let y2 = combine(y, h, &[(A21, k1)]);
        let k2 = eval_rhs(system, t + C2 * h, &y2, stats)?;
        let y3 = combine(y, h, &[(A31, k1), (A32, &k2)]);
        let k3 = eval_rhs(system, t + C3 * h, &y3, stats)?;
        let y4 = combine(y, h, &[(A41, k1), (A42, &k2), (A43, &k3)]);
        let k4 = eval_rhs(system, t + C4 * h, &y4, stats)?;
        let y5 = combine(y, h, &[(A51, k1), (A52, &k2), (A53, &k3), (A54, &k4)]);
        let k5 = eval_rhs(system, t + C5 * h, &y5, stats)?;
        let y6 = combine(
            y,
            h,
            &[(A61, k1), (A62, &k2), (A63, &k3), (A64, &k4), (A65, &k5)],
        );
        let k6 = eval_rhs(system, t + h, &y6, stats)?;
        let y_new = combine(
            y,
            h,
            &[(B1, k1), (B3, &k3), (B4, &k4), (B5, &k5), (B6, &k6)],
        );
        let k7 = eval_rhs(system, t + h, &y_new, stats)?;

        let zero = DVector::zeros(y.len());
        let err_vec = combine(
            &zero,
            h,
            &[(E1, k1), (E3, &k3), (E4, &k4), (E5, &k5), (E6, &k6), (E7, &k7)],
        );
        let scale = error_scale(y, &y_new, options);
        let err = weighted_rms(err_vec.as_slice(), &scale);
        if !err.is_finite() {
            return Ok(None);
        }

        let num = (&k7 - &k6).norm();
        let den = (&y_new - &y6).norm();
        let stiff = den > 0.0 && h * num / den > STIFFNESS_THRESHOLD;

        Ok(Some(Trial {
            y_new,
            f_new: k7,
            err,
            stiff,
        }))
    }
}
