//! Closed-form laws shared by the element library.

use mc_core::Real;

use crate::error::{ComponentError, ComponentResult};

/// Step used by central differences of time-dependent coefficients.
pub const DERIVATIVE_EPS: Real = 1.0e-3;

/// Inductances below this are treated as absent.
pub const INDUCTANCE_EPS: Real = 1.0e-11;

/// Above this `alpha·x`, softplus is replaced by its asymptote.
const SOFTPLUS_CUTOFF: Real = 20.0;

/// Fail unless `value` is finite and strictly positive.
pub fn check_positive(value: Real, element: &str, what: &'static str) -> ComponentResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ComponentError::NonPhysical {
            element: element.to_string(),
            what,
        })
    }
}

/// Flow through a linear resistor.
pub fn resistor_flow(p_in: Real, p_out: Real, r: Real) -> Real {
    (p_in - p_out) / r
}

/// Upstream pressure of a linear resistor carrying flow `q`.
pub fn resistor_upstream_pressure(q: Real, p_out: Real, r: Real) -> Real {
    p_out + r * q
}

/// Rate of change of flow through a resistor in series with an inductance.
pub fn inductor_flow_rate(p_in: Real, p_out: Real, q: Real, r: Real, l: Real) -> Real {
    (p_in - p_out - r * q) / l
}

pub fn capacitor_pressure(v: Real, v_ref: Real, c: Real) -> Real {
    (v - v_ref) / c
}

pub fn capacitor_volume(p: Real, v_ref: Real, c: Real) -> Real {
    v_ref + c * p
}

pub fn capacitor_pressure_rate(q_in: Real, q_out: Real, c: Real) -> Real {
    (q_in - q_out) / c
}

/// Net volume rate of change of a compartment.
pub fn volume_rate(q_in: Real, q_out: Real) -> Real {
    q_in - q_out
}

pub fn relu(x: Real) -> Real {
    x.max(0.0)
}

/// Smooth rectifier `ln(1 + e^{αx}) / α`.
pub fn softplus(x: Real, alpha: Real) -> Real {
    if alpha * x <= SOFTPLUS_CUTOFF {
        (alpha * x).exp().ln_1p() / alpha
    } else {
        x
    }
}

/// Second-order central difference of `f` at `t`.
pub fn central_difference(f: impl Fn(Real) -> Real, t: Real) -> Real {
    (f(t + DERIVATIVE_EPS) - f(t - DERIVATIVE_EPS)) / (2.0 * DERIVATIVE_EPS)
}

/// Shift a cycle-relative time forward by `shift`, wrapping at `t_cycle`.
pub fn time_shift(t: Real, shift: Real, t_cycle: Real) -> Real {
    if t < t_cycle - shift {
        t + shift
    } else {
        t + shift - t_cycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resistor_roundtrip() {
        let q = resistor_flow(10.0, 4.0, 2.0);
        assert_eq!(q, 3.0);
        assert_eq!(resistor_upstream_pressure(q, 4.0, 2.0), 10.0);
    }

    #[test]
    fn test_capacitor_inverse() {
        let p = capacitor_pressure(12.0, 2.0, 5.0);
        assert_eq!(capacitor_volume(p, 2.0, 5.0), 12.0);
    }

    #[test]
    fn test_softplus_limits() {
        assert!((softplus(0.0, 1.0) - std::f64::consts::LN_2).abs() < 1e-12);
        assert_eq!(softplus(50.0, 1.0), 50.0);
        assert!(softplus(-50.0, 1.0) < 1e-20);
        assert_eq!(relu(-1.0), 0.0);
    }

    #[test]
    fn test_time_shift_wraps() {
        assert!((time_shift(0.2, 0.5, 1.0) - 0.7).abs() < 1e-12);
        assert!((time_shift(0.6, 0.5, 1.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_central_difference_of_quadratic() {
        let d = central_difference(|t| t * t, 3.0);
        assert!((d - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_check_positive() {
        assert!(check_positive(1.0, "e", "r").is_ok());
        assert!(check_positive(0.0, "e", "r").is_err());
        assert!(check_positive(Real::NAN, "e", "r").is_err());
    }
}
