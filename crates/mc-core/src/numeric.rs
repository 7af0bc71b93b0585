use crate::McError;

/// Floating point type used throughout system
pub type Real = f64;

/// Absolute/relative tolerance pair.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, McError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(McError::NonFinite { what, value: v })
    }
}

/// Largest absolute difference between two equally long series, scaled by the
/// amplitude of `reference` (never below `floor`).
///
/// Returns `Real::INFINITY` when the lengths differ or any value is non-finite.
pub fn normalized_max_diff(current: &[Real], reference: &[Real], floor: Real) -> Real {
    if current.len() != reference.len() {
        return Real::INFINITY;
    }
    let mut diff: Real = 0.0;
    let mut scale: Real = 0.0;
    for (&c, &r) in current.iter().zip(reference) {
        if !c.is_finite() || !r.is_finite() {
            return Real::INFINITY;
        }
        diff = diff.max((c - r).abs());
        scale = scale.max(r.abs());
    }
    diff / scale.max(floor)
}

/// Weighted root-mean-square norm used for error control: sqrt(mean((v/w)^2)).
pub fn weighted_rms(v: &[Real], weights: &[Real]) -> Real {
    if v.is_empty() {
        return 0.0;
    }
    let sum: Real = v
        .iter()
        .zip(weights)
        .map(|(x, w)| {
            let s = x / w;
            s * s
        })
        .sum();
    (sum / v.len() as Real).sqrt()
}
