//! Finite difference Jacobian computation.

use crate::error::SolverResult;
use nalgebra::{DMatrix, DVector};

/// Perturbation size for column `j`.
fn increment(x: f64, epsilon: f64) -> f64 {
    epsilon * x.abs().max(1.0)
}

/// Compute Jacobian using forward finite differences.
///
/// `f_x` is `f(x)`, already evaluated by the caller. For each column j,
/// perturbs x[j] and computes (f(x+e) - f(x))/e.
pub fn finite_difference_jacobian<F>(
    x: &DVector<f64>,
    f_x: &DVector<f64>,
    mut f: F,
    epsilon: f64,
) -> SolverResult<DMatrix<f64>>
where
    F: FnMut(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let n = x.len();
    let m = f_x.len();
    let mut jac = DMatrix::zeros(m, n);
    let mut x_perturbed = x.clone();

    for j in 0..n {
        let dx = increment(x[j], epsilon);
        x_perturbed[j] = x[j] + dx;
        let f_perturbed = f(&x_perturbed)?;
        x_perturbed[j] = x[j];

        let df = (f_perturbed - f_x) / dx;
        jac.set_column(j, &df);
    }

    Ok(jac)
}

/// Forward-difference Jacobian of a square system whose nonzeros lie within
/// `lower` subdiagonals and `upper` superdiagonals.
///
/// Columns further apart than the band width touch disjoint rows, so they are
/// perturbed together: the cost is `min(n, lower + upper + 1)` evaluations.
pub fn banded_jacobian<F>(
    x: &DVector<f64>,
    f_x: &DVector<f64>,
    mut f: F,
    epsilon: f64,
    lower: usize,
    upper: usize,
) -> SolverResult<DMatrix<f64>>
where
    F: FnMut(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let n = x.len();
    let width = lower + upper + 1;
    if width >= n {
        return finite_difference_jacobian(x, f_x, f, epsilon);
    }

    let mut jac = DMatrix::zeros(n, n);
    let mut x_perturbed = x.clone();
    let mut steps = vec![0.0; n];

    for group in 0..width {
        for j in (group..n).step_by(width) {
            steps[j] = increment(x[j], epsilon);
            x_perturbed[j] = x[j] + steps[j];
        }
        let f_perturbed = f(&x_perturbed)?;
        for j in (group..n).step_by(width) {
            x_perturbed[j] = x[j];
            let rows = j.saturating_sub(upper)..(j + lower + 1).min(n);
            for i in rows {
                jac[(i, j)] = (f_perturbed[i] - f_x[i]) / steps[j];
            }
        }
    }

    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jacobian_linear() {
        // f(x) = 2*x, J = 2
        let f = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, 2.0 * x[0]))
        };

        let x = DVector::from_element(1, 3.0);
        let fx = DVector::from_element(1, 6.0);
        let jac = finite_difference_jacobian(&x, &fx, f, 1e-7).unwrap();

        assert!((jac[(0, 0)] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn jacobian_quadratic() {
        // f(x) = x^2, J = 2*x
        let f = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] * x[0]))
        };

        let x = DVector::from_element(1, 3.0);
        let fx = DVector::from_element(1, 9.0);
        let jac = finite_difference_jacobian(&x, &fx, f, 1e-7).unwrap();

        assert!((jac[(0, 0)] - 6.0).abs() < 1e-5);
    }

    #[test]
    fn banded_matches_dense_for_tridiagonal() {
        // f_i = x_{i-1} - 2 x_i + x_{i+1}^2
        let n = 7;
        let f = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_fn(n, |i, _| {
                let left = if i > 0 { x[i - 1] } else { 0.0 };
                let right = if i + 1 < n { x[i + 1] * x[i + 1] } else { 0.0 };
                left - 2.0 * x[i] + right
            }))
        };
        let x = DVector::from_fn(n, |i, _| 1.0 + i as f64);
        let fx = f(&x).unwrap();

        let mut calls = 0;
        let counted = |y: &DVector<f64>| {
            calls += 1;
            f(y)
        };
        let banded = banded_jacobian(&x, &fx, counted, 1e-7, 1, 1).unwrap();
        assert_eq!(calls, 3);

        let dense = finite_difference_jacobian(&x, &fx, f, 1e-7).unwrap();
        assert!((banded - dense).amax() < 1e-9);
    }
}
