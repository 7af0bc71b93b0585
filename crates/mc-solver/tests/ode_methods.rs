//! Integration tests for the ODE drivers.

use mc_core::Real;
use mc_solver::{Method, OdeOptions, OdeSystem, SolverError, SolverResult, integrate};
use nalgebra::DVector;
use proptest::prelude::*;

struct Decay {
    k: Real,
}

impl OdeSystem for Decay {
    fn dim(&self) -> usize {
        1
    }

    fn rhs(&mut self, _t: Real, y: &DVector<Real>) -> SolverResult<DVector<Real>> {
        Ok(y * -self.k)
    }
}

/// Fast relaxation onto a slow forcing.
struct Relaxation;

impl OdeSystem for Relaxation {
    fn dim(&self) -> usize {
        1
    }

    fn rhs(&mut self, t: Real, y: &DVector<Real>) -> SolverResult<DVector<Real>> {
        Ok(DVector::from_element(1, -1000.0 * (y[0] - t.cos())))
    }
}

/// Linear diffusion chain; tridiagonal Jacobian.
struct Chain {
    n: usize,
    banded: bool,
}

impl OdeSystem for Chain {
    fn dim(&self) -> usize {
        self.n
    }

    fn rhs(&mut self, _t: Real, y: &DVector<Real>) -> SolverResult<DVector<Real>> {
        let n = self.n;
        Ok(DVector::from_fn(n, |i, _| {
            let left = if i > 0 { y[i - 1] } else { 0.0 };
            let right = if i + 1 < n { y[i + 1] } else { 0.0 };
            50.0 * (left - 2.0 * y[i] + right)
        }))
    }

    fn bandwidth(&self) -> Option<(usize, usize)> {
        self.banded.then_some((1, 1))
    }
}

struct BlowUp;

impl OdeSystem for BlowUp {
    fn dim(&self) -> usize {
        1
    }

    fn rhs(&mut self, _t: Real, y: &DVector<Real>) -> SolverResult<DVector<Real>> {
        Ok(DVector::from_element(1, y[0] * y[0]))
    }
}

fn grid(t_end: Real, n: usize) -> Vec<Real> {
    (0..=n).map(|i| t_end * i as Real / n as Real).collect()
}

#[test]
fn every_method_tracks_exponential_decay() {
    for method in [Method::Rk45, Method::TrBdf2, Method::Auto] {
        let options = OdeOptions {
            method,
            max_step: Some(0.01),
            ..OdeOptions::default()
        };
        let t_eval = grid(1.0, 100);
        let sol = integrate(
            &mut Decay { k: 1.0 },
            &t_eval,
            DVector::from_element(1, 1.0),
            &options,
        )
        .unwrap();
        assert_eq!(sol.y.len(), 101);
        let last = sol.y[100][0];
        assert!(
            (last - (-1.0_f64).exp()).abs() < 1e-4,
            "{method:?}: {last}"
        );
    }
}

#[test]
fn implicit_methods_handle_stiff_relaxation() {
    for method in [Method::TrBdf2, Method::Auto] {
        let options = OdeOptions {
            method,
            ..OdeOptions::default()
        };
        let t_eval = grid(2.0, 20);
        let sol = integrate(&mut Relaxation, &t_eval, DVector::from_element(1, 0.0), &options)
            .unwrap();
        for (t, y) in sol.t.iter().zip(&sol.y).skip(1) {
            // Quasi-steady solution y ≈ cos t + sin t / 1000.
            assert!((y[0] - t.cos()).abs() < 5e-3, "{method:?} at t={t}: {}", y[0]);
        }
    }
}

#[test]
fn banded_jacobian_gives_same_trajectory() {
    let n = 12;
    let y0 = DVector::from_fn(n, |i, _| if i == n / 2 { 1.0 } else { 0.0 });
    let options = OdeOptions {
        method: Method::TrBdf2,
        rtol: 1e-8,
        atol: 1e-10,
        ..OdeOptions::default()
    };
    let t_eval = grid(0.2, 10);
    let dense = integrate(&mut Chain { n, banded: false }, &t_eval, y0.clone(), &options).unwrap();
    let banded = integrate(&mut Chain { n, banded: true }, &t_eval, y0, &options).unwrap();
    let diff = (&dense.y[10] - &banded.y[10]).amax();
    assert!(diff < 1e-6, "diff {diff}");
    assert!(banded.stats.rhs_evals <= dense.stats.rhs_evals);
}

#[test]
fn finite_time_blow_up_is_an_integration_failure() {
    let err = integrate(
        &mut BlowUp,
        &[0.0, 2.0],
        DVector::from_element(1, 1.0),
        &OdeOptions {
            method: Method::Rk45,
            ..OdeOptions::default()
        },
    )
    .unwrap_err();
    assert!(err.is_integration_failure(), "{err}");
    assert!(matches!(
        err,
        SolverError::StepTooSmall { .. } | SolverError::IntegrationFailed { .. }
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn output_times_are_hit_exactly(n in 1usize..40, t_end in 0.1f64..5.0) {
        let t_eval = grid(t_end, n);
        let sol = integrate(
            &mut Decay { k: 0.5 },
            &t_eval,
            DVector::from_element(1, 2.0),
            &OdeOptions::default(),
        ).unwrap();
        prop_assert_eq!(&sol.t, &t_eval);
        let expected = 2.0 * (-0.5 * t_end).exp();
        prop_assert!((sol.y[n][0] - expected).abs() < 1e-4);
    }
}
