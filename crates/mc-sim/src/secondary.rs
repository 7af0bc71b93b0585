//! Resolution of secondary (algebraic) quantities at one time point.

use mc_core::Real;
use mc_solver::{SolverResult, levenberg_marquardt};
use nalgebra::DVector;
use tracing::debug;

use crate::assembly::Assembly;
use crate::options::SolverOptions;

impl Assembly {
    /// Bring the secondary entries of `state` in line with its principal
    /// entries at cycle time `t`.
    ///
    /// Runs `sub_iterations` fixed-point passes in dependency order. Circular
    /// groups are only approximated by these passes; with
    /// `optimize_secondary` the residual `s - f(s)` is then minimized over all
    /// secondary values, seeded from the fixed-point result.
    pub fn resolve_secondary(&self, t: Real, state: &mut [Real], options: &SolverOptions) {
        let mut args = Vec::with_capacity(self.update_inputs().width());
        for _ in 0..options.sub_iterations {
            for &col in self.secondary_order() {
                state[col] = self.eval_update(col, t, state, &mut args);
            }
        }

        if options.optimize_secondary && !self.secondary_ids().is_empty() {
            self.refine_secondary(t, state, options);
        }
    }

    fn refine_secondary(&self, t: Real, state: &mut [Real], options: &SolverOptions) {
        let ids = self.secondary_ids();
        let x0 = DVector::from_iterator(ids.len(), ids.iter().map(|&c| state[c]));
        if x0.iter().any(|v| !v.is_finite()) {
            // Leave the non-finite values for the integrator to reject.
            return;
        }

        let mut scratch = state.to_vec();
        let mut args = Vec::with_capacity(self.update_inputs().width());
        let residual = |x: &DVector<Real>| -> SolverResult<DVector<Real>> {
            for (&col, &v) in ids.iter().zip(x.iter()) {
                scratch[col] = v;
            }
            Ok(DVector::from_iterator(
                ids.len(),
                ids.iter()
                    .zip(x.iter())
                    .map(|(&col, &v)| v - self.eval_update(col, t, &scratch, &mut args)),
            ))
        };
        let result = match levenberg_marquardt(x0, residual, &options.lm) {
            Ok(result) => result,
            Err(e) => {
                debug!(t, error = %e, "secondary refinement skipped");
                return;
            }
        };
        if !result.converged {
            debug!(t, cost = result.cost, "secondary refinement hit its evaluation budget");
        }
        if result.x.iter().all(|v| v.is_finite()) {
            for (&col, &v) in ids.iter().zip(result.x.iter()) {
                state[col] = v;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_core::TimeGrid;
    use mc_graph::{Equation, Network, Quantity};

    /// `a = b/2 + 1`, `b = a/2`: exact solution `a = 4/3`, `b = 2/3`.
    fn circular_pair() -> Assembly {
        let mut net = Network::new("pair", TimeGrid::new(1, 1.0, 0.5).unwrap()).unwrap();
        let mut a = Quantity::new("a");
        a.set_algebraic(Equation::new("half_plus_one", |_t: Real, y: &[Real]| 0.5 * y[0] + 1.0, vec!["b".into()]))
            .unwrap();
        let mut b = Quantity::new("b");
        b.set_algebraic(Equation::new("half", |_t: Real, y: &[Real]| 0.5 * y[0], vec!["a".into()]))
            .unwrap();
        net.register(a).unwrap();
        net.register(b).unwrap();
        Assembly::build(&net).unwrap()
    }

    #[test]
    fn fixed_point_only_approximates_cycles() {
        let asm = circular_pair();
        assert_eq!(asm.circular_groups(), &[vec![0, 1]]);
        let mut state = vec![0.0, 0.0];
        asm.resolve_secondary(0.0, &mut state, &SolverOptions::default());
        assert_eq!(state, vec![1.0, 0.5]);
    }

    #[test]
    fn more_passes_tighten_the_fixed_point() {
        let asm = circular_pair();
        let opts = SolverOptions {
            sub_iterations: 40,
            ..Default::default()
        };
        let mut state = vec![0.0, 0.0];
        asm.resolve_secondary(0.0, &mut state, &opts);
        assert!((state[0] - 4.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn optimization_solves_cycles() {
        let asm = circular_pair();
        let opts = SolverOptions {
            optimize_secondary: true,
            ..Default::default()
        };
        let mut state = vec![0.0, 0.0];
        asm.resolve_secondary(0.0, &mut state, &opts);
        assert!((state[0] - 4.0 / 3.0).abs() < 1e-6, "a = {}", state[0]);
        assert!((state[1] - 2.0 / 3.0).abs() < 1e-6, "b = {}", state[1]);

        let before = state.clone();
        asm.resolve_secondary(0.0, &mut state, &opts);
        for (x, y) in state.iter().zip(&before) {
            assert!((x - y).abs() < 1e-6);
        }
    }
}
