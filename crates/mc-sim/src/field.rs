//! The vector field handed to the time integrator.

use mc_core::Real;
use mc_solver::{OdeSystem, SolverResult};
use nalgebra::DVector;

use crate::assembly::Assembly;
use crate::options::SolverOptions;

/// `y' = f(t, y)` over the permuted principal quantities.
///
/// Every evaluation rebuilds a full state row from `baseline`, writes the
/// principal values into it and resolves the secondary entries from there, so
/// the result depends on `(t, y)` alone.
pub struct VectorField<'a> {
    assembly: &'a Assembly,
    options: &'a SolverOptions,
    t_cycle: Real,
    baseline: &'a [Real],
    state: Vec<Real>,
    evaluations: usize,
}

impl<'a> VectorField<'a> {
    pub fn new(
        assembly: &'a Assembly,
        options: &'a SolverOptions,
        t_cycle: Real,
        baseline: &'a [Real],
    ) -> Self {
        Self {
            assembly,
            options,
            t_cycle,
            baseline,
            state: baseline.to_vec(),
            evaluations: 0,
        }
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Full state row from the most recent evaluation.
    pub fn state(&self) -> &[Real] {
        &self.state
    }
}

impl OdeSystem for VectorField<'_> {
    fn dim(&self) -> usize {
        self.assembly.n_principal()
    }

    fn rhs(&mut self, t: Real, y: &DVector<Real>) -> SolverResult<DVector<Real>> {
        self.evaluations += 1;
        let t = t.rem_euclid(self.t_cycle);
        self.assembly.restore_non_principal(self.baseline, &mut self.state);
        self.assembly.scatter_principals(y, &mut self.state);
        self.assembly.resolve_secondary(t, &mut self.state, self.options);
        Ok(self.assembly.principal_rates(t, &self.state))
    }

    fn bandwidth(&self) -> Option<(usize, usize)> {
        Some(self.assembly.bandwidth())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_core::TimeGrid;
    use mc_graph::{Equation, Network, Quantity};

    #[test]
    fn rates_use_cycle_time_and_resolved_secondaries() {
        let mut net = Network::new("f", TimeGrid::new(1, 2.0, 0.5).unwrap()).unwrap();
        // x' = s, s = x * t
        let mut x = Quantity::new("x");
        x.set_differential(Equation::new("copy", |_t: Real, y: &[Real]| y[0], vec!["s".into()]))
            .unwrap();
        let mut s = Quantity::new("s");
        s.set_algebraic(Equation::new("scaled", |t: Real, y: &[Real]| y[0] * t, vec!["x".into()]))
            .unwrap();
        net.register(x).unwrap();
        net.register(s).unwrap();
        let asm = Assembly::build(&net).unwrap();
        let opts = SolverOptions::default();

        let baseline = [0.0, 0.0];
        let mut field = VectorField::new(&asm, &opts, 2.0, &baseline);
        let dy = field.rhs(5.0, &DVector::from_element(1, 3.0)).unwrap();
        // t = 5 is 1.0 into the third cycle
        assert!((dy[0] - 3.0).abs() < 1e-12);
        assert_eq!(field.state(), &[3.0, 3.0]);
        assert_eq!(field.evaluations(), 1);
        assert_eq!(field.bandwidth(), Some((0, 0)));
    }

    #[test]
    fn repeated_evaluations_agree_on_a_circular_group() {
        // x' = -a, a = 2b + x, b = 2a: the fixed-point map doubles its error
        // on every pass.
        let mut net = Network::new("f", TimeGrid::new(1, 1.0, 0.5).unwrap()).unwrap();
        let mut x = Quantity::new("x");
        x.set_differential(Equation::new("drain", |_t: Real, y: &[Real]| -y[0], vec!["a".into()]))
            .unwrap();
        let mut a = Quantity::new("a");
        a.set_algebraic(Equation::new(
            "mix",
            |_t: Real, y: &[Real]| 2.0 * y[0] + y[1],
            vec!["b".into(), "x".into()],
        ))
        .unwrap();
        let mut b = Quantity::new("b");
        b.set_algebraic(Equation::new("double", |_t: Real, y: &[Real]| 2.0 * y[0], vec!["a".into()]))
            .unwrap();
        net.register(x).unwrap();
        net.register(a).unwrap();
        net.register(b).unwrap();
        let asm = Assembly::build(&net).unwrap();
        assert_eq!(asm.circular_groups().len(), 1);
        let opts = SolverOptions::default();

        let baseline = [0.0; 3];
        let mut field = VectorField::new(&asm, &opts, 1.0, &baseline);
        let y = DVector::from_element(1, 1.0);
        let first = field.rhs(0.0, &y).unwrap();
        for _ in 0..20 {
            assert_eq!(field.rhs(0.0, &y).unwrap(), first);
        }
        assert!(first[0].is_finite());
    }
}
