//! Index-based form of a configured network.
//!
//! Built once by [`Assembly::build`]: every quantity gets a column, every
//! declared input name is resolved to a column index, and the principal
//! quantities are ordered to keep the vector field's Jacobian banded.

use std::collections::HashMap;

use mc_core::Real;
use mc_graph::{Equation, Network, Role};
use nalgebra::DVector;
use tracing::info;

use crate::dependency::{evaluation_plan, principal_dependencies};
use crate::error::{SimError, SimResult};
use crate::rcm::Ordering;

/// Fixed-width rows of input column indices, `None`-padded.
#[derive(Debug, Clone, Default)]
pub struct InputIndex {
    width: usize,
    slots: Vec<Option<usize>>,
}

impl InputIndex {
    pub fn from_rows(rows: &[Vec<usize>]) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut slots = vec![None; rows.len() * width];
        for (r, row) in rows.iter().enumerate() {
            for (k, &col) in row.iter().enumerate() {
                slots[r * width + k] = Some(col);
            }
        }
        Self { width, slots }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn row(&self, col: usize) -> &[Option<usize>] {
        &self.slots[col * self.width..(col + 1) * self.width]
    }

    /// The resolved inputs of `col`, in declaration order.
    pub fn inputs(&self, col: usize) -> impl Iterator<Item = usize> + '_ {
        self.row(col).iter().map_while(|slot| *slot)
    }

    fn gather(&self, col: usize, state: &[Real], args: &mut Vec<Real>) {
        args.clear();
        args.extend(self.inputs(col).map(|i| state[i]));
    }
}

#[derive(Debug, Clone)]
pub struct Assembly {
    names: Vec<String>,
    columns: HashMap<String, usize>,
    roles: Vec<Role>,
    updates: Vec<Option<Equation>>,
    inits: Vec<Option<Equation>>,
    update_inputs: InputIndex,
    init_inputs: InputIndex,
    principal_ids: Vec<usize>,
    secondary_ids: Vec<usize>,
    init_ids: Vec<usize>,
    init_only_ids: Vec<usize>,
    inert_ids: Vec<usize>,
    dependencies: Vec<Vec<usize>>,
    ordering: Ordering,
    secondary_order: Vec<usize>,
    circular_groups: Vec<Vec<usize>>,
}

impl Assembly {
    pub fn build(network: &Network) -> SimResult<Self> {
        let names = network.all_quantity_names().to_vec();
        let columns: HashMap<String, usize> = names
            .iter()
            .enumerate()
            .map(|(col, name)| (name.clone(), col))
            .collect();

        let n = names.len();
        let mut roles = Vec::with_capacity(n);
        let mut updates = Vec::with_capacity(n);
        let mut inits = Vec::with_capacity(n);
        let mut update_rows = Vec::with_capacity(n);
        let mut init_rows = Vec::with_capacity(n);
        for name in &names {
            let q = network.quantity_by_name(name)?;
            roles.push(q.role());
            update_rows.push(resolve_inputs(name, q.update(), &columns)?);
            init_rows.push(resolve_inputs(name, q.init(), &columns)?);
            updates.push(q.update().cloned());
            inits.push(q.init().cloned());
        }
        let update_inputs = InputIndex::from_rows(&update_rows);
        let init_inputs = InputIndex::from_rows(&init_rows);

        let with_role = |role: Role| -> Vec<usize> {
            (0..n).filter(|&col| roles[col] == role).collect()
        };
        let principal_ids = with_role(Role::Differential);
        let secondary_ids = with_role(Role::Algebraic);
        let init_only_ids = with_role(Role::InitOnly);
        let inert_ids = with_role(Role::Inert);

        let has_init: Vec<usize> = (0..n).filter(|&col| inits[col].is_some()).collect();
        let init_plan = evaluation_plan(&has_init, n, &init_inputs);
        if let Some(cycle) = init_plan.circular.first() {
            return Err(SimError::CircularInitialization {
                quantities: cycle.iter().map(|&c| names[c].clone()).collect(),
            });
        }

        let dependencies = principal_dependencies(&principal_ids, &roles, &update_inputs);
        let ordering = Ordering::new(&dependencies);
        let secondary_plan = evaluation_plan(&secondary_ids, n, &update_inputs);

        let assembly = Self {
            names,
            columns,
            roles,
            updates,
            inits,
            update_inputs,
            init_inputs,
            principal_ids,
            secondary_ids,
            init_ids: init_plan.order,
            init_only_ids,
            inert_ids,
            dependencies,
            ordering,
            secondary_order: secondary_plan.order,
            circular_groups: secondary_plan.circular,
        };
        info!(
            network = network.name(),
            principal = assembly.principal_ids.len(),
            secondary = assembly.secondary_ids.len(),
            init = assembly.init_ids.len(),
            lower = assembly.ordering.lower,
            upper = assembly.ordering.upper,
            circular = assembly.circular_groups.len(),
            "assembled network"
        );
        Ok(assembly)
    }

    pub fn n_cols(&self) -> usize {
        self.names.len()
    }

    pub fn n_principal(&self) -> usize {
        self.principal_ids.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column_of(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    pub fn role(&self, col: usize) -> Role {
        self.roles[col]
    }

    /// Differential quantities, in column order.
    pub fn principal_ids(&self) -> &[usize] {
        &self.principal_ids
    }

    /// Algebraic quantities, in column order.
    pub fn secondary_ids(&self) -> &[usize] {
        &self.secondary_ids
    }

    /// Quantities with an init equation, in evaluation order.
    pub fn init_ids(&self) -> &[usize] {
        &self.init_ids
    }

    /// Quantities computed only at the first time step.
    pub fn init_only_ids(&self) -> &[usize] {
        &self.init_only_ids
    }

    /// Quantities with neither an update rule nor an init equation.
    pub fn inert_ids(&self) -> &[usize] {
        &self.inert_ids
    }

    pub fn update_inputs(&self) -> &InputIndex {
        &self.update_inputs
    }

    pub fn init_inputs(&self) -> &InputIndex {
        &self.init_inputs
    }

    /// Principal positions read by each principal's rate.
    pub fn dependencies(&self) -> &[Vec<usize>] {
        &self.dependencies
    }

    /// `permutation()[k]` is the position in `principal_ids` of the `k`-th
    /// integrated component.
    pub fn permutation(&self) -> &[usize] {
        &self.ordering.permutation
    }

    pub fn inverse_permutation(&self) -> &[usize] {
        &self.ordering.inverse
    }

    /// `(lower, upper)` bandwidth of the Jacobian in permuted order.
    pub fn bandwidth(&self) -> (usize, usize) {
        (self.ordering.lower, self.ordering.upper)
    }

    /// Secondary quantities, dependencies first.
    pub fn secondary_order(&self) -> &[usize] {
        &self.secondary_order
    }

    /// Groups of secondary quantities that read each other circularly.
    pub fn circular_groups(&self) -> &[Vec<usize>] {
        &self.circular_groups
    }

    pub(crate) fn eval_update(&self, col: usize, t: Real, state: &[Real], args: &mut Vec<Real>) -> Real {
        match &self.updates[col] {
            Some(eq) => {
                self.update_inputs.gather(col, state, args);
                eq.eval(t, args)
            }
            None => state[col],
        }
    }

    pub(crate) fn eval_init(&self, col: usize, t: Real, state: &[Real], args: &mut Vec<Real>) -> Real {
        match &self.inits[col] {
            Some(eq) => {
                self.init_inputs.gather(col, state, args);
                eq.eval(t, args)
            }
            None => state[col],
        }
    }

    /// Evaluate the init equations at `t` in dependency order.
    pub fn initialize(&self, t: Real, state: &mut [Real]) {
        let mut args = Vec::with_capacity(self.init_inputs.width());
        for &col in &self.init_ids {
            state[col] = self.eval_init(col, t, state, &mut args);
        }
    }

    /// Reset every non-principal entry of `state` to its `baseline` value.
    ///
    /// Secondary resolution started from the same baseline makes the
    /// resolved row a function of time and the principal values only.
    pub fn restore_non_principal(&self, baseline: &[Real], state: &mut [Real]) {
        for (col, role) in self.roles.iter().enumerate() {
            if *role != Role::Differential {
                state[col] = baseline[col];
            }
        }
    }

    /// Principal values of a full state row, in permuted order.
    pub fn gather_principals(&self, state: &[Real]) -> DVector<Real> {
        DVector::from_iterator(
            self.principal_ids.len(),
            self.ordering
                .permutation
                .iter()
                .map(|&p| state[self.principal_ids[p]]),
        )
    }

    /// Write a permuted principal vector into a full state row.
    pub fn scatter_principals(&self, y: &DVector<Real>, state: &mut [Real]) {
        for (k, &p) in self.ordering.permutation.iter().enumerate() {
            state[self.principal_ids[p]] = y[k];
        }
    }

    /// Rates of the principal quantities for a fully resolved state, in
    /// permuted order.
    pub fn principal_rates(&self, t: Real, state: &[Real]) -> DVector<Real> {
        let mut args = Vec::with_capacity(self.update_inputs.width());
        DVector::from_iterator(
            self.principal_ids.len(),
            self.ordering
                .permutation
                .iter()
                .map(|&p| self.eval_update(self.principal_ids[p], t, state, &mut args)),
        )
    }
}

fn resolve_inputs(
    owner: &str,
    eq: Option<&Equation>,
    columns: &HashMap<String, usize>,
) -> SimResult<Vec<usize>> {
    let Some(eq) = eq else {
        return Ok(Vec::new());
    };
    eq.inputs()
        .iter()
        .map(|input| {
            columns
                .get(input)
                .copied()
                .ok_or_else(|| SimError::UnresolvedInput {
                    quantity: owner.to_string(),
                    input: input.clone(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_core::TimeGrid;
    use mc_graph::Quantity;

    fn network_with(quantities: Vec<Quantity>) -> Network {
        let mut net = Network::new("test", TimeGrid::new(1, 1.0, 0.5).unwrap()).unwrap();
        for q in quantities {
            net.register(q).unwrap();
        }
        net
    }

    fn differential(name: &str, inputs: &[&str]) -> Quantity {
        let mut q = Quantity::new(name);
        let eq = Equation::new(
            "sum",
            |_t: Real, y: &[Real]| y.iter().sum(),
            inputs.iter().map(|s| s.to_string()).collect(),
        );
        q.set_differential(eq).unwrap();
        q
    }

    fn algebraic(name: &str, inputs: &[&str]) -> Quantity {
        let mut q = Quantity::new(name);
        let eq = Equation::new(
            "sum",
            |_t: Real, y: &[Real]| y.iter().sum(),
            inputs.iter().map(|s| s.to_string()).collect(),
        );
        q.set_algebraic(eq).unwrap();
        q
    }

    #[test]
    fn input_rows_are_padded() {
        let index = InputIndex::from_rows(&[vec![2, 0], vec![], vec![1]]);
        assert_eq!(index.width(), 2);
        assert_eq!(index.row(1), &[None, None]);
        assert_eq!(index.row(2), &[Some(1), None]);
        assert_eq!(index.inputs(0).collect::<Vec<_>>(), vec![2, 0]);
    }

    #[test]
    fn classification_and_resolution() {
        let net = network_with(vec![
            differential("x", &["a"]),
            algebraic("a", &["x", "k"]),
            Quantity::new("k"),
        ]);
        let asm = Assembly::build(&net).unwrap();
        assert_eq!(asm.principal_ids(), &[0]);
        assert_eq!(asm.secondary_ids(), &[1]);
        assert_eq!(asm.inert_ids(), &[2]);
        assert_eq!(asm.update_inputs().inputs(1).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(asm.dependencies(), &[vec![0]]);
    }

    #[test]
    fn unknown_input_is_rejected() {
        let net = network_with(vec![differential("x", &["missing"])]);
        let err = Assembly::build(&net).unwrap_err();
        assert_eq!(
            err,
            SimError::UnresolvedInput {
                quantity: "x".into(),
                input: "missing".into()
            }
        );
    }

    #[test]
    fn circular_init_is_rejected() {
        let mut a = Quantity::new("a");
        a.set_init(Equation::new("copy", |_t: Real, y: &[Real]| y[0], vec!["b".into()]));
        let mut b = Quantity::new("b");
        b.set_init(Equation::new("copy", |_t: Real, y: &[Real]| y[0], vec!["a".into()]));
        let net = network_with(vec![a, b]);
        assert!(matches!(
            Assembly::build(&net),
            Err(SimError::CircularInitialization { .. })
        ));
    }

    #[test]
    fn init_runs_in_dependency_order() {
        let mut a = Quantity::new("a");
        a.set_init(Equation::new("double", |_t: Real, y: &[Real]| 2.0 * y[0], vec!["b".into()]));
        let mut b = Quantity::new("b");
        b.set_init(Equation::new("inc", |_t: Real, y: &[Real]| y[0] + 1.0, vec!["c".into()]));
        let mut c = Quantity::new("c");
        c.set_initial_value(3.0);
        let net = network_with(vec![a, b, c]);
        let asm = Assembly::build(&net).unwrap();
        let mut state = vec![0.0, 0.0, 3.0];
        asm.initialize(0.0, &mut state);
        assert_eq!(state, vec![8.0, 4.0, 3.0]);
        assert_eq!(asm.init_only_ids(), &[0, 1]);
        assert_eq!(asm.inert_ids(), &[2]);
    }

    #[test]
    fn gather_and_scatter_are_inverse() {
        let net = network_with(vec![
            differential("x", &["z"]),
            differential("y", &[]),
            differential("z", &["x"]),
        ]);
        let asm = Assembly::build(&net).unwrap();
        let state = vec![1.0, 2.0, 3.0];
        let y = asm.gather_principals(&state);
        let mut out = vec![0.0; 3];
        asm.scatter_principals(&y, &mut out);
        assert_eq!(out, state);
    }
}
