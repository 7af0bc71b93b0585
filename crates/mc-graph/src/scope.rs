//! Element-facing view of the network used while declaring equations.

use mc_core::{ElementId, QuantityId, Real};

use crate::error::GraphResult;
use crate::network::{Boundary, Network};
use crate::quantity::{Equation, Law};

/// Mutable access to one element's quantities.
///
/// Inputs are given as quantity handles and stored as the handles' current
/// canonical names, so elements never depend on global column numbering.
pub struct ElementScope<'a> {
    network: &'a mut Network,
    element: ElementId,
    boundary: Boundary,
    name: String,
}

impl<'a> ElementScope<'a> {
    pub(crate) fn new(
        network: &'a mut Network,
        element: ElementId,
        boundary: Boundary,
        name: String,
    ) -> Self {
        Self {
            network,
            element,
            boundary,
            name,
        }
    }

    pub fn element_id(&self) -> ElementId {
        self.element
    }

    pub fn element_name(&self) -> &str {
        &self.name
    }

    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    pub fn p_in(&self) -> QuantityId {
        self.boundary.p_in
    }

    pub fn p_out(&self) -> QuantityId {
        self.boundary.p_out
    }

    pub fn q_in(&self) -> QuantityId {
        self.boundary.q_in
    }

    pub fn q_out(&self) -> QuantityId {
        self.boundary.q_out
    }

    pub fn volume(&self) -> QuantityId {
        self.boundary.volume
    }

    /// Create or fetch an element-owned quantity named `<element>_<suffix>`.
    pub fn internal(&mut self, suffix: &str) -> GraphResult<QuantityId> {
        self.network.add_internal(self.element, suffix)
    }

    pub fn name_of(&self, id: QuantityId) -> GraphResult<String> {
        Ok(self.network.quantity(id)?.name().to_string())
    }

    fn equation(
        &self,
        label: &'static str,
        law: impl Law + 'static,
        inputs: &[QuantityId],
    ) -> GraphResult<Equation> {
        let names = inputs
            .iter()
            .map(|&id| self.name_of(id))
            .collect::<GraphResult<Vec<_>>>()?;
        Ok(Equation::new(label, law, names))
    }

    pub fn set_differential(
        &mut self,
        target: QuantityId,
        label: &'static str,
        law: impl Law + 'static,
        inputs: &[QuantityId],
    ) -> GraphResult<()> {
        let eq = self.equation(label, law, inputs)?;
        self.network.quantity_mut(target)?.set_differential(eq)
    }

    pub fn set_algebraic(
        &mut self,
        target: QuantityId,
        label: &'static str,
        law: impl Law + 'static,
        inputs: &[QuantityId],
    ) -> GraphResult<()> {
        let eq = self.equation(label, law, inputs)?;
        self.network.quantity_mut(target)?.set_algebraic(eq)
    }

    pub fn set_init(
        &mut self,
        target: QuantityId,
        label: &'static str,
        law: impl Law + 'static,
        inputs: &[QuantityId],
    ) -> GraphResult<()> {
        let eq = self.equation(label, law, inputs)?;
        self.network.quantity_mut(target)?.set_init(eq);
        Ok(())
    }

    pub fn set_initial_value(&mut self, target: QuantityId, value: Real) -> GraphResult<()> {
        self.network.set_initial_value(target, value)
    }
}

#[cfg(test)]
mod tests {
    use crate::network::{Network, Sharing};
    use crate::quantity::Role;
    use mc_core::{Real, TimeGrid};

    #[test]
    fn scope_declares_equations_by_name() {
        let mut net = Network::new("t", TimeGrid::new(1, 1.0, 0.5).unwrap()).unwrap();
        let e = net.add_element("R", Sharing::SharedFlow).unwrap();
        let mut scope = net.scope(e).unwrap();
        let (q, p_i, p_o) = (scope.q_in(), scope.p_in(), scope.p_out());
        assert_eq!(q, scope.q_out());
        scope
            .set_algebraic(q, "resistor", |_t: Real, y: &[Real]| (y[0] - y[1]) / 2.0, &[p_i, p_o])
            .unwrap();
        let quantity = net.quantity(q).unwrap();
        assert_eq!(quantity.role(), Role::Algebraic);
        assert_eq!(quantity.update().unwrap().inputs(), ["R_P_i", "R_P_o"]);
    }

    #[test]
    fn internal_quantities_are_reused() {
        let mut net = Network::new("t", TimeGrid::new(1, 1.0, 0.5).unwrap()).unwrap();
        let e = net.add_element("MV", Sharing::SharedFlow).unwrap();
        let mut scope = net.scope(e).unwrap();
        let a = scope.internal("PHI").unwrap();
        let b = scope.internal("PHI").unwrap();
        assert_eq!(a, b);
        assert_eq!(net.quantity(a).unwrap().name(), "MV_PHI");
        assert_eq!(net.element(e).unwrap().internals, vec![a]);
    }
}
