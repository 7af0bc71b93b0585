//! Linear resistor with a shared flow.

use mc_core::Real;
use mc_graph::{ElementScope, Sharing};

use crate::common::{check_positive, resistor_upstream_pressure};
use crate::error::ComponentResult;
use crate::traits::Element;

/// `P_i = P_o + R·Q`. The flow must be defined by a neighbouring element.
#[derive(Debug, Clone)]
pub struct ResistorElement {
    name: String,
    pub r: Real,
}

impl ResistorElement {
    pub fn new(name: impl Into<String>, r: Real) -> Self {
        Self {
            name: name.into(),
            r,
        }
    }
}

impl Element for ResistorElement {
    fn name(&self) -> &str {
        &self.name
    }

    fn sharing(&self) -> Sharing {
        Sharing::SharedFlow
    }

    fn configure(&self, scope: &mut ElementScope<'_>) -> ComponentResult<()> {
        check_positive(self.r, &self.name, "resistance")?;
        let (p_i, p_o, q) = (scope.p_in(), scope.p_out(), scope.q_in());
        let r = self.r;
        scope.set_algebraic(
            p_i,
            "resistor_upstream_pressure",
            move |_t: Real, y: &[Real]| resistor_upstream_pressure(y[0], y[1], r),
            &[q, p_o],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::add_element;
    use mc_core::TimeGrid;
    use mc_graph::{Network, Role};

    #[test]
    fn resistor_defines_upstream_pressure() {
        let mut n = Network::new("t", TimeGrid::new(1, 1.0, 0.5).unwrap()).unwrap();
        add_element(&mut n, &ResistorElement::new("r", 3.0)).unwrap();
        let p = n.quantity_by_name("r_P_i").unwrap();
        assert_eq!(p.role(), Role::Algebraic);
        assert_eq!(p.update().unwrap().inputs(), ["r_Q", "r_P_o"]);
        assert_eq!(p.update().unwrap().eval(0.0, &[2.0, 1.0]), 7.0);
        assert_eq!(n.quantity_by_name("r_Q").unwrap().role(), Role::Inert);
    }

    #[test]
    fn zero_resistance_rejected() {
        let mut n = Network::new("t", TimeGrid::new(1, 1.0, 0.5).unwrap()).unwrap();
        assert!(add_element(&mut n, &ResistorElement::new("r", 0.0)).is_err());
    }
}
