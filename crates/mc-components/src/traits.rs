//! The element contract.

use mc_core::{ElementId, Real};
use mc_graph::{ElementScope, Network, Sharing};

use crate::error::{ComponentError, ComponentResult};

/// A reusable hydraulic building block.
///
/// Elements own no values. `configure` attaches laws to the element's
/// boundary quantities, naming inputs only through the handles the scope
/// hands out, so the solver is free to renumber and reorder columns.
pub trait Element: Send + Sync {
    /// Element name; prefixes the local names of its quantities.
    fn name(&self) -> &str;

    /// Which inflow/outflow pairs collapse to one quantity.
    fn sharing(&self) -> Sharing;

    /// Declare update, initialization laws and initial values.
    ///
    /// Called exactly once, before the element is connected.
    fn configure(&self, scope: &mut ElementScope<'_>) -> ComponentResult<()>;
}

/// Initial volume and/or pressure of a compliant element.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InitialCondition {
    pub volume: Option<Real>,
    pub pressure: Option<Real>,
}

impl InitialCondition {
    /// Fail unless at least one of volume or pressure is known.
    pub fn require(&self, element: &str) -> ComponentResult<()> {
        if self.volume.is_none() && self.pressure.is_none() {
            return Err(ComponentError::MissingInitialCondition {
                element: element.to_string(),
            });
        }
        for (value, what) in [(self.volume, "initial volume"), (self.pressure, "initial pressure")] {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(ComponentError::NonPhysical {
                    element: element.to_string(),
                    what,
                });
            }
        }
        Ok(())
    }
}

/// Register an element's boundary quantities in `network` and configure it.
pub fn add_element(network: &mut Network, element: &dyn Element) -> ComponentResult<ElementId> {
    let id = network.add_element(element.name(), element.sharing())?;
    let mut scope = network.scope(id)?;
    element.configure(&mut scope)?;
    tracing::debug!(element = element.name(), "configured element");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_condition_needs_one_value() {
        assert!(InitialCondition::default().require("x").is_err());
        let ic = InitialCondition {
            volume: Some(1.0),
            pressure: None,
        };
        assert!(ic.require("x").is_ok());
    }

    #[test]
    fn non_finite_initial_value_rejected() {
        let ic = InitialCondition {
            volume: None,
            pressure: Some(Real::NAN),
        };
        assert!(matches!(
            ic.require("x"),
            Err(ComponentError::NonPhysical { .. })
        ));
    }
}
