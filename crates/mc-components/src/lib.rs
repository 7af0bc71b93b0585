//! mc-components: element library for lumped-parameter circulation networks.
//!
//! Provides models for common hydraulic building blocks:
//! - Resistor–capacitor (and inductive) compartments
//! - Plain resistors
//! - Valves: non-ideal diode, leaky diode, Bernoulli orifice, Mynard dynamic
//! - Elastance chambers with linear or exponential passive laws
//!
//! Every element implements the `Element` trait: it declares its equations
//! against its own boundary quantities through an `ElementScope`, using
//! quantity handles rather than global column numbers.
//!
//! # Example
//!
//! ```
//! use mc_components::{RcElement, add_element};
//! use mc_core::TimeGrid;
//! use mc_graph::{Network, Role};
//!
//! let mut net = Network::new("rc", TimeGrid::new(5, 1.0, 0.01).unwrap()).unwrap();
//! let rc = RcElement::new("tank", 1.0, 1.0, 0.0).with_volume(1.0);
//! add_element(&mut net, &rc).unwrap();
//!
//! assert_eq!(net.quantity_by_name("tank_P_i").unwrap().role(), Role::Differential);
//! assert_eq!(net.quantity_by_name("tank_Q_o").unwrap().role(), Role::Algebraic);
//! ```

pub mod activation;
pub mod chamber;
pub mod common;
pub mod error;
pub mod rc;
pub mod resistor;
pub mod traits;
pub mod valve;

// Re-exports
pub use activation::{Activation, ActivationShape};
pub use chamber::{ConstantElastanceChamber, MixedElastanceChamber};
pub use error::{ComponentError, ComponentResult};
pub use rc::{RcElement, RlcElement};
pub use resistor::ResistorElement;
pub use traits::{Element, InitialCondition, add_element};
pub use valve::{MynardValve, Opening, Valve, ValveLaw};
