//! mc-graph: quantity/network layer for modcirc.
//!
//! Provides:
//! - `Quantity`: a named scalar with exactly one update rule (differential,
//!   algebraic or none) and an optional initialization law
//! - `Network`: the arena of quantities, the element boundary table and the
//!   dense `[time × quantity]` data table
//! - `connect`: unification of boundary quantities between adjacent elements
//!
//! # Example
//!
//! ```
//! use mc_core::TimeGrid;
//! use mc_graph::{Network, Sharing};
//!
//! let mut net = Network::new("demo", TimeGrid::new(2, 1.0, 0.1).unwrap()).unwrap();
//! let a = net.add_element("A", Sharing::Distinct).unwrap();
//! let b = net.add_element("B", Sharing::SharedFlow).unwrap();
//!
//! // Give A an outflow law so the flow link can be resolved.
//! let mut scope = net.scope(a).unwrap();
//! let (q_o, p_i, p_o) = (scope.q_out(), scope.p_in(), scope.p_out());
//! scope
//!     .set_algebraic(q_o, "resistor", |_t: f64, y: &[f64]| y[0] - y[1], &[p_i, p_o])
//!     .unwrap();
//!
//! net.connect(a, b, Some("p_ab"), Some("q_ab")).unwrap();
//! assert!(net.id_of("q_ab").is_some());
//! ```

pub mod error;
pub mod network;
pub mod quantity;
pub mod scope;
pub mod table;

// Re-exports for ergonomics
pub use error::{GraphError, GraphResult, LinkKind};
pub use network::{Boundary, ElementEntry, Network, Sharing};
pub use quantity::{Equation, Law, Quantity, Role, Rule};
pub use scope::ElementScope;
pub use table::DataTable;
