//! Equation-graph assembly and cyclic steady-state solving.
//!
//! Provides:
//! - Classification of network quantities into principal (differential),
//!   secondary (algebraic), init-only and inert sets
//! - Dependency analysis and a reverse Cuthill–McKee ordering that keeps the
//!   Jacobian banded
//! - Fixed-point and Levenberg–Marquardt resolution of secondary quantities
//! - A cycle driver that integrates one period at a time and stops at a
//!   periodic steady state
//!
//! ```
//! use mc_components::{RcElement, add_element};
//! use mc_core::TimeGrid;
//! use mc_graph::Network;
//! use mc_sim::{Solver, SolverOptions};
//!
//! let mut net = Network::new("decay", TimeGrid::new(2, 1.0, 0.1).unwrap()).unwrap();
//! add_element(&mut net, &RcElement::new("c", 1.0, 1.0, 0.0).with_volume(1.0)).unwrap();
//! let mut solver = Solver::new(net);
//! solver.setup(SolverOptions::default()).unwrap();
//! let report = solver.solve().unwrap();
//! assert_eq!(report.cycles, 2);
//! assert_eq!(solver.network().data_table().n_rows(), 21);
//! ```

pub mod assembly;
pub mod error;
pub mod field;
pub mod options;
pub mod rcm;
pub mod report;
pub mod solver;

mod dependency;
mod secondary;

pub use assembly::{Assembly, InputIndex};
pub use error::{SimError, SimResult};
pub use field::VectorField;
pub use options::SolverOptions;
pub use rcm::Ordering;
pub use report::{CycleOutcome, SolveReport};
pub use solver::Solver;
