//! Numerical kernels for cyclic network integration.
//!
//! - `ode`: adaptive integrators (explicit Dormand–Prince, implicit TR-BDF2
//!   and an automatic stiffness-switching driver) that land exactly on a
//!   list of output times
//! - `jacobian`: dense and banded finite-difference Jacobians
//! - `newton`: simplified Newton iteration for implicit stages
//! - `levenberg`: derivative-free Levenberg–Marquardt least squares

pub mod error;
pub mod jacobian;
pub mod levenberg;
pub mod newton;
pub mod ode;

pub use error::{SolverError, SolverResult};
pub use levenberg::{LmConfig, LmResult, levenberg_marquardt};
pub use newton::{NewtonConfig, NewtonResult};
pub use ode::{Method, OdeOptions, OdeSolution, OdeStats, OdeSystem, integrate};
