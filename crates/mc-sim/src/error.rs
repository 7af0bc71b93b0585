//! Error types for assembly and cyclic solving.

use mc_components::ComponentError;
use mc_core::McError;
use mc_graph::GraphError;
use mc_solver::SolverError;
use thiserror::Error;

/// Errors raised while assembling or solving a network.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid option: {what}")]
    InvalidOption { what: String },

    #[error("Quantity {quantity} reads unknown quantity {input}")]
    UnresolvedInput { quantity: String, input: String },

    #[error("Initialization equations form a cycle through {quantities:?}")]
    CircularInitialization { quantities: Vec<String> },

    #[error("Monitored quantity {name} is not registered")]
    UnknownMonitor { name: String },

    #[error("Solver has not been set up")]
    NotSetUp,

    #[error("Solver has no initial row; call initialize first")]
    NotInitialized,

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Core(#[from] McError),
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    /// True for failures of the time integrator, which the cycle driver turns
    /// into a non-converged result instead of an error.
    pub fn is_integration_failure(&self) -> bool {
        matches!(self, SimError::Solver(e) if e.is_integration_failure())
    }
}
