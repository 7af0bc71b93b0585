//! Error types for numerical operations.

use mc_core::{McError, Real};
use thiserror::Error;

/// Errors raised by the numerical kernels.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: String },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    #[error("Step size {h:e} too small at t = {t}")]
    StepTooSmall { t: Real, h: Real },

    #[error("Integration failed at t = {t}: {what}")]
    IntegrationFailed { t: Real, what: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Model evaluation failed: {message}")]
    Model { message: String },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<McError> for SolverError {
    fn from(e: McError) -> Self {
        SolverError::Numeric {
            what: e.to_string(),
        }
    }
}

impl SolverError {
    /// Integrator failures that a cycle driver reports as non-convergence.
    pub fn is_integration_failure(&self) -> bool {
        matches!(
            self,
            SolverError::StepTooSmall { .. }
                | SolverError::IntegrationFailed { .. }
                | SolverError::ConvergenceFailed { .. }
                | SolverError::Numeric { .. }
        )
    }
}
