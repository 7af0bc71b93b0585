//! Outcome records of a solve.

use mc_core::Real;
use serde::{Deserialize, Serialize};

/// Result of advancing one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleOutcome {
    pub cycle: usize,
    /// Worst normalized difference to the previous cycle over the monitored
    /// columns (`None` for the first cycle).
    pub error: Option<Real>,
    pub converged: bool,
    pub rhs_evals: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    pub converged: bool,
    /// Cycles whose rows are kept in the data table.
    pub cycles: usize,
    pub cycle_errors: Vec<Option<Real>>,
    /// Message of the integrator failure that ended the solve, if any.
    pub failure: Option<String>,
    pub elapsed_s: f64,
}

impl SolveReport {
    /// Error of the last completed cycle.
    pub fn final_error(&self) -> Option<Real> {
        self.cycle_errors.last().copied().flatten()
    }
}
