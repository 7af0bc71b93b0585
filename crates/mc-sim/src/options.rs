//! Solver configuration.

use mc_core::{Real, TimeGrid};
use mc_solver::{LmConfig, Method, OdeOptions};
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Options applied by [`Solver::setup`](crate::Solver::setup).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Refine secondary quantities with Levenberg–Marquardt after the
    /// fixed-point passes.
    pub optimize_secondary: bool,
    /// Cycle-to-cycle normalized difference below which a cycle counts as converged
    pub step_tol: Real,
    pub method: Method,
    pub atol: Real,
    pub rtol: Real,
    /// Columns compared between cycles (default: every principal quantity)
    pub monitored: Option<Vec<String>>,
    /// Fixed-point passes over the secondary quantities per evaluation
    pub sub_iterations: usize,
    /// Cycles that must complete before convergence may stop the solve
    pub min_cycles: usize,
    /// Lower bound on the amplitude used to normalize cycle differences
    pub norm_floor: Real,
    /// Integrator step cap (default: the sampling interval)
    pub max_step: Option<Real>,
    pub lm: LmConfig,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            optimize_secondary: false,
            step_tol: 1e-3,
            method: Method::Auto,
            atol: 1e-6,
            rtol: 1e-6,
            monitored: None,
            sub_iterations: 1,
            min_cycles: 1,
            norm_floor: 1e-6,
            max_step: None,
            lm: LmConfig::default(),
        }
    }
}

impl SolverOptions {
    pub fn validate(&self) -> SimResult<()> {
        let invalid = |what: &str| {
            Err(SimError::InvalidOption {
                what: what.to_string(),
            })
        };
        if !(self.step_tol > 0.0 && self.step_tol.is_finite()) {
            return invalid("step_tol must be positive");
        }
        if !(self.atol > 0.0 && self.rtol > 0.0) {
            return invalid("atol and rtol must be positive");
        }
        if self.sub_iterations == 0 {
            return invalid("sub_iterations must be at least 1");
        }
        if self.min_cycles == 0 {
            return invalid("min_cycles must be at least 1");
        }
        if !(self.norm_floor > 0.0) {
            return invalid("norm_floor must be positive");
        }
        if let Some(h) = self.max_step
            && !(h > 0.0 && h.is_finite())
        {
            return invalid("max_step must be positive");
        }
        Ok(())
    }

    /// Integrator options for one cycle on `grid`.
    pub fn ode_options(&self, grid: &TimeGrid) -> OdeOptions {
        OdeOptions {
            method: self.method,
            atol: self.atol,
            rtol: self.rtol,
            max_step: Some(self.max_step.unwrap_or(grid.dt)),
            ..OdeOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let opts = SolverOptions::default();
        opts.validate().unwrap();
        assert_eq!(opts.sub_iterations, 1);
        assert!(!opts.optimize_secondary);
    }

    #[test]
    fn max_step_defaults_to_dt() {
        let grid = TimeGrid::new(2, 1.0, 0.01).unwrap();
        let ode = SolverOptions::default().ode_options(&grid);
        assert_eq!(ode.max_step, Some(0.01));
    }

    #[test]
    fn rejects_bad_values() {
        let opts = SolverOptions {
            step_tol: 0.0,
            ..Default::default()
        };
        assert!(matches!(opts.validate(), Err(SimError::InvalidOption { .. })));
        let opts = SolverOptions {
            max_step: Some(-1.0),
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let opts: SolverOptions =
            serde_json::from_str(r#"{"optimize_secondary": true, "method": "TrBdf2"}"#).unwrap();
        assert!(opts.optimize_secondary);
        assert_eq!(opts.method, Method::TrBdf2);
        assert_eq!(opts.step_tol, 1e-3);
    }
}
