//! Cycle-based time discretization.
//!
//! A simulation spans at most `n_cycles` periods of length `t_cycle`, sampled
//! every `dt`. Row `i` of every time series corresponds to `t = i * dt`.

use crate::{McError, McResult, Real};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeGrid {
    /// Maximum number of cycles the solver may advance.
    pub n_cycles: usize,
    /// Period of the driving phenomenon (one heartbeat).
    pub t_cycle: Real,
    /// Output sampling interval.
    pub dt: Real,
}

impl Default for TimeGrid {
    fn default() -> Self {
        Self {
            n_cycles: 5,
            t_cycle: 1.0,
            dt: 0.01,
        }
    }
}

impl TimeGrid {
    /// Build and validate a grid.
    pub fn new(n_cycles: usize, t_cycle: Real, dt: Real) -> McResult<Self> {
        let grid = Self {
            n_cycles,
            t_cycle,
            dt,
        };
        grid.validate()?;
        Ok(grid)
    }

    pub fn validate(&self) -> McResult<()> {
        if self.n_cycles == 0 {
            return Err(McError::InvalidTimeGrid {
                what: "n_cycles must be at least 1".to_string(),
            });
        }
        if !(self.t_cycle.is_finite() && self.t_cycle > 0.0) {
            return Err(McError::InvalidTimeGrid {
                what: format!("t_cycle must be positive, got {}", self.t_cycle),
            });
        }
        if !(self.dt.is_finite() && self.dt > 0.0) || self.dt > self.t_cycle {
            return Err(McError::InvalidTimeGrid {
                what: format!("dt must lie in (0, t_cycle], got {}", self.dt),
            });
        }
        let ratio = self.t_cycle / self.dt;
        if (ratio - ratio.round()).abs() > 1e-9 * ratio.max(1.0) {
            return Err(McError::InvalidTimeGrid {
                what: format!(
                    "t_cycle ({}) is not an integer multiple of dt ({})",
                    self.t_cycle, self.dt
                ),
            });
        }
        Ok(())
    }

    /// Number of sampling intervals in one cycle.
    pub fn steps_per_cycle(&self) -> usize {
        (self.t_cycle / self.dt).round() as usize
    }

    /// Total number of rows for the full (untruncated) horizon.
    pub fn n_rows(&self) -> usize {
        self.rows_for_cycles(self.n_cycles)
    }

    /// Rows covering the first `cycles` cycles (shared boundary rows counted once).
    pub fn rows_for_cycles(&self, cycles: usize) -> usize {
        cycles * self.steps_per_cycle() + 1
    }

    /// Absolute time of row `row`.
    pub fn time_at(&self, row: usize) -> Real {
        row as Real * self.dt
    }

    /// First row of cycle `cycle` (0-based).
    pub fn cycle_start_row(&self, cycle: usize) -> usize {
        cycle * self.steps_per_cycle()
    }

    /// Time relative to the start of the current cycle, in `[0, t_cycle)`.
    pub fn cycle_time(&self, t: Real) -> Real {
        t.rem_euclid(self.t_cycle)
    }

    /// Sampling instants of cycle `cycle`, both ends included.
    pub fn cycle_times(&self, cycle: usize) -> Vec<Real> {
        let start = self.cycle_start_row(cycle);
        (start..=start + self.steps_per_cycle())
            .map(|row| self.time_at(row))
            .collect()
    }

    /// Sampling instants of the full horizon.
    pub fn times(&self) -> Vec<Real> {
        (0..self.n_rows()).map(|row| self.time_at(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_counts_rows() {
        let grid = TimeGrid::new(5, 1.0, 0.01).unwrap();
        assert_eq!(grid.steps_per_cycle(), 100);
        assert_eq!(grid.n_rows(), 501);
        assert_eq!(grid.rows_for_cycles(2), 201);
        assert_eq!(grid.cycle_start_row(3), 300);
    }

    #[test]
    fn grid_rejects_non_integral_ratio() {
        let err = TimeGrid::new(2, 1.0, 0.3).unwrap_err();
        assert!(err.to_string().contains("integer multiple"));
    }

    #[test]
    fn grid_rejects_zero_cycles() {
        assert!(TimeGrid::new(0, 1.0, 0.1).is_err());
    }

    #[test]
    fn cycle_time_wraps() {
        let grid = TimeGrid::new(3, 0.8, 0.001).unwrap();
        assert!((grid.cycle_time(1.0) - 0.2).abs() < 1e-12);
        assert!(grid.cycle_time(1.6).abs() < 1e-9 || (grid.cycle_time(1.6) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn cycle_times_include_both_ends() {
        let grid = TimeGrid::new(2, 1.0, 0.25).unwrap();
        let ts = grid.cycle_times(1);
        assert_eq!(ts, vec![1.0, 1.25, 1.5, 1.75, 2.0]);
    }
}
