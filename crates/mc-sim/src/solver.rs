//! Cyclic steady-state driver.

use mc_core::timing::{AccumulatingTimer, Timer};
use mc_core::{McError, Real, normalized_max_diff};
use mc_graph::Network;
use mc_solver::integrate;
use tracing::{debug, info, warn};

use crate::assembly::Assembly;
use crate::error::{SimError, SimResult};
use crate::field::VectorField;
use crate::options::SolverOptions;
use crate::report::{CycleOutcome, SolveReport};

/// Integrates a configured network one cycle at a time until successive
/// cycles agree on the monitored quantities.
///
/// The solver owns the network; its data table holds the trajectory after
/// [`solve`](Solver::solve) and is truncated to the cycles actually computed.
pub struct Solver {
    network: Network,
    options: SolverOptions,
    assembly: Option<Assembly>,
    monitored: Vec<usize>,
    converged: bool,
    last_converged_cycle: usize,
    report: Option<SolveReport>,
    /// Initial row before secondary resolution; the starting point of every
    /// later resolution.
    baseline: Vec<Real>,
    cycle_timer: AccumulatingTimer,
}

impl Solver {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            options: SolverOptions::default(),
            assembly: None,
            monitored: Vec::new(),
            converged: false,
            last_converged_cycle: 0,
            report: None,
            baseline: Vec::new(),
            cycle_timer: AccumulatingTimer::new(),
        }
    }

    /// Validate `options`, assemble the network and pick the monitored
    /// columns.
    pub fn setup(&mut self, options: SolverOptions) -> SimResult<&Assembly> {
        let timer = Timer::start("setup");
        options.validate()?;
        let assembly = Assembly::build(&self.network)?;

        self.monitored = match &options.monitored {
            Some(names) => names
                .iter()
                .map(|name| {
                    assembly
                        .column_of(name)
                        .ok_or_else(|| SimError::UnknownMonitor { name: name.clone() })
                })
                .collect::<SimResult<_>>()?,
            None => assembly.principal_ids().to_vec(),
        };

        if !options.optimize_secondary {
            for group in assembly.circular_groups() {
                let names: Vec<&str> = group.iter().map(|&c| assembly.names()[c].as_str()).collect();
                warn!(
                    quantities = ?names,
                    sub_iterations = options.sub_iterations,
                    "circular algebraic group resolved by fixed-point passes only"
                );
            }
        }

        self.options = options;
        self.converged = false;
        self.last_converged_cycle = 0;
        self.report = None;
        self.baseline.clear();
        timer.stop_and_log();
        Ok(self.assembly.insert(assembly))
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn into_network(self) -> Network {
        self.network
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub fn assembly(&self) -> Option<&Assembly> {
        self.assembly.as_ref()
    }

    /// Columns compared between cycles.
    pub fn monitored(&self) -> &[usize] {
        &self.monitored
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Number of cycles kept in the data table after the last solve.
    pub fn last_converged_cycle(&self) -> usize {
        self.last_converged_cycle
    }

    pub fn report(&self) -> Option<&SolveReport> {
        self.report.as_ref()
    }

    /// Run cycles from the initial state until convergence or until the
    /// grid's cycle budget is spent.
    ///
    /// Integrator failures end the solve early and are reported through
    /// [`SolveReport::failure`]; configuration problems are returned as errors.
    pub fn solve(&mut self) -> SimResult<SolveReport> {
        let timer = Timer::start("solve");
        let grid = *self.network.grid();
        self.initialize()?;
        self.cycle_timer.reset();

        let mut converged = false;
        let mut completed = 0;
        let mut cycle_errors = Vec::new();
        let mut failure = None;
        for cycle in 0..grid.n_cycles {
            match self.advance_cycle(cycle) {
                Ok(outcome) => {
                    completed = cycle + 1;
                    cycle_errors.push(outcome.error);
                    if outcome.converged && completed >= self.options.min_cycles {
                        converged = true;
                        break;
                    }
                }
                Err(e) if e.is_integration_failure() => {
                    warn!(cycle, error = %e, "integration failed, stopping");
                    failure = Some(e.to_string());
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        self.network
            .data_table_mut()
            .truncate(grid.rows_for_cycles(completed));
        self.finalize_secondary()?;

        self.converged = converged;
        self.last_converged_cycle = completed;
        let report = SolveReport {
            converged,
            cycles: completed,
            cycle_errors,
            failure,
            elapsed_s: timer.elapsed_s(),
        };
        if converged {
            info!(cycles = completed, error = ?report.final_error(), "reached periodic steady state");
        } else {
            info!(cycles = completed, error = ?report.final_error(), "stopped without convergence");
        }
        debug!(
            cycles = self.cycle_timer.count(),
            average_s = self.cycle_timer.average_seconds(),
            "cycle timing"
        );
        timer.stop_and_log();
        self.report = Some(report.clone());
        Ok(report)
    }

    /// Reset the table and compute the first row: explicit initial values,
    /// then init equations, then secondary quantities.
    pub fn initialize(&mut self) -> SimResult<()> {
        let assembly = self.assembly.as_ref().ok_or(SimError::NotSetUp)?;
        self.network.reset_table();
        let table = self.network.data_table_mut();
        let mut row = table.row(0);
        assembly.initialize(0.0, &mut row);
        self.baseline.clone_from(&row);
        assembly.resolve_secondary(0.0, &mut row, &self.options);
        table.write_row(0, &row);
        Ok(())
    }

    /// Integrate cycle `cycle` from the state at its first row and store its
    /// remaining rows.
    pub fn advance_cycle(&mut self, cycle: usize) -> SimResult<CycleOutcome> {
        let assembly = self.assembly.as_ref().ok_or(SimError::NotSetUp)?;
        if self.baseline.len() != assembly.n_cols() {
            return Err(SimError::NotInitialized);
        }
        let grid = *self.network.grid();
        let steps = grid.steps_per_cycle();
        let start = grid.cycle_start_row(cycle);
        let n_rows = self.network.data_table().n_rows();
        if start + steps >= n_rows {
            return Err(McError::IndexOob {
                what: "cycle end row",
                index: start + steps,
                len: n_rows,
            }
            .into());
        }

        let timer = Timer::start("cycle");
        let seed = self.network.data_table().row(start);
        let y0 = assembly.gather_principals(&seed);
        let times = grid.cycle_times(cycle);
        let mut field = VectorField::new(assembly, &self.options, grid.t_cycle, &self.baseline);
        let solution = integrate(&mut field, &times, y0, &self.options.ode_options(&grid))?;
        let rhs_evals = field.evaluations();

        let table = self.network.data_table_mut();
        let mut row = seed;
        for (k, y) in solution.y.iter().enumerate().skip(1) {
            assembly.restore_non_principal(&self.baseline, &mut row);
            assembly.scatter_principals(y, &mut row);
            assembly.resolve_secondary(grid.cycle_time(times[k]), &mut row, &self.options);
            table.write_row(start + k, &row);
        }
        self.cycle_timer.record(timer.elapsed_s());
        timer.stop_and_log();

        let error = (cycle > 0).then(|| self.cycle_error(cycle));
        let converged = error.is_some_and(|e| e < self.options.step_tol);
        debug!(
            cycle,
            error = ?error,
            rhs_evals,
            accepted = solution.stats.accepted,
            rejected = solution.stats.rejected,
            switched_at = ?solution.stats.switched_at,
            "cycle done"
        );
        Ok(CycleOutcome {
            cycle,
            error,
            converged,
            rhs_evals,
        })
    }

    /// Worst normalized difference between cycle `cycle` and the one before
    /// it over the monitored columns.
    fn cycle_error(&self, cycle: usize) -> Real {
        let grid = self.network.grid();
        let steps = grid.steps_per_cycle();
        let start = grid.cycle_start_row(cycle);
        let table = self.network.data_table();
        self.monitored
            .iter()
            .map(|&col| {
                let values = table.column(col);
                normalized_max_diff(
                    &values[start..=start + steps],
                    &values[start - steps..=start],
                    self.options.norm_floor,
                )
            })
            .fold(0.0, Real::max)
    }

    /// Re-resolve every row's secondary quantities against the final
    /// principal trajectory.
    fn finalize_secondary(&mut self) -> SimResult<()> {
        let assembly = self.assembly.as_ref().ok_or(SimError::NotSetUp)?;
        let grid = *self.network.grid();
        let table = self.network.data_table_mut();
        let mut row = vec![0.0; table.n_cols()];
        for r in 0..table.n_rows() {
            table.read_row(r, &mut row);
            assembly.restore_non_principal(&self.baseline, &mut row);
            assembly.resolve_secondary(grid.cycle_time(grid.time_at(r)), &mut row, &self.options);
            table.write_row(r, &row);
        }
        Ok(())
    }
}
