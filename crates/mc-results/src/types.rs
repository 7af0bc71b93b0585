//! Result data types.

use mc_core::{Real, TimeGrid};
use mc_graph::DataTable;
use mc_sim::{SolveReport, Solver, SolverOptions};
use serde::{Deserialize, Serialize};

use crate::{ResultsError, ResultsResult};

pub type RunId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    /// Name of the solved network.
    pub network: String,
    pub timestamp: String,
    /// Quantity names, in the order of every record's `values`.
    pub columns: Vec<String>,
    pub grid: TimeGrid,
    pub steps_per_cycle: usize,
    pub options: SolverOptions,
    pub report: SolveReport,
    pub solver_version: String,
}

impl RunManifest {
    /// Describe the last solve of `solver`.
    pub fn for_solver(run_id: RunId, solver: &Solver, solver_version: &str) -> ResultsResult<Self> {
        let report = solver.report().ok_or(ResultsError::NotSolved)?;
        let network = solver.network();
        let grid = *network.grid();
        Ok(Self {
            run_id,
            network: network.name().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            columns: network.all_quantity_names().to_vec(),
            grid,
            steps_per_cycle: grid.steps_per_cycle(),
            options: solver.options().clone(),
            report: report.clone(),
            solver_version: solver_version.to_string(),
        })
    }

    /// Rows a complete time series of this run holds.
    pub fn expected_rows(&self) -> usize {
        self.report.cycles * self.steps_per_cycle + 1
    }
}

/// One row of the data table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesRecord {
    pub time_s: Real,
    pub values: Vec<Real>,
}

/// One record per table row, values in column order.
pub fn records_from_table(table: &DataTable) -> Vec<TimeseriesRecord> {
    table
        .times()
        .iter()
        .enumerate()
        .map(|(row, &time_s)| TimeseriesRecord {
            time_s,
            values: table.row(row),
        })
        .collect()
}

/// Rebuild a data table from persisted records.
pub fn table_from_records(
    manifest: &RunManifest,
    records: &[TimeseriesRecord],
) -> ResultsResult<DataTable> {
    let malformed = |what: String| ResultsError::Malformed {
        run_id: manifest.run_id.clone(),
        what,
    };
    let n_cols = manifest.columns.len();
    let mut columns = vec![Vec::with_capacity(records.len()); n_cols];
    for (row, record) in records.iter().enumerate() {
        if record.values.len() != n_cols {
            return Err(malformed(format!(
                "row {row} has {} values for {n_cols} columns",
                record.values.len()
            )));
        }
        for (column, &v) in columns.iter_mut().zip(&record.values) {
            column.push(v);
        }
    }
    let times = records.iter().map(|r| r.time_s).collect();
    DataTable::from_parts(times, manifest.columns.clone(), columns)
        .map_err(|e| malformed(e.to_string()))
}
