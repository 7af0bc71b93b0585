//! Content-based hashing for run IDs.

use mc_core::TimeGrid;
use mc_sim::SolverOptions;
use sha2::{Digest, Sha256};

/// Run id derived from everything that determines a run's output.
pub fn compute_run_id(
    network: &str,
    columns: &[String],
    grid: &TimeGrid,
    options: &SolverOptions,
    solver_version: &str,
) -> String {
    let mut hasher = Sha256::new();

    hasher.update(network.as_bytes());
    for column in columns {
        hasher.update(column.as_bytes());
        hasher.update([0]);
    }

    let grid_json = serde_json::to_string(grid).unwrap_or_default();
    hasher.update(grid_json.as_bytes());

    let options_json = serde_json::to_string(options).unwrap_or_default();
    hasher.update(options_json.as_bytes());

    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
