//! mc-results: persisted runs, time-series storage and CSV export.

pub mod export;
pub mod hash;
pub mod store;
pub mod types;

pub use export::{export_csv, write_csv};
pub use hash::compute_run_id;
pub use store::RunStore;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Solver has no report yet; solve before saving")]
    NotSolved,

    #[error("Malformed run {run_id}: {what}")]
    Malformed { run_id: String, what: String },
}
