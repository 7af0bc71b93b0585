use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] mc_core::McError),

    #[error(transparent)]
    Component(#[from] mc_components::ComponentError),

    #[error(transparent)]
    Graph(#[from] mc_graph::GraphError),

    #[error(transparent)]
    Sim(#[from] mc_sim::SimError),

    #[error(transparent)]
    Results(#[from] mc_results::ResultsError),
}

pub type CliResult<T> = Result<T, CliError>;

/// Parse a JSON file into `T`.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> CliResult<T> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}
