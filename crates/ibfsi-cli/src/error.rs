use ibfsi::core::models::mesh::MeshError;
use ibfsi::engine::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to build the scenario meshes: {0}")]
    Mesh(#[from] MeshError),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write history: {0}")]
    History(#[from] csv::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
