use std::fmt;
use thiserror::Error;

use super::config::ConfigError;
use crate::core::models::mesh::MeshError;
use crate::solvers::SolverError;

/// Which collaborator a solver failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverKind {
    Fluid,
    Solid,
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverKind::Fluid => write!(f, "Fluid"),
            SolverKind::Solid => write!(f, "Solid"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),

    #[error("{solver} solver failed after t = {last_completed_time}: {source}")]
    SolverDivergence {
        solver: SolverKind,
        last_completed_time: f64,
        #[source]
        source: SolverError,
    },

    #[error("Coupling phase '{phase}' violated an invariant: {reason}")]
    Assertion { phase: &'static str, reason: String },
}
