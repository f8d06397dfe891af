// Errors raised while assembling, solving and reporting a ground station problem

use crate::domain::solver_service::SolverError;

#[derive(Debug, thiserror::Error)]
pub enum OptimizerError {
    /// Invalid component parameters, raised at construction
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A required provider/station/satellite could not be matched in the catalog
    #[error("{kind} '{key}' not found")]
    NotFound { kind: &'static str, key: String },

    /// An entity references another entity that was never registered
    #[error("{kind} '{id}' references unknown {target} '{target_id}'")]
    UnknownEntity {
        kind: &'static str,
        id: String,
        target: &'static str,
        target_id: String,
    },

    #[error("Objective function not set. Set an objective before generating the problem")]
    ObjectiveNotSet,

    #[error("Invalid optimizer state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl OptimizerError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        OptimizerError::Config(message.into())
    }

    pub(crate) fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        OptimizerError::NotFound {
            kind,
            key: key.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OptimizerError>;
