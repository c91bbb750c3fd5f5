use thiserror::Error;

use super::config::ConfigError;
use crate::core::energy::model::ObjectiveError;
use crate::core::models::error::ModelError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid shell specification: {0}")]
    InvalidShellSpec(String),

    #[error("Invalid scheme: {source}")]
    Model {
        #[from]
        source: ModelError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Exact solver unavailable: {0}")]
    SolverUnavailable(String),

    #[error("Internal inconsistency in '{phase}': {reason}")]
    InternalInconsistency { phase: &'static str, reason: String },
}

impl From<ObjectiveError> for EngineError {
    fn from(source: ObjectiveError) -> Self {
        EngineError::InternalInconsistency {
            phase: "objective",
            reason: source.to_string(),
        }
    }
}
