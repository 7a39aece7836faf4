//! Error types for mlpanel-core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MlpanelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(not(target_arch = "wasm32"))]
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(not(target_arch = "wasm32"))]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Run already registered: {0}")]
    RunExists(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Experiment not found on tracking server: {0}")]
    ExperimentNotFound(String),

    #[error("Tracking server error: {0}")]
    Mlflow(String),

    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Invalid operator params: {0}")]
    InvalidParams(String),
}

pub type Result<T> = std::result::Result<T, MlpanelError>;
