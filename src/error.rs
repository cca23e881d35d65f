//! Error handling for the resume optimizer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResumeOptimizerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed run input, rejected before any stage runs
    #[error("Validation error: {0}")]
    Validation(String),

    /// Failure inside an external collaborator (fetch, parse, retrieval)
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Run context not found: {0}")]
    ContextNotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Rendering error: {0}")]
    Rendering(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, ResumeOptimizerError>;

/// Convert anyhow errors to our custom error type
impl From<anyhow::Error> for ResumeOptimizerError {
    fn from(err: anyhow::Error) -> Self {
        ResumeOptimizerError::Collaborator(err.to_string())
    }
}

impl From<toml::de::Error> for ResumeOptimizerError {
    fn from(err: toml::de::Error) -> Self {
        ResumeOptimizerError::Configuration(format!("Failed to parse config: {}", err))
    }
}
