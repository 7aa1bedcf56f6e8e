//! Error types for provisioning operations.

use kaos_runner::RunnerError;
use kaos_state::StateError;
use thiserror::Error;

/// Result type alias for provisioning operations.
pub type InfraResult<T> = Result<T, InfraError>;

/// Errors that can occur while provisioning or tearing down a backend.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Hostname error: {0}")]
    Hostname(String),

    #[error("Provisioning failed: {0}")]
    Provisioning(#[from] RunnerError),

    #[error("Invalid output artifact: {0}")]
    InvalidOutput(String),

    #[error("Resource cleanup failed: {0}")]
    Cleanup(String),

    #[error("Workspace copy failed: {0}")]
    Copy(String),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Invalid kaos.toml: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InfraError {
    /// Create a configuration error with the given message
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
