//! Error types for state persistence.

use thiserror::Error;

/// Result type alias for state operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur while reading or writing provisioning state.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("State not created: {0}")]
    NotCreated(String),

    #[error("Invalid state file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("State serialization failed: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
