//! Error types for the runner module.

use thiserror::Error;

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors that can occur while driving the IaC engine.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Terraform not available: {0}")]
    NotAvailable(String),

    #[error("terraform {command} failed with exit code {exit_code}: {output}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        output: String,
    },

    #[error("Working directory not found: {0}")]
    MissingDirectory(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
