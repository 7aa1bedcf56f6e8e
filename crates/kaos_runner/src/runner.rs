//! IaC engine trait and types.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RunnerResult;

/// Captured result of a single engine command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Exit code of the engine process
    pub exit_code: i32,
    /// Captured stdout (empty when streamed)
    pub stdout: String,
    /// Captured stderr (empty when streamed)
    pub stderr: String,
}

impl CommandOutput {
    /// Check if the command was successful (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Get combined output (stdout + stderr).
    pub fn combined_output(&self) -> String {
        if self.stdout.is_empty() {
            self.stderr.clone()
        } else if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Infrastructure-as-code engine.
///
/// Every operation runs inside `dir` and either completes or fails; callers
/// treat any error as fatal for the current lifecycle.
/// `vars` is a list of ready-made command line arguments
/// (`["--var", "key=value", ...]`).
#[async_trait]
pub trait IacEngine: Send + Sync {
    /// Toggle streaming of engine output to the terminal.
    fn set_verbose(&self, verbose: bool);

    /// Initialize the working directory (providers, backend).
    async fn init(&self, dir: &Path) -> RunnerResult<()>;

    /// Check whether a named workspace exists.
    async fn workspace_exists(&self, dir: &Path, name: &str) -> RunnerResult<bool>;

    /// Create a named workspace.
    async fn new_workspace(&self, dir: &Path, name: &str) -> RunnerResult<()>;

    /// Select a named workspace as active.
    async fn select_workspace(&self, dir: &Path, name: &str) -> RunnerResult<()>;

    /// Compute an execution plan.
    async fn plan(&self, dir: &Path, vars: &[String]) -> RunnerResult<()>;

    /// Apply changes without interactive approval.
    async fn apply(&self, dir: &Path, vars: &[String]) -> RunnerResult<()>;

    /// Destroy all managed infrastructure without interactive approval.
    async fn destroy(&self, dir: &Path, vars: &[String]) -> RunnerResult<()>;
}
