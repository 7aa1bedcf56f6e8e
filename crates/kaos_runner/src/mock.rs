//! Mock IaC engine for testing.
//!
//! Provides a configurable mock implementation of the IacEngine trait
//! for use in unit tests without requiring a Terraform installation.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{RunnerError, RunnerResult};
use crate::runner::IacEngine;

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub method: String,
    pub dir: PathBuf,
    pub workspace: Option<String>,
    pub vars: Option<Vec<String>>,
}

/// Mock IaC engine for testing.
///
/// Captures every call and succeeds unless a failure was configured for the
/// method. Workspaces created through `new_workspace` are remembered, and
/// `apply` can write an output artifact the way real templates do. With
/// [`with_engine_artifacts`](Self::with_engine_artifacts) it also leaves
/// `.terraform/`, workspace state and `terraform.tfstate` in the working
/// directory like Terraform itself.
#[derive(Clone, Default)]
pub struct MockEngine {
    verbose: Arc<AtomicBool>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    /// Workspaces that "exist", keyed by working directory.
    workspaces: Arc<RwLock<HashMap<PathBuf, HashSet<String>>>>,
    /// Simulated failures keyed by method name.
    failures: Arc<RwLock<HashMap<String, String>>>,
    /// File written on successful apply.
    apply_output: Arc<RwLock<Option<(PathBuf, String)>>>,
    /// Write Terraform's own files into the working directory.
    engine_artifacts: Arc<AtomicBool>,
}

impl MockEngine {
    /// Create a new mock engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `method` fail with the given message.
    pub fn fail_on(self, method: &str, message: impl Into<String>) -> Self {
        self.failures.write().insert(method.to_string(), message.into());
        self
    }

    /// Pre-register a workspace in a directory.
    pub fn add_workspace(self, dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        self.workspaces
            .write()
            .entry(dir.into())
            .or_default()
            .insert(name.into());
        self
    }

    /// Write `contents` to `path` whenever apply succeeds.
    pub fn with_apply_output(self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        *self.apply_output.write() = Some((path.into(), contents.into()));
        self
    }

    /// Leave `.terraform/`, `terraform.tfstate.d/<name>` and
    /// `terraform.tfstate[.backup]` in the working directory.
    pub fn with_engine_artifacts(self) -> Self {
        self.engine_artifacts.store(true, Ordering::SeqCst);
        self
    }

    fn writes_artifacts(&self) -> bool {
        self.engine_artifacts.load(Ordering::SeqCst)
    }

    /// Current verbosity flag.
    pub fn is_verbose(&self) -> bool {
        self.verbose.load(Ordering::SeqCst)
    }

    /// Clear all captured calls.
    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Method names in call order.
    pub fn call_sequence(&self) -> Vec<String> {
        self.captured_calls
            .read()
            .iter()
            .map(|c| c.method.clone())
            .collect()
    }

    /// Check if a specific method was called.
    pub fn was_called(&self, method: &str) -> bool {
        self.captured_calls
            .read()
            .iter()
            .any(|c| c.method == method)
    }

    /// Get calls to a specific method.
    pub fn get_method_calls(&self, method: &str) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    fn record_call(&self, method: &str, dir: &Path, workspace: Option<&str>, vars: Option<&[String]>) {
        self.captured_calls.write().push(CapturedCall {
            method: method.to_string(),
            dir: dir.to_path_buf(),
            workspace: workspace.map(str::to_string),
            vars: vars.map(<[String]>::to_vec),
        });
    }

    fn check_failure(&self, method: &str) -> RunnerResult<()> {
        if let Some(msg) = self.failures.read().get(method) {
            return Err(RunnerError::CommandFailed {
                command: method.to_string(),
                exit_code: 1,
                output: msg.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl IacEngine for MockEngine {
    fn set_verbose(&self, verbose: bool) {
        self.verbose.store(verbose, Ordering::SeqCst);
    }

    async fn init(&self, dir: &Path) -> RunnerResult<()> {
        self.record_call("init", dir, None, None);
        self.check_failure("init")?;

        if self.writes_artifacts() {
            std::fs::create_dir_all(dir.join(".terraform").join("providers"))?;
        }
        Ok(())
    }

    async fn workspace_exists(&self, dir: &Path, name: &str) -> RunnerResult<bool> {
        self.record_call("workspace_exists", dir, Some(name), None);
        self.check_failure("workspace_exists")?;
        Ok(self
            .workspaces
            .read()
            .get(dir)
            .map(|names| names.contains(name))
            .unwrap_or(false))
    }

    async fn new_workspace(&self, dir: &Path, name: &str) -> RunnerResult<()> {
        self.record_call("new_workspace", dir, Some(name), None);
        self.check_failure("new_workspace")?;
        self.workspaces
            .write()
            .entry(dir.to_path_buf())
            .or_default()
            .insert(name.to_string());

        if self.writes_artifacts() {
            std::fs::create_dir_all(dir.join("terraform.tfstate.d").join(name))?;
        }
        Ok(())
    }

    async fn select_workspace(&self, dir: &Path, name: &str) -> RunnerResult<()> {
        self.record_call("select_workspace", dir, Some(name), None);
        self.check_failure("select_workspace")
    }

    async fn plan(&self, dir: &Path, vars: &[String]) -> RunnerResult<()> {
        self.record_call("plan", dir, None, Some(vars));
        self.check_failure("plan")
    }

    async fn apply(&self, dir: &Path, vars: &[String]) -> RunnerResult<()> {
        self.record_call("apply", dir, None, Some(vars));
        self.check_failure("apply")?;

        if self.writes_artifacts() {
            std::fs::write(dir.join("terraform.tfstate"), "{}")?;
            std::fs::write(dir.join("terraform.tfstate.backup"), "{}")?;
        }
        if let Some((path, contents)) = self.apply_output.read().clone() {
            std::fs::write(path, contents)?;
        }
        Ok(())
    }

    async fn destroy(&self, dir: &Path, vars: &[String]) -> RunnerResult<()> {
        self.record_call("destroy", dir, None, Some(vars));
        self.check_failure("destroy")
    }
}
