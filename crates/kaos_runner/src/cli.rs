//! CLI-based Terraform engine.
//!
//! Runs the `terraform` executable (or a compatible replacement such as
//! `tofu`) as a child process in the requested working directory.

use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::TerraformOptions;
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{CommandOutput, IacEngine};

/// Terraform engine backed by the command line tool.
pub struct TerraformCli {
    options: TerraformOptions,
    verbose: AtomicBool,
}

impl TerraformCli {
    /// Create a new engine with the given options.
    pub fn new(options: TerraformOptions) -> Self {
        Self {
            options,
            verbose: AtomicBool::new(false),
        }
    }

    /// Check if verbose streaming is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose.load(Ordering::Relaxed)
    }

    /// Fail early when the executable cannot be run at all.
    pub async fn ensure_available(&self) -> RunnerResult<String> {
        let output = Command::new(&self.options.binary)
            .arg("version")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| RunnerError::NotAvailable(format!("{}: {}", self.options.binary, e)))?;

        if !output.status.success() {
            return Err(RunnerError::NotAvailable(format!(
                "{} version exited with {}",
                self.options.binary, output.status
            )));
        }

        let version = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();
        info!("Using {}", version);
        Ok(version)
    }

    /// Arguments for plan/apply/destroy.
    fn lifecycle_args(&self, command: &str, auto_approve: bool, vars: &[String]) -> Vec<String> {
        let mut args = vec![command.to_string(), "-input=false".to_string()];
        if auto_approve {
            args.push("-auto-approve".to_string());
        }
        if self.options.no_color {
            args.push("-no-color".to_string());
        }
        args.extend(vars.iter().cloned());
        args
    }

    /// Format command for logging.
    fn format_command(&self, args: &[String]) -> String {
        let mut cmd = self.options.binary.clone();
        for arg in args {
            if arg.contains(' ') {
                cmd.push_str(&format!(" '{}'", arg));
            } else {
                cmd.push_str(&format!(" {}", arg));
            }
        }
        cmd
    }

    /// Run a command, streaming output when verbose.
    async fn run(&self, dir: &Path, args: &[String]) -> RunnerResult<CommandOutput> {
        self.run_with(dir, args, self.is_verbose()).await
    }

    async fn run_with(&self, dir: &Path, args: &[String], stream: bool) -> RunnerResult<CommandOutput> {
        if !dir.is_dir() {
            return Err(RunnerError::MissingDirectory(dir.display().to_string()));
        }

        let mut cmd = Command::new(&self.options.binary);
        cmd.args(args).current_dir(dir).envs(&self.options.env);

        debug!("Executing in {:?}: {}", dir, self.format_command(args));

        let output = if stream {
            let status = cmd
                .stdin(Stdio::null())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .await
                .map_err(|e| self.spawn_error(e))?;

            CommandOutput {
                exit_code: status.code().unwrap_or(-1),
                ..Default::default()
            }
        } else {
            let output = cmd
                .stdin(Stdio::null())
                .output()
                .await
                .map_err(|e| self.spawn_error(e))?;

            CommandOutput {
                exit_code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            }
        };

        if !output.success() {
            return Err(RunnerError::CommandFailed {
                command: args.first().cloned().unwrap_or_default(),
                exit_code: output.exit_code,
                output: output.combined_output().trim().to_string(),
            });
        }

        Ok(output)
    }

    fn spawn_error(&self, e: std::io::Error) -> RunnerError {
        if e.kind() == std::io::ErrorKind::NotFound {
            RunnerError::NotAvailable(self.options.binary.clone())
        } else {
            RunnerError::ExecutionFailed(format!("Failed to spawn {}: {}", self.options.binary, e))
        }
    }
}

/// Parse `terraform workspace list` output into workspace names.
///
/// The active workspace is prefixed with `*`.
pub fn parse_workspace_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl IacEngine for TerraformCli {
    fn set_verbose(&self, verbose: bool) {
        self.verbose.store(verbose, Ordering::Relaxed);
    }

    async fn init(&self, dir: &Path) -> RunnerResult<()> {
        info!("Running terraform init in {:?}", dir);
        let mut args = vec!["init".to_string(), "-input=false".to_string()];
        if self.options.no_color {
            args.push("-no-color".to_string());
        }
        self.run(dir, &args).await?;
        Ok(())
    }

    async fn workspace_exists(&self, dir: &Path, name: &str) -> RunnerResult<bool> {
        // Always captured, the listing has to be parsed.
        let args = vec!["workspace".to_string(), "list".to_string()];
        let output = self.run_with(dir, &args, false).await?;
        Ok(parse_workspace_list(&output.stdout).iter().any(|w| w == name))
    }

    async fn new_workspace(&self, dir: &Path, name: &str) -> RunnerResult<()> {
        info!("Creating terraform workspace {}", name);
        let args = vec!["workspace".to_string(), "new".to_string(), name.to_string()];
        self.run(dir, &args).await?;
        Ok(())
    }

    async fn select_workspace(&self, dir: &Path, name: &str) -> RunnerResult<()> {
        info!("Selecting terraform workspace {}", name);
        let args = vec!["workspace".to_string(), "select".to_string(), name.to_string()];
        self.run(dir, &args).await?;
        Ok(())
    }

    async fn plan(&self, dir: &Path, vars: &[String]) -> RunnerResult<()> {
        info!("Running terraform plan in {:?}", dir);
        self.run(dir, &self.lifecycle_args("plan", false, vars)).await?;
        Ok(())
    }

    async fn apply(&self, dir: &Path, vars: &[String]) -> RunnerResult<()> {
        info!("Running terraform apply in {:?}", dir);
        self.run(dir, &self.lifecycle_args("apply", true, vars)).await?;
        Ok(())
    }

    async fn destroy(&self, dir: &Path, vars: &[String]) -> RunnerResult<()> {
        info!("Running terraform destroy in {:?}", dir);
        self.run(dir, &self.lifecycle_args("destroy", true, vars)).await?;
        Ok(())
    }
}
