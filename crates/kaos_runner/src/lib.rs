//! # kaos_runner
//!
//! Terraform execution wrapper for kaos.
//!
//! This crate defines the [`IacEngine`] seam the provisioning lifecycle is
//! written against, and ships two implementations of it.
//!
//! # Features
//!
//! - **CLI engine**: drives `terraform` (or a compatible binary) as a child process
//! - **Verbose toggle**: stream engine output or capture it for error reports
//! - **Mock engine**: for testing without a Terraform installation
//!
//! # Example
//!
//! ```rust,no_run
//! use kaos_runner::{IacEngine, TerraformCli, TerraformOptions};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = TerraformCli::new(TerraformOptions::default());
//!     engine.set_verbose(true);
//!
//!     let dir = Path::new("infrastructure/docker");
//!     engine.init(dir).await?;
//!     engine.plan(dir, &["--var".to_string(), "config_dir=/srv/kaos".to_string()]).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod mock;
pub mod runner;

pub use cli::{parse_workspace_list, TerraformCli};
pub use config::TerraformOptions;
pub use error::{RunnerError, RunnerResult};
pub use mock::{CapturedCall, MockEngine};
pub use runner::{CommandOutput, IacEngine};
