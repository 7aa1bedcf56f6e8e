//! # kaos_infra
//!
//! Provisioning lifecycle orchestration for kaos backends.
//!
//! This crate sequences Terraform runs for a provider/environment pair,
//! resolves where the deployed backend is reachable, and records it in the
//! project state.
//!
//! ## Features
//!
//! - Docker, Minikube, AWS and GCP targets
//! - Per-environment working copies and Terraform workspaces for cloud targets
//! - Endpoint resolution from the templates' `config.json` output
//! - Best-effort resource release on the running backend before destroy
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kaos_infra::{Backend, BuildRequest, HttpResourceCleaner, ProjectLayout, Provider, ProviderCredentials};
//! use kaos_runner::{TerraformCli, TerraformOptions};
//!
//! # async fn run() -> kaos_infra::InfraResult<()> {
//! let layout = ProjectLayout::new(".")?;
//! let mut backend = Backend::new(
//!     layout,
//!     ProviderCredentials::new(),
//!     Arc::new(TerraformCli::new(TerraformOptions::default())),
//!     Arc::new(HttpResourceCleaner::new()?),
//! )?;
//!
//! let report = backend.build(&BuildRequest::new(Provider::Docker, "dev")).await?;
//! println!("backend at {}", report.url);
//! # Ok(())
//! # }
//! ```

pub mod cleanup;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod lifecycle;
pub mod provider;
pub mod variables;
pub mod workspace;

pub use cleanup::{resources_url, HttpResourceCleaner, ResourceCleaner};
pub use config::{validate_environment, KaosConfig, ProjectLayout, ProviderCredentials};
pub use endpoint::{parse_endpoint, resolve_endpoint, ResolvedEndpoint};
pub use error::{InfraError, InfraResult};
pub use lifecycle::{Backend, BuildReport, BuildRequest, CleanupOutcome, DestroyReport};
pub use provider::Provider;
pub use variables::{build_variables, IacVariables};
pub use workspace::{Purpose, WorkspaceManager};
