//! CLI command definitions.
//!
//! This module defines the command structure for the kaos CLI and the
//! context every subcommand is built from.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use kaos_infra::{Backend, HttpResourceCleaner, KaosConfig, ProjectLayout, ProviderCredentials};
use kaos_runner::{IacEngine, TerraformCli, TerraformOptions};

pub mod build;
pub mod destroy;
pub mod init;
pub mod show;

/// kaos - provision and tear down backend infrastructure
#[derive(Parser)]
#[command(name = "kaos")]
#[command(version, about = "kaos - provision and tear down backend infrastructure")]
#[command(long_about = r#"
kaos provisions the infrastructure behind a kaos backend with Terraform and
records how to reach it.

WORKFLOWS:
  build    → init, select workspace, plan and apply; record the backend URL
  destroy  → release backend resources, destroy, remove generated files
  init     → attach to an already running backend
  show     → print the recorded backend URL, user, token or kubeconfig

PROVIDERS:
  docker, minikube (local)   aws, gcp (cloud, one workspace per environment)

EXIT CODES:
  0 - Success
  1 - General error
  2 - Configuration error
  3 - Provisioning error
  4 - Endpoint error
  5 - State error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (also streams Terraform output)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root (defaults to the current directory)
    #[arg(long, global = true, env = "KAOS_ROOT")]
    pub root: Option<PathBuf>,

    /// Terraform executable to use
    #[arg(long, global = true, env = "KAOS_TERRAFORM_BIN")]
    pub terraform_bin: Option<String>,

    #[command(flatten)]
    pub credentials: CredentialArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Provision backend infrastructure
    Build(build::BuildArgs),

    /// Destroy backend infrastructure
    Destroy(destroy::DestroyArgs),

    /// Attach to an existing backend
    Init(init::InitArgs),

    /// Show recorded backend state
    Show(show::ShowArgs),
}

/// Cloud credentials, read from the usual provider variables.
#[derive(Args, Debug, Clone, Default)]
pub struct CredentialArgs {
    #[arg(long, global = true, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub aws_access_key_id: Option<String>,

    #[arg(long, global = true, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub aws_secret_access_key: Option<String>,

    #[arg(long, global = true, env = "AWS_DEFAULT_REGION")]
    pub aws_region: Option<String>,

    #[arg(long, global = true, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    pub google_credentials: Option<String>,
}

impl From<&CredentialArgs> for ProviderCredentials {
    fn from(args: &CredentialArgs) -> Self {
        ProviderCredentials {
            access_key_id: args.aws_access_key_id.clone(),
            secret_access_key: args.aws_secret_access_key.clone(),
            region: args.aws_region.clone(),
            credentials_path: args.google_credentials.clone(),
        }
    }
}

/// Everything resolved from global flags and `kaos.toml`.
pub struct Context {
    pub verbose: bool,
    pub layout: ProjectLayout,
    pub credentials: ProviderCredentials,
    pub terraform: TerraformOptions,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let root = match &cli.root {
            Some(root) => root.clone(),
            None => std::env::current_dir().context("Failed to read current directory")?,
        };

        let config = KaosConfig::load(&root).context("Failed to load kaos.toml")?;
        let layout = ProjectLayout::from_config(&root, &config)?;

        let mut terraform = TerraformOptions::default();
        if let Some(binary) = cli.terraform_bin.as_ref().or(config.terraform.binary.as_ref()) {
            terraform = terraform.binary(binary.clone());
        }

        debug!("Project root: {:?}", layout.root());
        Ok(Self {
            verbose: cli.verbose,
            layout,
            credentials: ProviderCredentials::from(&cli.credentials),
            terraform,
        })
    }

    /// Terraform engine, checked to be runnable.
    pub async fn engine(&self) -> Result<Arc<dyn IacEngine>> {
        let engine = TerraformCli::new(self.terraform.clone());
        engine.ensure_available().await?;
        Ok(Arc::new(engine))
    }

    pub fn backend(&self, engine: Arc<dyn IacEngine>) -> Result<Backend> {
        let cleaner = HttpResourceCleaner::new()?;
        let backend = Backend::new(
            self.layout.clone(),
            self.credentials.clone(),
            engine,
            Arc::new(cleaner),
        )?;
        Ok(backend)
    }

    /// Backend for state-only commands; never runs Terraform.
    pub fn state_backend(&self) -> Result<Backend> {
        self.backend(Arc::new(TerraformCli::new(self.terraform.clone())))
    }
}
