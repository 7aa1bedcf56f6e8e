//! Build command - Provision backend infrastructure.

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::info;

use kaos_infra::{BuildRequest, Provider};

use super::Context;

#[derive(Args)]
pub struct BuildArgs {
    /// Target provider (docker, minikube, aws, gcp)
    #[arg(short, long)]
    pub provider: Provider,

    /// Environment to deploy (e.g. dev, prod)
    #[arg(short, long)]
    pub env: String,

    /// Keep Terraform state in a local backend instead of the remote one
    #[arg(long)]
    pub local_backend: bool,
}

pub async fn execute(ctx: &Context, args: BuildArgs) -> Result<()> {
    info!("Building {} infrastructure for {}", args.provider, args.env);

    let engine = ctx.engine().await?;
    let mut backend = ctx.backend(engine)?;

    let request = BuildRequest::new(args.provider, &args.env)
        .local_backend(args.local_backend)
        .verbose(ctx.verbose);

    let report = backend
        .build(&request)
        .await
        .with_context(|| format!("Failed to build {} infrastructure", args.provider))?;

    println!("✅ Backend for '{}' deployed!", args.env);
    println!();
    println!("URL:   {}", report.url);
    println!("Token: {}", report.token);

    Ok(())
}
