//! Destroy command - Tear down backend infrastructure.

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::info;

use kaos_infra::{CleanupOutcome, Provider};

use super::Context;

#[derive(Args)]
pub struct DestroyArgs {
    /// Target provider (docker, minikube, aws, gcp)
    #[arg(short, long)]
    pub provider: Provider,

    /// Environment to destroy
    #[arg(short, long)]
    pub env: String,
}

pub async fn execute(ctx: &Context, args: DestroyArgs) -> Result<()> {
    info!("Destroying {} infrastructure for {}", args.provider, args.env);

    let engine = ctx.engine().await?;
    let mut backend = ctx.backend(engine)?;

    let report = backend
        .destroy(args.provider, &args.env, ctx.verbose)
        .await
        .with_context(|| format!("Failed to destroy {} infrastructure", args.provider))?;

    if let CleanupOutcome::Failed(reason) = &report.cleanup {
        eprintln!("⚠️  Backend resources may not have been released: {}", reason);
    }
    for path in &report.leftovers {
        eprintln!("⚠️  Could not remove {}", path.display());
    }

    println!("✅ Backend for '{}' destroyed", args.env);
    Ok(())
}
