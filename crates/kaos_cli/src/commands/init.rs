//! Init command - Attach to an already running backend.

use anyhow::Result;
use clap::Args;

use super::Context;

#[derive(Args)]
pub struct InitArgs {
    /// Backend URL (e.g. http://10.0.0.4:8080/api)
    #[arg(short, long)]
    pub url: String,

    /// Auth token (generated when omitted)
    #[arg(short, long)]
    pub token: Option<String>,
}

pub fn execute(ctx: &Context, args: InitArgs) -> Result<()> {
    let token = args
        .token
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let mut backend = ctx.state_backend()?;
    backend.init(args.url.trim_end_matches('/'), &token)?;

    println!("✅ Attached to backend at {}", args.url);
    Ok(())
}
