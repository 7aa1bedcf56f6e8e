//! Show command - Print recorded backend state.

use anyhow::{Context as _, Result};
use clap::{Args, ValueEnum};

use kaos_infra::Backend;

use super::Context;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Field {
    Url,
    User,
    Token,
    Kubeconfig,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Print a single value (raw, for scripting)
    pub field: Option<Field>,
}

fn value(backend: &Backend, field: Field) -> Option<&str> {
    match field {
        Field::Url => backend.url(),
        Field::User => backend.user(),
        Field::Token => backend.token(),
        Field::Kubeconfig => backend.kubeconfig(),
    }
}

pub fn execute(ctx: &Context, args: ShowArgs) -> Result<()> {
    let backend = ctx.state_backend()?;
    backend
        .require_created()
        .context("No backend recorded; run `kaos build` or `kaos init` first")?;

    match args.field {
        Some(field) => {
            let value = value(&backend, field)
                .ok_or_else(|| anyhow::anyhow!("{:?} is not set", field))?;
            println!("{}", value);
        }
        None => {
            println!("URL:   {}", backend.url().unwrap_or("-"));
            println!("User:  {}", backend.user().unwrap_or("-"));
            println!("Token: {}", backend.token().unwrap_or("-"));
            let kubeconfig = if backend.kubeconfig().is_some() { "recorded" } else { "-" };
            println!("Kubeconfig: {}", kubeconfig);
        }
    }

    Ok(())
}
