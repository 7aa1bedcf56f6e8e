//! kaos CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Configuration error
//! - 3: Provisioning error
//! - 4: Endpoint error
//! - 5: State error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kaos_infra::InfraError;
use kaos_runner::RunnerError;
use kaos_state::StateError;

mod commands;

use commands::{Cli, Commands, Context};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const CONFIGURATION_ERROR: u8 = 2;
    pub const PROVISIONING_ERROR: u8 = 3;
    pub const ENDPOINT_ERROR: u8 = 4;
    pub const STATE_ERROR: u8 = 5;
}

fn init_logging(verbose: bool) {
    let default = if verbose { "kaos=debug,warn" } else { "kaos=info,warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Ignore the error if a subscriber is already installed.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli).await;

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::from_cli(&cli)?;

    match cli.command {
        Commands::Build(args) => commands::build::execute(&ctx, args).await,
        Commands::Destroy(args) => commands::destroy::execute(&ctx, args).await,
        Commands::Init(args) => commands::init::execute(&ctx, args),
        Commands::Show(args) => commands::show::execute(&ctx, args),
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<InfraError>() {
            return match err {
                InfraError::Configuration(_) | InfraError::ConfigFile(_) => {
                    ExitCodes::CONFIGURATION_ERROR
                }
                InfraError::Provisioning(_) | InfraError::Copy(_) => ExitCodes::PROVISIONING_ERROR,
                InfraError::Hostname(_) | InfraError::InvalidOutput(_) => ExitCodes::ENDPOINT_ERROR,
                InfraError::State(_) => ExitCodes::STATE_ERROR,
                _ => ExitCodes::GENERAL_ERROR,
            };
        }
        if cause.is::<RunnerError>() {
            return ExitCodes::PROVISIONING_ERROR;
        }
        if cause.is::<StateError>() {
            return ExitCodes::STATE_ERROR;
        }
    }
    ExitCodes::GENERAL_ERROR
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context as _;

    #[test]
    fn test_categorize_infra_errors() {
        let err = anyhow::Error::new(InfraError::configuration("missing AWS_DEFAULT_REGION"));
        assert_eq!(categorize_error(&err), ExitCodes::CONFIGURATION_ERROR);

        let err = anyhow::Error::new(InfraError::Hostname("Hostname not present".to_string()));
        assert_eq!(categorize_error(&err), ExitCodes::ENDPOINT_ERROR);
    }

    #[test]
    fn test_categorize_through_context() {
        let result: Result<(), InfraError> = Err(InfraError::Provisioning(RunnerError::NotAvailable(
            "terraform".to_string(),
        )));
        let err = result.context("Failed to build aws infrastructure").unwrap_err();
        assert_eq!(categorize_error(&err), ExitCodes::PROVISIONING_ERROR);
    }

    #[test]
    fn test_categorize_runner_and_state_errors() {
        let err = anyhow::Error::new(RunnerError::NotAvailable("terraform".to_string()));
        assert_eq!(categorize_error(&err), ExitCodes::PROVISIONING_ERROR);

        let err = anyhow::Error::new(StateError::NotCreated("x".to_string()));
        assert_eq!(categorize_error(&err), ExitCodes::STATE_ERROR);

        let err = anyhow::anyhow!("something else");
        assert_eq!(categorize_error(&err), ExitCodes::GENERAL_ERROR);
    }
}
