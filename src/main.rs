use anyhow::Context;
use clap::Parser;
use curve_swap::cli::{self, Cli, Commands};
use curve_swap::config::AppConfig;
use curve_swap::error::{Result, SwapFlowError};
use tracing::info;

mod main_runtime;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("loading configuration from '{}'", cli.config))?;
    config.validate().map_err(SwapFlowError::InvalidConfig)?;

    let _log_guard = main_runtime::init_logging(&config.logging);
    info!(dry_run = config.dry_run.enabled, "curve-swap starting");

    match &cli.command {
        Commands::Quote { swap } => cli::run_quote(&config, swap).await?,
        Commands::Swap { swap, address } => cli::run_swap(&config, swap, address).await?,
    }

    Ok(())
}
