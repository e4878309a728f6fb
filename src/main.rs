use anyhow::Result;
use casework_core::cli::{self, Cli};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli::resolve_config(&cli)?;
    init_tracing(cli.verbose, config.log_filter.as_deref());
    tracing::debug!(base_url = %config.base_url, "config resolved");
    cli::run(cli, config)
}

/// `--verbose` wins, then `RUST_LOG`, then the config's `log_filter`.
fn init_tracing(verbose: bool, config_filter: Option<&str>) {
    let filter = if verbose {
        EnvFilter::new("casework_core=debug,casework=debug")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(config_filter.unwrap_or("warn")))
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
