use anyhow::{Context, Result};
use clap::Parser;
use repo_lookup::adapters::Catalog;
use repo_lookup::cli::CliArgs;
use repo_lookup::config::Config;
use repo_lookup::runner::run_lookup;
use std::io;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    // RUST_LOG wins over --verbose
    let default_filter = if cli_args.verbose {
        "repo_lookup=debug,repo_lookup_core=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = Config::from_cli_and_file(&cli_args, cli_args.config.clone())?;
    let catalog_path = config
        .catalog
        .clone()
        .context("No catalog given; pass --catalog or set `catalog` in the config file")?;
    info!("Using catalog {}", catalog_path.display());
    let catalog = Catalog::load(&catalog_path)?;

    let stdout = io::stdout();
    let summary = run_lookup(&config, catalog, &mut stdout.lock())?;

    if !summary.is_complete() {
        error!(
            "Lookup was canceled after {} failures",
            summary.failures.len()
        );
        std::process::exit(1);
    }
    Ok(())
}
