//! Bulletin - unified CLI entrypoint.
//!
//! Usage:
//!   bulletin start --config config/bulletin.toml
//!   bulletin config validate --config config/bulletin.toml
//!   bulletin config show --format json
//!   bulletin routes

use anyhow::Result;
use bulletin::cli::commands::{run_config, run_routes, run_start};
use bulletin::cli::{Cli, Commands};
use clap::Parser;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let overrides = cli.overrides();
    let config_path = cli.config.map(PathBuf::from);

    match cli.command {
        Commands::Start(args) => run_start(args, config_path.as_deref(), overrides).await,
        Commands::Config(args) => run_config(args, config_path.as_deref(), &overrides),
        Commands::Routes(args) => run_routes(args),
    }
}
