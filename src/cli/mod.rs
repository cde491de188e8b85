//! Command-line interface.
//!
//! Unified CLI for Bulletin operations.

pub mod commands;

use crate::core::config::ConfigOverrides;
use clap::{Parser, Subcommand};

/// Bulletin - evacuation endpoint of the bulletin-board authority.
#[derive(Parser, Debug)]
#[command(name = "bulletin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path.
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Overrides taken from global flags.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            log_level: self.log_level.clone(),
            bind: None,
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the evacuation server.
    Start(commands::StartArgs),
    /// Configuration operations.
    Config(commands::ConfigArgs),
    /// List the evacuation routes.
    Routes(commands::RoutesArgs),
}
