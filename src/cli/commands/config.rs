//! Config command implementation.

use crate::core::config::{Config, ConfigOverrides};
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::Path;

/// Configuration operations.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Validate the configuration file.
    Validate,
    /// Print configuration with defaults applied.
    Show {
        /// Output format (toml, json).
        #[arg(long, default_value = "toml")]
        format: String,
    },
}

/// Load the configuration at `path`, or the defaults when no path is given,
/// then apply and re-validate `overrides`.
pub fn load_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_overrides(overrides);
    config.validate().context("invalid configuration after overrides")?;
    Ok(config)
}

/// Run the config command.
pub fn run_config(
    args: ConfigArgs,
    config_path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<()> {
    match args.command {
        ConfigCommand::Validate => validate_config(config_path, overrides),
        ConfigCommand::Show { format } => show_config(config_path, overrides, &format),
    }
}

fn validate_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<()> {
    let Some(path) = path else {
        anyhow::bail!("no config file given; pass --config <PATH>");
    };
    let config = load_config(Some(path), overrides)?;
    println!("✓ {} is valid", path.display());
    println!("  listener.bind = {}", config.listener.bind);
    println!("  evacuation.timeout_seconds = {}", config.evacuation.timeout_seconds);
    if config.escalation.capacity == 0 {
        println!("  escalation.capacity = unbounded");
    } else {
        println!("  escalation.capacity = {}", config.escalation.capacity);
    }
    Ok(())
}

fn show_config(path: Option<&Path>, overrides: &ConfigOverrides, format: &str) -> Result<()> {
    let config = load_config(path, overrides)?;
    let rendered = match format {
        "json" => serde_json::to_string_pretty(&config)?,
        "toml" => toml::to_string_pretty(&config)?,
        other => anyhow::bail!("unknown format '{other}', expected toml or json"),
    };
    println!("{rendered}");
    Ok(())
}
