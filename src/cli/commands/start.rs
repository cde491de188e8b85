//! Start command implementation.

use super::config::load_config;
use crate::core::config::ConfigOverrides;
use crate::core::runtime::Runtime;
use anyhow::Result;
use clap::Args;
use std::path::Path;

/// Start the evacuation server.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Listener bind address, overriding `listener.bind`.
    #[arg(long)]
    pub bind: Option<String>,
}

/// Initialize tracing subscriber if the telemetry feature is enabled.
///
/// `RUST_LOG` wins over the configured level.
#[cfg(feature = "telemetry")]
fn init_tracing(log_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

#[cfg(not(feature = "telemetry"))]
fn init_tracing(_log_level: &str) {}

/// Run the start command.
pub async fn run_start(
    args: StartArgs,
    config_path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<()> {
    let overrides = ConfigOverrides {
        bind: args.bind.or(overrides.bind),
        ..overrides
    };
    let config = load_config(config_path, &overrides)?;
    init_tracing(&config.telemetry.log_level);

    let mut runtime = Runtime::new(config)?;
    runtime.run().await
}
