//! CLI command implementations.

mod config;
mod routes;
mod start;

pub use config::{load_config, run_config, ConfigArgs, ConfigCommand};
pub use routes::{run_routes, RoutesArgs};
pub use start::{run_start, StartArgs};
