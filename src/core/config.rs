//! Configuration parsing and validation.
//!
//! Bulletin configuration is loaded from TOML files with CLI overrides.
//! Every section is optional and falls back to its defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Top-level Bulletin configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Evacuation HTTP listener.
    #[serde(default)]
    pub listener: ListenerConfig,

    /// Evacuation store behavior.
    #[serde(default)]
    pub evacuation: EvacuationConfig,

    /// Exit signal channel.
    #[serde(default)]
    pub escalation: EscalationConfig,

    /// Logging.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8889").
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Largest accepted request body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Evacuation store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvacuationConfig {
    /// Lifetime of an evacuating record, in seconds.
    #[serde(default = "default_evacuation_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for EvacuationConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_evacuation_timeout_seconds(),
        }
    }
}

/// Exit signal channel configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Buffered signals; `0` buffers without bound, otherwise extra signals
    /// are dropped when the buffer is full.
    #[serde(default)]
    pub capacity: usize,
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// Default value functions

fn default_bind() -> String {
    "127.0.0.1:8889".to_string()
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_evacuation_timeout_seconds() -> u64 {
    600
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| "failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).with_context(|| "failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides to the configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref log_level) = overrides.log_level {
            self.telemetry.log_level = log_level.clone();
        }
        if let Some(ref bind) = overrides.bind {
            self.listener.bind = bind.clone();
        }
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> Result<()> {
        self.validate_listener()?;
        self.validate_evacuation()?;
        self.validate_telemetry()?;
        Ok(())
    }

    /// Parsed listener bind address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.listener
            .bind
            .parse()
            .with_context(|| format!("listener.bind is not a socket address: {}", self.listener.bind))
    }

    /// Lifetime of an evacuating record.
    pub fn evacuation_timeout(&self) -> Duration {
        Duration::from_secs(self.evacuation.timeout_seconds)
    }

    fn validate_listener(&self) -> Result<()> {
        self.bind_addr()?;
        if self.listener.max_body_bytes == 0 {
            anyhow::bail!("listener.max_body_bytes must be > 0");
        }
        Ok(())
    }

    fn validate_evacuation(&self) -> Result<()> {
        if self.evacuation.timeout_seconds == 0 {
            anyhow::bail!("evacuation.timeout_seconds must be > 0");
        }
        Ok(())
    }

    fn validate_telemetry(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.telemetry.log_level.as_str()) {
            anyhow::bail!(
                "telemetry.log_level must be one of {:?}, got: {}",
                valid_levels,
                self.telemetry.log_level
            );
        }
        Ok(())
    }
}

/// CLI override options that can be applied to configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override log level.
    pub log_level: Option<String>,
    /// Override listener bind address.
    pub bind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.listener.bind, "127.0.0.1:8889");
        assert_eq!(config.listener.max_body_bytes, 1024 * 1024);
        assert_eq!(config.evacuation_timeout(), Duration::from_secs(600));
        assert_eq!(config.escalation.capacity, 0);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn overrides_replace_values() {
        let mut config = Config::default();
        config.apply_overrides(&ConfigOverrides {
            log_level: Some("debug".into()),
            bind: Some("0.0.0.0:9999".into()),
        });
        assert_eq!(config.telemetry.log_level, "debug");
        assert_eq!(config.bind_addr().unwrap().port(), 9999);
    }

    #[test]
    fn rejects_bad_bind() {
        let err = Config::from_toml("[listener]\nbind = \"nowhere\"\n").unwrap_err();
        assert!(err.to_string().contains("listener.bind"));
    }
}
