// src/config.rs

//! Manages server configuration: loading, defaults, and validation.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// The file picked up from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_PATH: &str = "memorydb.toml";

/// Settings for the graceful-shutdown sequence.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShutdownConfig {
    /// How long connected clients are given to disconnect after the shutdown
    /// warning, before they are closed by force.
    #[serde(default = "default_grace_period", with = "humantime_serde")]
    pub grace_period: Duration,
    /// Upper bound on a single wait for an inbound connection, so the accept
    /// loop notices shutdown promptly.
    #[serde(default = "default_accept_poll_interval", with = "humantime_serde")]
    pub accept_poll_interval: Duration,
    /// How long force-closed sessions get to wind down before their tasks are
    /// aborted.
    #[serde(default = "default_close_timeout", with = "humantime_serde")]
    pub close_timeout: Duration,
}

fn default_grace_period() -> Duration {
    Duration::from_secs(5)
}
fn default_accept_poll_interval() -> Duration {
    Duration::from_secs(2)
}
fn default_close_timeout() -> Duration {
    Duration::from_secs(1)
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period: default_grace_period(),
            accept_poll_interval: default_accept_poll_interval(),
            close_timeout: default_close_timeout(),
        }
    }
}

/// Snapshot persistence settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SnapshotConfig {
    /// The snapshot file, read at startup and written at shutdown.
    #[serde(default = "default_snapshot_path")]
    pub path: PathBuf,
    /// If set, the store is also saved on this interval whenever it changed.
    #[serde(default, with = "humantime_serde")]
    pub autosave_interval: Option<Duration>,
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("db.json")
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: default_snapshot_path(),
            autosave_interval: None,
        }
    }
}

/// Configuration for the Prometheus metrics exporter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// If true, an HTTP server will be started to expose Prometheus metrics.
    #[serde(default)]
    pub enabled: bool,
    /// The port for the Prometheus metrics server.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_metrics_port() -> u16 {
    9030
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

/// The resolved server configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,
    /// Inbound lines longer than this are rejected with an error reply.
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
    #[serde(default)]
    pub shutdown: ShutdownConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3030
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_max_clients() -> usize {
    10000
}
fn default_max_line_length() -> usize {
    crate::core::protocol::DEFAULT_MAX_LINE_LENGTH
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            max_clients: default_max_clients(),
            max_line_length: default_max_line_length(),
            shutdown: ShutdownConfig::default(),
            snapshot: SnapshotConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{}'", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid configuration in '{}'", path.display()))
    }

    /// Parses and validates a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if given; otherwise the default config file if it exists,
    /// falling back to built-in defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH),
            None => Ok(Self::default()),
        }
    }

    /// Validates the configuration to ensure logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port cannot be 0"));
        }
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.max_clients == 0 {
            return Err(anyhow!("max_clients cannot be 0"));
        }
        if self.max_line_length == 0 {
            return Err(anyhow!("max_line_length cannot be 0"));
        }
        if self.shutdown.accept_poll_interval.is_zero() {
            return Err(anyhow!("shutdown.accept_poll_interval cannot be 0"));
        }
        if self.shutdown.grace_period > Duration::from_secs(300) {
            warn!(
                "shutdown.grace_period is {}; shutdown will wait that long for lingering clients.",
                humantime::format_duration(self.shutdown.grace_period)
            );
        }
        if self.snapshot.path.as_os_str().is_empty() {
            return Err(anyhow!("snapshot.path cannot be empty"));
        }
        if let Some(interval) = self.snapshot.autosave_interval
            && interval.is_zero()
        {
            return Err(anyhow!("snapshot.autosave_interval cannot be 0"));
        }
        if self.metrics.enabled {
            if self.metrics.port == 0 {
                return Err(anyhow!("metrics.port cannot be 0"));
            }
            if self.metrics.port == self.port {
                return Err(anyhow!(
                    "metrics.port cannot be the same as the main server port"
                ));
            }
        }
        Ok(())
    }
}
