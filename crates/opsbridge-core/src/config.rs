//! OpsBridge configuration system.
//!
//! The daemon reads a single TOML file (default `~/.opsbridge/config.toml`).
//! Every field has a serde default so a missing file or a partial file is
//! always usable. The engine never parses raw config itself — it receives
//! already-constructed monitors and sinks.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpsBridgeConfig {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub monitors: MonitorsConfig,
    #[serde(default)]
    pub sinks: SinksConfig,
}

impl OpsBridgeConfig {
    /// Load config from the default path (~/.opsbridge/config.toml).
    /// A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".opsbridge")
            .join("config.toml")
    }
}

/// Engine-level tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Per-sink delivery timeout, seconds.
    #[serde(default = "default_sink_timeout")]
    pub sink_timeout_secs: u64,
    /// Grace period for in-flight ticks at shutdown, seconds.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

fn default_sink_timeout() -> u64 {
    10
}
fn default_shutdown_grace() -> u64 {
    5
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            sink_timeout_secs: default_sink_timeout(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

/// The monitored BI platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Base URL of the platform, e.g. "http://localhost:8080".
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_liveness_path")]
    pub liveness_path: String,
    #[serde(default = "default_version_path")]
    pub version_path: String,
}

fn default_liveness_path() -> String {
    "/livez".into()
}
fn default_version_path() -> String {
    "/api/version".into()
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            liveness_path: default_liveness_path(),
            version_path: default_version_path(),
        }
    }
}

impl PlatformConfig {
    /// Full liveness URL, or a `Missing` error when no base URL is set.
    pub fn liveness_url(&self) -> Result<String, ConfigError> {
        self.join(&self.liveness_path, "heartbeat")
    }

    /// Full version-endpoint URL, or a `Missing` error when no base URL is set.
    pub fn version_url(&self) -> Result<String, ConfigError> {
        self.join(&self.version_path, "version")
    }

    fn join(&self, path: &str, monitor: &'static str) -> Result<String, ConfigError> {
        if self.base_url.is_empty() {
            return Err(ConfigError::Missing {
                monitor,
                field: "platform.base_url",
            });
        }
        Ok(format!("{}{}", self.base_url.trim_end_matches('/'), path))
    }
}

/// One monitor's schedule + enable flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    /// Recurrence expression, e.g. "every 1 minute".
    pub schedule: String,
}

impl MonitorConfig {
    fn new(schedule: &str) -> Self {
        Self {
            enabled: true,
            schedule: schedule.into(),
        }
    }
}

/// The three built-in monitors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorsConfig {
    #[serde(default = "default_heartbeat")]
    pub heartbeat: MonitorConfig,
    #[serde(default = "default_process")]
    pub process: MonitorConfig,
    #[serde(default = "default_version")]
    pub version: MonitorConfig,
}

fn default_heartbeat() -> MonitorConfig {
    MonitorConfig::new("every 1 minute")
}
fn default_process() -> MonitorConfig {
    MonitorConfig::new("every 1 minute")
}
fn default_version() -> MonitorConfig {
    MonitorConfig::new("every 1 hour")
}

impl Default for MonitorsConfig {
    fn default() -> Self {
        Self {
            heartbeat: default_heartbeat(),
            process: default_process(),
            version: default_version(),
        }
    }
}

/// Destination configuration. Each sink carries its own enable flag;
/// disabled sinks are simply never constructed into the fan-out set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SinksConfig {
    #[serde(default)]
    pub timeseries: TimeseriesSinkConfig,
    #[serde(default)]
    pub apm: ApmSinkConfig,
    #[serde(default)]
    pub chat: ChatSinkConfig,
    #[serde(default)]
    pub log: LogSinkConfig,
}

/// Time-series store (InfluxDB line-protocol write endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeseriesSinkConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_database")]
    pub database: String,
}

fn default_database() -> String {
    "opsbridge".into()
}

impl Default for TimeseriesSinkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            database: default_database(),
        }
    }
}

/// APM event collector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApmSinkConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
}

/// Chat webhook.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatSinkConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub webhook_url: String,
    /// "basic" | "formatted" | "blocks"
    #[serde(default = "default_chat_style")]
    pub style: String,
}

fn default_chat_style() -> String {
    "basic".into()
}

/// Structured log sink. On by default — it is the zero-dependency destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSinkConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
}

impl Default for LogSinkConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn bool_true() -> bool {
    true
}
