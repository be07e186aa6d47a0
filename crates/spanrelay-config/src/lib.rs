// spanrelay-config - Unified configuration for the relay
//
// Supports configuration from multiple sources:
// 1. CLI flags (highest priority, applied by the binary)
// 2. Environment variables (SPANRELAY_* prefix)
// 3. Config file path from SPANRELAY_CONFIG env var
// 4. Config file contents from SPANRELAY_CONFIG_CONTENT env var
// 5. Default config file locations (./spanrelay.toml, ./config.toml)
// 6. Built-in defaults (lowest priority)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{EnvSource, ENV_PREFIX};

pub const DEFAULT_RECEIVER_ADDRESS: &str = "0.0.0.0:55678";

/// Main runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub receiver: ReceiverConfig,

    #[serde(default)]
    pub exporters: ExportersConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Streaming receiver and the dispatch pool behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    pub address: String,
    pub workers: usize,
    pub queue_size: usize,
    /// Zero disables time-windowed buffering.
    pub buffer_period_ms: u64,
    pub buffer_max_items: usize,
    pub disable_tracing: bool,
    pub disable_metrics: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsConfig>,
}

impl ReceiverConfig {
    pub fn buffer_period(&self) -> Duration {
        Duration::from_millis(self.buffer_period_ms)
    }

    pub fn buffering_enabled(&self) -> bool {
        self.buffer_period_ms > 0
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_RECEIVER_ADDRESS.to_string(),
            workers: 4,
            queue_size: 64,
            buffer_period_ms: 0,
            buffer_max_items: 1024,
            disable_tracing: false,
            disable_metrics: false,
            tls: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    #[serde(default)]
    pub cert_file: String,
    #[serde(default)]
    pub key_file: String,
}

/// Exporters that every received batch is fanned out to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportersConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingExporterConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward: Option<ForwardExporterConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jaeger: Option<JaegerExporterConfig>,
}

impl ExportersConfig {
    pub fn is_empty(&self) -> bool {
        self.logging.is_none() && self.forward.is_none() && self.jaeger.is_none()
    }
}

impl Default for ExportersConfig {
    fn default() -> Self {
        Self {
            logging: Some(LoggingExporterConfig::default()),
            forward: None,
            jaeger: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingExporterConfig {
    /// Log every item name at debug level, not just batch summaries.
    #[serde(default)]
    pub verbose: bool,
}

/// Re-export to another relay over the stream protocol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardExporterConfig {
    pub address: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl ForwardExporterConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

/// Jaeger JSON batches posted to a collector endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JaegerExporterConfig {
    pub collector_endpoint: String,
    #[serde(default = "default_jaeger_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_jaeger_timeout_secs() -> u64 {
    10
}

/// Server-wide settings: logging and the optional HTTP gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address of the HTTP/JSON gateway. Unset disables the gateway.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_address: Option<String>,
    pub cors_allowed_origins: Vec<String>,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_address: None,
            cors_allowed_origins: Vec::new(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Unsupported log format: {}. Supported: text, json", s),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Load configuration from a specific file path (for CLI usage).
    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Load configuration with graceful fallback to defaults.
    /// Does not fail if no config file is found.
    pub fn load_or_default() -> Result<Self> {
        sources::load_or_default()
    }

    /// Parse a TOML document. Missing sections take their defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config content")
    }

    /// Build a configuration from optional inline content plus overrides
    /// supplied by an `EnvSource`, without touching the host environment.
    pub fn load_with_env<E: EnvSource>(inline_config: Option<&str>, env: &E) -> Result<Self> {
        let mut config = match inline_config {
            Some(inline) => Self::from_toml(inline)?,
            None => Self::default(),
        };
        config.apply_env_overrides_from(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides from a custom source.
    pub fn apply_env_overrides_from<E: EnvSource>(&mut self, env: &E) -> Result<()> {
        env_overrides::apply_env_overrides(self, env)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}
