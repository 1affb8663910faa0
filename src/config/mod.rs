//! Configuration management.
//!
//! Settings are layered: built-in defaults, then a TOML file, then environment
//! variables prefixed with `PAPER_SCOUT_` (sections separated by `__`, e.g.
//! `PAPER_SCOUT_BACKEND__BASE_URL`). `SEARCH_ENGINE_URL` seeds the default backend URL.

mod file_config;

pub use file_config::{save_config, ConfigFileError};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::RetryPolicy;

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "paper-scout.toml";

const ENV_PREFIX: &str = "PAPER_SCOUT";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Search backend connection
    #[serde(default)]
    pub backend: BackendConfig,

    /// AI overview retries
    #[serde(default)]
    pub overview: OverviewConfig,

    /// Insights relay server
    #[serde(default)]
    pub relay: RelayConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Search backend connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_base_url() -> String {
    std::env::var("SEARCH_ENGINE_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "http://localhost:8000".to_string())
}

fn default_timeout_seconds() -> u64 {
    30
}

/// Summary retry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewConfig {
    /// Automatic retries after the first failed request
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for OverviewConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl OverviewConfig {
    /// Retry policy described by these settings
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .max_attempts(self.max_attempts)
            .base_delay(Duration::from_millis(self.base_delay_ms))
            .max_delay(Duration::from_millis(self.max_delay_ms))
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    5000
}

fn default_max_delay_ms() -> u64 {
    10000
}

/// Relay server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Listen address
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` for structured output, anything else for human-readable text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, ConfigFileError> {
        toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))
    }
}

fn build(file: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = file {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    tracing::debug!("Loading configuration from {}", path.display());
    build(Some(path))
}

/// Configuration from defaults and environment variables only
pub fn get_config() -> Result<Config, config::ConfigError> {
    build(None)
}

/// `<config_dir>/paper-scout/config.toml` for the current user
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("paper-scout").join("config.toml"))
}

/// Look for `./paper-scout.toml`, then the user config file
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    user_config_path().filter(|path| path.is_file())
}
