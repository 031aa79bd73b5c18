//! Configuration management.
//!
//! linkflow configuration can come from:
//! - Config file (~/.config/linkflow/config.toml, or `--config <path>`)
//! - Environment variables (LINKFLOW_*), which win over the file

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::storage::DEFAULT_HISTORY_CAPACITY;

/// linkflow configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Engine configuration
    #[serde(default)]
    pub engine: EngineSettings,

    /// HTTP executor configuration
    #[serde(default)]
    pub http: HttpSettings,

    /// Log output configuration
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Executions kept in the in-memory history
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Optional per-node time limit in milliseconds
    #[serde(default)]
    pub node_timeout_ms: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            node_timeout_ms: None,
        }
    }
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

/// HTTP executor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Whole-request timeout (seconds)
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u64,

    /// Connect timeout (seconds)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Permit loopback, private and metadata hosts
    #[serde(default)]
    pub allow_internal_urls: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: default_http_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            allow_internal_urls: false,
        }
    }
}

fn default_http_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

/// Log output configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// A missing file means defaults. An unreadable or invalid file, or
    /// overrides that fail [`Config::validate`], are errors; callers that
    /// want to keep going fall back to `Config::default()` themselves.
    pub fn try_load() -> Result<Self> {
        let path = Self::config_dir().join("config.toml");
        let path = path.exists().then_some(path);
        Self::resolve(path.as_deref(), |key| std::env::var(key).ok())
    }

    /// Load configuration from an explicit file, reporting errors.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        Self::resolve(Some(path), |key| std::env::var(key).ok())
    }

    fn resolve(path: Option<&Path>, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Get the config directory.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("linkflow"))
            .unwrap_or_else(|| PathBuf::from(".linkflow"))
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.engine.history_capacity == 0 {
            return Err(Error::Config(
                "engine.history_capacity must be at least 1".to_string(),
            ));
        }
        if self.engine.node_timeout_ms == Some(0) {
            return Err(Error::Config(
                "engine.node_timeout_ms must be positive when set".to_string(),
            ));
        }
        if self.http.timeout_seconds == 0 {
            return Err(Error::Config(
                "http.timeout_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn read_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(capacity) = lookup("LINKFLOW_HISTORY_CAPACITY") {
            if let Ok(parsed) = capacity.parse::<usize>() {
                self.engine.history_capacity = parsed;
            }
        }
        if let Some(timeout) = lookup("LINKFLOW_NODE_TIMEOUT_MS") {
            if let Ok(parsed) = timeout.parse::<u64>() {
                self.engine.node_timeout_ms = Some(parsed);
            }
        }
        if let Some(timeout) = lookup("LINKFLOW_HTTP_TIMEOUT_SECONDS") {
            if let Ok(parsed) = timeout.parse::<u64>() {
                self.http.timeout_seconds = parsed;
            }
        }
        if let Some(flag) = lookup("LINKFLOW_ALLOW_INTERNAL_URLS") {
            self.http.allow_internal_urls = parse_flag(&flag);
        }
        if let Some(flag) = lookup("LINKFLOW_LOG_JSON") {
            self.logging.json = parse_flag(&flag);
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
