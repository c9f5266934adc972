//! Configuration management for compbridge
//!
//! Configuration is read from a TOML file, by default
//! `~/.compbridge/config.toml`. A missing default file means defaults; a
//! missing file named explicitly is an error.
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Configuration file
//! 3. Default values
//!
//! ```toml
//! [completion]
//! enable = true
//! exclude = "cd;chdir;pushd;popd;set"
//! timeout = 5
//! provider = "carapace"
//!
//! [logging]
//! level = "warn"
//!
//! [aliases]
//! g = "git $*"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::completion::SettingsStore;
use crate::completion::dispatcher::{DEFAULT_EXCLUDE, DEFAULT_PROVIDER, settings};
use crate::error::{ConfigError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Provider completion settings
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Demo shell history configuration
    #[serde(default)]
    pub history: HistoryConfig,

    /// Alias name to expansion, e.g. `g = "git $*"`
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

/// Provider completion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Enable provider completion
    #[serde(default)]
    pub enable: bool,

    /// Semicolon-separated command names never sent to the provider
    #[serde(default = "default_exclude")]
    pub exclude: String,

    /// Retry timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: f64,

    /// Provider executable
    #[serde(default = "default_provider")]
    pub provider: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Command history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of history entries
    #[serde(default = "default_max_history_size")]
    pub max_size: usize,

    /// Path to history file
    #[serde(default = "default_history_file")]
    pub file_path: PathBuf,

    /// Enable history persistence
    #[serde(default = "default_persist_history")]
    pub persist: bool,
}

fn default_exclude() -> String {
    DEFAULT_EXCLUDE.to_string()
}

fn default_timeout() -> f64 {
    5.0
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    true
}

fn default_max_history_size() -> usize {
    1000
}

fn default_history_file() -> PathBuf {
    config_dir().join("history")
}

fn default_persist_history() -> bool {
    true
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".compbridge")
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            enable: false,
            exclude: default_exclude(),
            timeout: default_timeout(),
            provider: default_provider(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_size: default_max_history_size(),
            file_path: default_history_file(),
            persist: default_persist_history(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from `path`, or from the default location
    ///
    /// # Arguments
    /// * `path` - Explicit configuration file, which must exist
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration, defaults if no file
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        config_dir().join("config.toml")
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        let timeout = self.completion.timeout;
        if !timeout.is_finite() || timeout <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "completion.timeout".to_string(),
                value: timeout.to_string(),
            }
            .into());
        }

        if self.completion.provider.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "completion.provider".to_string(),
                value: self.completion.provider.clone(),
            }
            .into());
        }

        if self.history.max_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "history.max_size".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

impl SettingsStore for CompletionConfig {
    fn get_bool(&self, name: &str) -> Option<bool> {
        (name == settings::ENABLE).then_some(self.enable)
    }

    fn get_string(&self, name: &str) -> Option<String> {
        match name {
            settings::EXCLUDE => Some(self.exclude.clone()),
            _ => None,
        }
    }

    fn get_number(&self, name: &str) -> Option<f64> {
        (name == settings::TIMEOUT).then_some(self.timeout)
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}
