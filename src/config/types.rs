//! Configuration type definitions

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

use crate::prediction::{LinearPredictorConfig, DEFAULT_LOOKAHEAD_MS};

/// Tracks selector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Number of pose samples to keep in history
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

fn default_history_size() -> usize {
    32
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
        }
    }
}

/// Pose prediction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Enable pose prediction at startup
    #[serde(default)]
    pub enabled: bool,

    /// Use the built-in linear predictor instead of a plugin library
    #[serde(default)]
    pub builtin: bool,

    /// Plugin library file name (e.g., "libViewportPredict_LR.so")
    #[serde(default)]
    pub plugin_name: String,

    /// Directory containing the plugin library
    #[serde(default)]
    pub library_dir: PathBuf,

    /// How far ahead to predict (ms)
    #[serde(default = "default_lookahead_ms")]
    pub lookahead_ms: u64,

    /// Built-in predictor tuning
    #[serde(default)]
    pub linear: LinearPredictorConfig,
}

fn default_lookahead_ms() -> u64 {
    DEFAULT_LOOKAHEAD_MS
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            builtin: false,
            plugin_name: String::new(),
            library_dir: PathBuf::new(),
            lookahead_ms: default_lookahead_ms(),
            linear: LinearPredictorConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level ("trace", "debug", "info", "warn", "error")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("pretty", "compact", "json")
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for daily rolling log files (None or "" = console only)
    #[serde(default, deserialize_with = "empty_path_as_none")]
    pub log_dir: Option<PathBuf>,
}

impl LoggingConfig {
    /// Rolling file directory, if file logging is configured
    pub fn file_dir(&self) -> Option<&std::path::Path> {
        self.log_dir
            .as_deref()
            .filter(|dir| !dir.as_os_str().is_empty())
    }
}

fn empty_path_as_none<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let dir = Option::<PathBuf>::deserialize(deserializer)?;
    Ok(dir.filter(|dir| !dir.as_os_str().is_empty()))
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}
