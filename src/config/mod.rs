//! Configuration management
//!
//! Handles loading and validation of configuration from TOML files. Every
//! field has a default, so an empty file is a valid configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod types;

pub use types::{LoggingConfig, PredictionConfig, SelectorConfig};

use crate::pose::MAX_HISTORY_SIZE;
use crate::prediction::MAX_LOOKAHEAD_MS;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Tracks selector configuration
    #[serde(default)]
    pub selector: SelectorConfig,
    /// Pose prediction configuration
    #[serde(default)]
    pub prediction: PredictionConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.selector.history_size == 0 {
            anyhow::bail!("selector.history_size must be greater than zero");
        }
        if self.selector.history_size > MAX_HISTORY_SIZE {
            anyhow::bail!(
                "selector.history_size ({}) cannot exceed {}",
                self.selector.history_size,
                MAX_HISTORY_SIZE
            );
        }

        let prediction = &self.prediction;
        if prediction.enabled && !prediction.builtin {
            if prediction.plugin_name.is_empty() {
                anyhow::bail!("prediction.plugin_name is required when prediction is enabled");
            }
            if prediction.library_dir.as_os_str().is_empty() {
                anyhow::bail!("prediction.library_dir is required when prediction is enabled");
            }
        }

        if prediction.lookahead_ms > MAX_LOOKAHEAD_MS {
            anyhow::bail!(
                "prediction.lookahead_ms ({}) cannot exceed {}",
                prediction.lookahead_ms,
                MAX_LOOKAHEAD_MS
            );
        }

        let linear = &prediction.linear;
        let smoothing = [linear.velocity_smoothing, linear.acceleration_smoothing];
        if smoothing.iter().any(|a| !(0.0..=1.0).contains(a)) {
            anyhow::bail!("prediction.linear smoothing factors must be within 0.0-1.0");
        }
        if !(linear.max_prediction_deg.is_finite() && linear.max_prediction_deg > 0.0) {
            anyhow::bail!(
                "prediction.linear.max_prediction_deg must be positive, got {}",
                linear.max_prediction_deg
            );
        }
        if !(linear.min_velocity_deg_s.is_finite() && linear.min_velocity_deg_s >= 0.0) {
            anyhow::bail!(
                "prediction.linear.min_velocity_deg_s must be zero or positive, got {}",
                linear.min_velocity_deg_s
            );
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" | "json" => {}
            _ => anyhow::bail!("Invalid log format: {}", self.logging.format),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.selector.history_size, 32);
        assert!(!config.prediction.enabled);
        assert_eq!(config.prediction.lookahead_ms, 50);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.selector.history_size, 32);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[selector]
history_size = 8

[prediction]
enabled = true
plugin_name = "libViewportPredict_LR.so"
library_dir = "/usr/local/lib/"
lookahead_ms = 120

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.selector.history_size, 8);
        assert!(config.prediction.enabled);
        assert_eq!(config.prediction.plugin_name, "libViewportPredict_LR.so");
        assert_eq!(config.prediction.lookahead_ms, 120);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_empty_log_dir_means_console_only() {
        let config = Config::from_toml_str("[logging]\nlog_dir = \"\"").unwrap();
        assert!(config.logging.log_dir.is_none());

        let config = Config::from_toml_str("[logging]\nlog_dir = \"/var/log/omaf\"").unwrap();
        assert_eq!(
            config.logging.file_dir(),
            Some(std::path::Path::new("/var/log/omaf"))
        );
    }

    #[test]
    fn test_missing_file() {
        assert!(Config::load("/nonexistent/omaf-viewport.toml").is_err());
    }

    #[test]
    fn test_config_validation_zero_history() {
        let mut config = Config::default();
        config.selector.history_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_plugin_without_name() {
        let mut config = Config::default();
        config.prediction.enabled = true;
        config.prediction.library_dir = "/usr/lib".into();
        assert!(config.validate().is_err());

        config.prediction.builtin = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_history_limit() {
        let result = Config::from_toml_str("[selector]\nhistory_size = 9223372036854775807");
        assert!(result.is_err());

        let mut config = Config::default();
        config.selector.history_size = MAX_HISTORY_SIZE;
        assert!(config.validate().is_ok());
        config.selector.history_size = MAX_HISTORY_SIZE + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_max_prediction() {
        let result = Config::from_toml_str("[prediction.linear]\nmax_prediction_deg = -5.0");
        assert!(result.is_err());

        let mut config = Config::default();
        config.prediction.linear.max_prediction_deg = 0.0;
        assert!(config.validate().is_err());
        config.prediction.linear.max_prediction_deg = f32::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_min_velocity() {
        let result = Config::from_toml_str("[prediction.linear]\nmin_velocity_deg_s = -1.0");
        assert!(result.is_err());

        let mut config = Config::default();
        config.prediction.linear.min_velocity_deg_s = f32::NAN;
        assert!(config.validate().is_err());
        config.prediction.linear.min_velocity_deg_s = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_lookahead() {
        let mut config = Config::default();
        config.prediction.lookahead_ms = 5000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }
}
