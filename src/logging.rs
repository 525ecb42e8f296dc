//! Logging setup
//!
//! The library only emits `tracing` events. Applications embedding the
//! selector may call [`init_logging`] once to install a subscriber configured
//! from [`LoggingConfig`]; `RUST_LOG` overrides the configured level.

use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;

/// Rolling log file name prefix
pub const LOG_FILE_PREFIX: &str = "omaf-viewport.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Build the level filter, preferring `RUST_LOG` when set
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "omaf_viewport={level},warn",
            level = config.level.to_lowercase()
        ))
    })
}

fn console_layer(format: &str) -> BoxedLayer {
    match format {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stdout)
            .boxed(),
        "compact" => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stdout)
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(std::io::stdout)
            .boxed(),
    }
}

/// Install the global subscriber
///
/// Returns the file writer guard when `log_dir` is set; keep it alive for as
/// long as logs should be flushed to disk.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let mut layers: Vec<BoxedLayer> = vec![console_layer(&config.format)];
    let mut guard = None;

    if let Some(dir) = config.file_dir() {
        std::fs::create_dir_all(dir)
            .context(format!("Failed to create log directory: {}", dir.display()))?;

        let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        guard = Some(file_guard);

        let file_layer = match config.format.as_str() {
            "json" => tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .boxed(),
            _ => tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .boxed(),
        };
        layers.push(file_layer);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter(config))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    info!(
        "omaf-viewport v{} (commit {}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_DATE")
    );
    if let Some(dir) = config.file_dir() {
        info!("Logging to directory: {}", dir.display());
    }

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_from_config() {
        let config = LoggingConfig {
            level: "DEBUG".to_string(),
            ..LoggingConfig::default()
        };
        // Only checks construction; RUST_LOG may be set by the harness
        let filter = env_filter(&config);
        assert!(!filter.to_string().is_empty());
    }

    #[test]
    fn test_empty_log_dir_is_console_only() {
        let config = LoggingConfig {
            log_dir: Some(std::path::PathBuf::new()),
            ..LoggingConfig::default()
        };
        assert!(config.file_dir().is_none());

        if let Ok(guard) = init_logging(&config) {
            assert!(guard.is_none());
        }
    }

    #[test]
    fn test_init_logging_with_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            level: "info".to_string(),
            format: "compact".to_string(),
            log_dir: Some(dir.path().join("logs")),
        };

        // Another test may already own the global subscriber
        if let Ok(guard) = init_logging(&config) {
            assert!(guard.is_some());
        }
        assert!(dir.path().join("logs").is_dir());
    }
}
