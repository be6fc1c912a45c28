//! Structured logging setup

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Filter used when `RUST_LOG` is not set
    pub log_level: String,

    pub json_format: bool,

    pub include_timestamps: bool,

    pub include_thread_ids: bool,

    /// Whether to include target module
    pub include_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::from(&LoggingConfig::default())
    }
}

impl From<&LoggingConfig> for TelemetryConfig {
    fn from(logging: &LoggingConfig) -> Self {
        Self {
            log_level: logging.level.clone(),
            json_format: logging.json_format,
            include_timestamps: logging.include_timestamps,
            include_thread_ids: logging.include_thread_ids,
            include_target: logging.include_target,
        }
    }
}

impl TelemetryConfig {
    /// Filter from `RUST_LOG`, else the configured level
    fn env_filter(&self) -> Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.log_level)
                .with_context(|| format!("Invalid log filter '{}'", self.log_level)),
        }
    }
}

/// Install the global tracing subscriber
pub fn init_with_config(config: &TelemetryConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(config.env_filter()?);

    let result = if config.json_format {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_target(config.include_target)
                    .with_thread_ids(config.include_thread_ids),
            )
            .try_init()
    } else if config.include_timestamps {
        registry
            .with(
                fmt::layer()
                    .with_target(config.include_target)
                    .with_thread_ids(config.include_thread_ids),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .without_time()
                    .with_target(config.include_target)
                    .with_thread_ids(config.include_thread_ids),
            )
            .try_init()
    };

    result.context("Failed to install tracing subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_config_default() {
        let config = TelemetryConfig::default();
        assert_eq!(config.log_level, "info");
        assert!(!config.json_format);
        assert!(config.include_timestamps);
        assert!(!config.include_thread_ids);
        assert!(config.include_target);
    }

    #[test]
    fn test_telemetry_config_from_logging() {
        let logging = LoggingConfig {
            level: "debug".to_string(),
            json_format: true,
            ..Default::default()
        };
        let config = TelemetryConfig::from(&logging);

        assert_eq!(config.log_level, "debug");
        assert!(config.json_format);
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        let config = TelemetryConfig {
            log_level: "studio_bridge=notalevel".to_string(),
            ..Default::default()
        };
        if std::env::var("RUST_LOG").is_err() {
            assert!(config.env_filter().is_err());
        }
    }
}
