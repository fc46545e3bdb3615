//! Telemetry and metrics for the process engine
//!
//! Logging goes through `tracing`; metrics are structured events on the
//! `metrics` target so any subscriber layer can pick them up.

use crate::config::LoggerSettings;
use crate::error::{Error, Result};

/// Configuration for the telemetry system
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Name of the service
    pub service_name: String,
    /// Log level, used when `RUST_LOG` is unset
    pub log_level: String,
    /// Colored console output
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "caseflow".to_string(),
            log_level: "info".to_string(),
            ansi: true,
        }
    }
}

impl From<&LoggerSettings> for TelemetryConfig {
    fn from(settings: &LoggerSettings) -> Self {
        Self {
            log_level: settings.level.clone(),
            ansi: settings.ansi,
            ..Self::default()
        }
    }
}

/// Install the global tracing subscriber
pub fn init_telemetry(config: TelemetryConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.log_level))
        .map_err(|e| Error::Config(format!("invalid log level '{}': {}", config.log_level, e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(config.ansi)
        .try_init()
        .map_err(|e| Error::Config(format!("failed to initialize telemetry: {}", e)))?;

    tracing::debug!("Telemetry initialized for {}", config.service_name);
    Ok(())
}

/// Add a single metric with tags to the telemetry system
pub fn add_metric(name: &str, value: f64, tags: &[(&str, String)]) {
    let tags_str = tags
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",");

    tracing::info!(
        target: "metrics",
        metric_name = %name,
        metric_value = %value,
        metric_tags = %tags_str,
        "Recorded metric"
    );
}

/// A span duration tracker for measuring operation durations
pub fn span_duration(name: &'static str) -> impl Drop {
    let start = std::time::Instant::now();
    struct Guard {
        name: &'static str,
        start: std::time::Instant,
    }

    impl Drop for Guard {
        fn drop(&mut self) {
            let duration = self.start.elapsed();
            tracing::info!(
                target: "metrics",
                duration_ms = duration.as_millis() as f64,
                operation = self.name,
                "Operation completed"
            );
        }
    }

    Guard { name, start }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_logger_settings() {
        let settings = LoggerSettings {
            level: "debug".to_string(),
            ansi: false,
        };
        let config = TelemetryConfig::from(&settings);
        assert_eq!(config.service_name, "caseflow");
        assert_eq!(config.log_level, "debug");
        assert!(!config.ansi);
    }

    #[test]
    fn test_metrics_without_subscriber() {
        add_metric("case_decisions_total", 1.0, &[("value", "approved".to_string())]);
        let _guard = span_duration("test_operation");
    }
}
