//! Telemetry configuration

use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use super::error::ValidationError;

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter directive, e.g. `info` or `wagfriends=debug,sqlx=warn`
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Emit logs as JSON lines instead of human-readable text
    #[serde(default)]
    pub json_logs: bool,
}

impl TelemetryConfig {
    /// Validate telemetry configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.log_filter.is_empty() {
            return Err(ValidationError::InvalidLogFilter);
        }
        EnvFilter::try_new(&self.log_filter).map_err(|_| ValidationError::InvalidLogFilter)?;
        Ok(())
    }

    /// Install the global tracing subscriber.
    ///
    /// `RUST_LOG` overrides the configured filter when set. Call once at
    /// startup; a second call is a no-op error from the subscriber, which we
    /// ignore so tests can initialize freely.
    pub fn init(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.log_filter));
        if self.json_logs {
            let _ = fmt().json().with_env_filter(filter).try_init();
        } else {
            let _ = fmt().with_env_filter(filter).try_init();
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            json_logs: false,
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_valid() {
        assert!(TelemetryConfig::default().validate().is_ok());
    }

    #[test]
    fn targeted_filter_is_valid() {
        let config = TelemetryConfig {
            log_filter: "wagfriends=debug,sqlx=warn".to_string(),
            json_logs: true,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_filter_is_rejected() {
        let config = TelemetryConfig {
            log_filter: String::new(),
            json_logs: false,
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidLogFilter)
        ));
    }
}
