//! Fan-out configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::traits::OutputStream;
use crate::worker::session_period;

/// Fleet run configuration
///
/// Controls how many hosts run at once, how long each host may take, and
/// which remote stream carries the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Maximum hosts in flight at once; `None` runs every host at once
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Deadline for one host, from connection to captured output
    pub host_timeout: Duration,

    /// Optional cap on new remote sessions per second
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_rate: Option<f64>,

    /// Remote stream that carries the report text
    pub report_stream: OutputStream,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            concurrency: None,
            host_timeout: Duration::from_secs(3600),
            connect_rate: None,
            report_stream: OutputStream::default(),
        }
    }
}

impl FleetConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the number of hosts in flight
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = Some(limit);
        self
    }

    /// Set the per-host deadline
    pub fn with_host_timeout(mut self, timeout: Duration) -> Self {
        self.host_timeout = timeout;
        self
    }

    /// Cap new sessions per second
    pub fn with_connect_rate(mut self, per_second: f64) -> Self {
        self.connect_rate = Some(per_second);
        self
    }

    /// Choose the stream the report is read from
    pub fn with_report_stream(mut self, stream: OutputStream) -> Self {
        self.report_stream = stream;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(limit) = self.concurrency {
            if limit == 0 || limit > Semaphore::MAX_PERMITS {
                return Err(ConfigError::InvalidConcurrency(format!(
                    "concurrency must be between 1 and {}",
                    Semaphore::MAX_PERMITS
                )));
            }
        }

        if self.host_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "host timeout must be greater than zero".into(),
            ));
        }

        if let Some(rate) = self.connect_rate {
            if session_period(rate).is_none() {
                return Err(ConfigError::InvalidConnectRate(format!(
                    "{rate} sessions per second is not a usable rate"
                )));
            }
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid concurrency value
    #[error("Invalid concurrency: {0}")]
    InvalidConcurrency(String),

    /// Invalid host timeout
    #[error("Invalid host timeout: {0}")]
    InvalidTimeout(String),

    /// Invalid connect rate
    #[error("Invalid connect rate: {0}")]
    InvalidConnectRate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FleetConfig::default();
        assert!(config.concurrency.is_none());
        assert_eq!(config.host_timeout, Duration::from_secs(3600));
        assert!(config.connect_rate.is_none());
        assert_eq!(config.report_stream, OutputStream::Stderr);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder_pattern() {
        let config = FleetConfig::new()
            .with_concurrency(16)
            .with_host_timeout(Duration::from_secs(90))
            .with_connect_rate(5.0)
            .with_report_stream(OutputStream::Stdout);

        assert_eq!(config.concurrency, Some(16));
        assert_eq!(config.host_timeout, Duration::from_secs(90));
        assert_eq!(config.connect_rate, Some(5.0));
        assert_eq!(config.report_stream, OutputStream::Stdout);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_concurrency() {
        let config = FleetConfig::new().with_concurrency(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConcurrency(_))
        ));
    }

    #[test]
    fn test_config_validation_concurrency_above_semaphore_limit() {
        let config = FleetConfig::new().with_concurrency(usize::MAX);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConcurrency(_))
        ));

        let config = FleetConfig::new().with_concurrency(Semaphore::MAX_PERMITS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let config = FleetConfig::new().with_host_timeout(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeout(_))
        ));
    }

    #[test]
    fn test_config_validation_bad_connect_rate() {
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e-30, 1e300] {
            let config = FleetConfig::new().with_connect_rate(rate);
            assert!(config.validate().is_err(), "rate {rate} should be rejected");
        }
    }

    #[test]
    fn test_config_serialization() {
        let config = FleetConfig::new().with_concurrency(5);
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("connect_rate"));

        let deserialized: FleetConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, config);
    }
}
