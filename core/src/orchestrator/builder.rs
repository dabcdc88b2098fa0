//! Builder pattern for Orchestrator construction

use std::sync::Arc;
use std::time::Duration;

use crate::channel::ChannelConfig;
use crate::config::FleetConfig;
use crate::error::{BenchError, BenchResult};
use crate::traits::{OutputStream, RemoteExecutor};

use super::executor::Orchestrator;

/// Builder for creating an Orchestrator with proper configuration
///
/// # Example
///
/// ```ignore
/// let orchestrator = OrchestratorBuilder::new()
///     .concurrency(Some(64))
///     .host_timeout(Duration::from_secs(600))
///     .executor(executor)
///     .build()?;
/// ```
pub struct OrchestratorBuilder {
    config: FleetConfig,
    executor: Option<Arc<dyn RemoteExecutor>>,
    channel_config: ChannelConfig,
}

impl OrchestratorBuilder {
    /// Create a new orchestrator builder with default configuration
    pub fn new() -> Self {
        Self {
            config: FleetConfig::default(),
            executor: None,
            channel_config: ChannelConfig::default(),
        }
    }

    /// Set the full fleet configuration
    pub fn config(mut self, config: FleetConfig) -> Self {
        self.config = config;
        self
    }

    /// Bound the hosts in flight (None runs every host at once)
    pub fn concurrency(mut self, limit: Option<usize>) -> Self {
        self.config.concurrency = limit;
        self
    }

    /// Set the per-host deadline
    pub fn host_timeout(mut self, timeout: Duration) -> Self {
        self.config.host_timeout = timeout;
        self
    }

    /// Set the connect rate (new sessions per second)
    pub fn connect_rate(mut self, per_second: Option<f64>) -> Self {
        self.config.connect_rate = per_second;
        self
    }

    /// Choose the stream the report is read from
    pub fn report_stream(mut self, stream: OutputStream) -> Self {
        self.config.report_stream = stream;
        self
    }

    /// Set the remote executor
    pub fn executor(mut self, executor: Arc<dyn RemoteExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Set the channel configuration
    pub fn channel_config(mut self, config: ChannelConfig) -> Self {
        self.channel_config = config;
        self
    }

    /// Build the orchestrator
    ///
    /// # Errors
    ///
    /// Returns an error if the executor is not set, or if configuration
    /// validation fails.
    pub fn build(self) -> BenchResult<Orchestrator> {
        let executor = self
            .executor
            .ok_or_else(|| BenchError::missing_config("executor"))?;

        self.config
            .validate()
            .map_err(|e| BenchError::config(e.to_string()))?;

        Ok(Orchestrator::new(self.config, executor, self.channel_config))
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
