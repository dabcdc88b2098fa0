//! Builder pattern for HostWorker construction

use crate::config::FleetConfig;
use crate::error::{BenchError, BenchResult};
use crate::host::HostTarget;
use crate::samples::Sample;
use crate::traits::{OutputStream, RemoteExecutor};

use super::executor::HostWorker;
use super::rate_limiter::ConnectRateLimiter;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};

/// Builder for creating HostWorker instances
///
/// # Example
/// ```ignore
/// let worker = HostWorkerBuilder::new(0)
///     .target(target)
///     .command("siege -c 10 -t 30s http://10.0.0.1/")
///     .executor(executor)
///     .samples_tx(tx)
///     .config(&config)
///     .build()?;
/// ```
pub struct HostWorkerBuilder {
    index: usize,
    target: Option<HostTarget>,
    command: Option<Arc<str>>,
    executor: Option<Arc<dyn RemoteExecutor>>,
    samples_tx: Option<mpsc::Sender<Sample>>,
    semaphore: Option<Arc<Semaphore>>,
    rate_limiter: Option<Arc<ConnectRateLimiter>>,
    host_timeout: Duration,
    report_stream: OutputStream,
}

impl HostWorkerBuilder {
    /// Create a new builder for the host at `index` in the target list
    pub fn new(index: usize) -> Self {
        let defaults = FleetConfig::default();
        Self {
            index,
            target: None,
            command: None,
            executor: None,
            samples_tx: None,
            semaphore: None,
            rate_limiter: None,
            host_timeout: defaults.host_timeout,
            report_stream: defaults.report_stream,
        }
    }

    /// Set the host to run on
    pub fn target(mut self, target: HostTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the remote command line
    pub fn command(mut self, command: impl Into<Arc<str>>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Set the remote executor
    pub fn executor(mut self, executor: Arc<dyn RemoteExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Set the sample channel sender
    pub fn samples_tx(mut self, tx: mpsc::Sender<Sample>) -> Self {
        self.samples_tx = Some(tx);
        self
    }

    /// Set the concurrency semaphore
    pub fn semaphore(mut self, semaphore: Option<Arc<Semaphore>>) -> Self {
        self.semaphore = semaphore;
        self
    }

    /// Set the shared connect rate limiter
    pub fn rate_limiter(mut self, limiter: Arc<ConnectRateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Set the per-host deadline
    pub fn host_timeout(mut self, timeout: Duration) -> Self {
        self.host_timeout = timeout;
        self
    }

    /// Set the stream that carries the report
    pub fn report_stream(mut self, stream: OutputStream) -> Self {
        self.report_stream = stream;
        self
    }

    /// Take deadline and report stream from a fleet config
    pub fn config(self, config: &FleetConfig) -> Self {
        self.host_timeout(config.host_timeout)
            .report_stream(config.report_stream)
    }

    /// Build the HostWorker
    ///
    /// # Errors
    /// Returns an error if any required field is missing.
    pub fn build(self) -> BenchResult<HostWorker> {
        let target = self.target.ok_or(BenchError::missing_config("target"))?;
        let command = self.command.ok_or(BenchError::missing_config("command"))?;
        let executor = self
            .executor
            .ok_or(BenchError::missing_config("executor"))?;
        let samples_tx = self
            .samples_tx
            .ok_or(BenchError::missing_config("samples_tx"))?;

        let rate_limiter = self
            .rate_limiter
            .unwrap_or_else(|| Arc::new(ConnectRateLimiter::unlimited()));

        Ok(HostWorker::new(
            self.index,
            target,
            command,
            executor,
            samples_tx,
            self.semaphore,
            rate_limiter,
            self.host_timeout,
            self.report_stream,
        ))
    }
}
