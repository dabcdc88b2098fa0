//! Orchestrator execution logic

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc, watch};

use crate::channel::ChannelConfig;
use crate::config::FleetConfig;
use crate::error::{BenchError, BenchResult};
use crate::host::HostTarget;
use crate::report::AggregateReport;
use crate::samples::collect_samples;
use crate::traits::RemoteExecutor;
use crate::worker::{ConnectRateLimiter, HostOutcome, HostWorkerBuilder};

use super::aggregator::DispatchOutcome;

/// Orchestrator manages one fleet run
///
/// Responsible for spawning one worker per host, owning the sample collector,
/// coordinating shutdown, and waiting for every host to reach a terminal state.
pub struct Orchestrator {
    /// Fleet configuration
    pub(crate) config: FleetConfig,

    /// Remote executor (shared across workers)
    pub(crate) executor: Arc<dyn RemoteExecutor>,

    /// Sample channel sizing
    pub(crate) channel_config: ChannelConfig,

    /// Connect rate limiter (shared across workers)
    pub(crate) rate_limiter: Arc<ConnectRateLimiter>,

    /// Shutdown signal sender
    pub(crate) shutdown_tx: watch::Sender<bool>,
}

impl Orchestrator {
    /// Create a new orchestrator
    ///
    /// Use `OrchestratorBuilder` for a more ergonomic construction.
    pub fn new(
        config: FleetConfig,
        executor: Arc<dyn RemoteExecutor>,
        channel_config: ChannelConfig,
    ) -> Self {
        let rate_limiter = Arc::new(ConnectRateLimiter::new(config.connect_rate));
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            executor,
            channel_config,
            rate_limiter,
            shutdown_tx,
        }
    }

    /// Get a shutdown signal receiver
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Cancel every host that has not finished yet
    ///
    /// The flag is sticky: later dispatches on this orchestrator cancel all
    /// their hosts immediately.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Get the fleet configuration
    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    /// Run `command` on every target and collect what they report
    ///
    /// Waits for all hosts. Host failures are recorded in the outcome and never
    /// returned as errors; only an empty command or a broken collector fails
    /// the dispatch.
    pub async fn dispatch(
        &self,
        targets: &[HostTarget],
        command: &str,
    ) -> BenchResult<DispatchOutcome> {
        if command.trim().is_empty() {
            return Err(BenchError::config("remote command is empty"));
        }
        self.config
            .validate()
            .map_err(|e| BenchError::config(e.to_string()))?;

        let started_at = chrono::Utc::now();
        let command: Arc<str> = Arc::from(command);
        let semaphore = self.config.concurrency.map(|n| Arc::new(Semaphore::new(n)));

        tracing::info!(
            hosts = targets.len(),
            concurrency = ?self.config.concurrency,
            connect_rate = ?self.config.connect_rate,
            host_timeout_secs = self.config.host_timeout.as_secs_f64(),
            executor = self.executor.name(),
            "Starting dispatch"
        );

        let buffer = self.channel_config.samples_buffer.max(1);
        let (samples_tx, samples_rx) = mpsc::channel(buffer);
        let collector = tokio::spawn(collect_samples(samples_rx, buffer));

        // Spawn one worker per target
        let mut handles = Vec::with_capacity(targets.len());
        for (index, target) in targets.iter().enumerate() {
            let worker = HostWorkerBuilder::new(index)
                .target(target.clone())
                .command(Arc::clone(&command))
                .executor(Arc::clone(&self.executor))
                .samples_tx(samples_tx.clone())
                .semaphore(semaphore.clone())
                .rate_limiter(Arc::clone(&self.rate_limiter))
                .config(&self.config)
                .build()?;
            let shutdown_rx = self.shutdown_tx.subscribe();

            handles.push(tokio::spawn(async move { worker.run(shutdown_rx).await }));
        }

        // The collector finishes once the last worker drops its sender
        drop(samples_tx);

        // Wait for all workers to reach a terminal state
        let results = futures::future::join_all(handles).await;
        let mut hosts = Vec::with_capacity(results.len());
        for ((index, target), result) in targets.iter().enumerate().zip(results) {
            match result {
                Ok(outcome) => hosts.push(outcome),
                Err(e) => {
                    tracing::error!(host = %target, error = %e, "Host task panicked");
                    hosts.push(HostOutcome::failed(
                        index,
                        target.address.clone(),
                        BenchError::orchestration(format!("host task aborted: {e}")),
                    ));
                }
            }
        }

        let samples = collector
            .await
            .map_err(|e| BenchError::orchestration(format!("sample collector failed: {e}")))?;
        let failures: Vec<_> = hosts.iter().filter_map(HostOutcome::failure).collect();
        let finished_at = chrono::Utc::now();

        tracing::info!(
            elapsed_secs = (finished_at - started_at).num_milliseconds() as f64 / 1000.0,
            hosts = hosts.len(),
            failed = failures.len(),
            samples = samples.total(),
            "Dispatch completed"
        );

        Ok(DispatchOutcome {
            samples,
            hosts,
            failures,
            started_at,
            finished_at,
        })
    }

    /// Dispatch and reduce to the fleet-wide report
    pub async fn run(&self, targets: &[HostTarget], command: &str) -> BenchResult<AggregateReport> {
        Ok(self.dispatch(targets, command).await?.into_report())
    }

    /// Run with Ctrl+C signal handling
    ///
    /// On Ctrl+C every unfinished host is cancelled and recorded as such; the
    /// hosts that already reported are still aggregated.
    pub async fn run_with_signal_handling(
        &self,
        targets: &[HostTarget],
        command: &str,
    ) -> BenchResult<AggregateReport> {
        let shutdown_tx = self.shutdown_tx.clone();

        // Spawn signal handler task
        let signal_handle = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Received Ctrl+C, cancelling unfinished hosts...");
                    shutdown_tx.send_replace(true);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                }
            }
        });

        let result = self.run(targets, command).await;

        // Abort signal handler if still running
        signal_handle.abort();

        result
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("executor", &self.executor.name())
            .field("channel_config", &self.channel_config)
            .field("rate_limiter", &self.rate_limiter)
            .finish()
    }
}
