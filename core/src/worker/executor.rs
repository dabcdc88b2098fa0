//! Host worker execution

use crate::error::{BenchError, BenchResult, ErrorKind};
use crate::extractor::extract;
use crate::host::HostTarget;
use crate::samples::Sample;
use crate::traits::{CommandOutput, OutputStream, RemoteExecutor};

use super::outcome::{HostOutcome, HostStatus};
use super::rate_limiter::ConnectRateLimiter;

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Semaphore, mpsc, watch};

/// Runs the command on one host and forwards what it reports
///
/// HostWorkers are one-shot tokio tasks spawned by the Orchestrator, one per
/// target. They share the executor, the semaphore and the rate limiter via
/// Arc, and send every extracted value through an mpsc channel.
pub struct HostWorker {
    /// Position in the dispatched target list
    index: usize,

    /// Host to run on
    target: HostTarget,

    /// Remote command line
    command: Arc<str>,

    /// Remote executor (shared across workers via Arc)
    executor: Arc<dyn RemoteExecutor>,

    /// Channel sender for extracted samples
    samples_tx: mpsc::Sender<Sample>,

    /// Optional cap on hosts in flight (shared semaphore)
    semaphore: Option<Arc<Semaphore>>,

    /// Connect rate limiter (shared across workers)
    rate_limiter: Arc<ConnectRateLimiter>,

    /// Deadline for the remote command
    host_timeout: Duration,

    /// Stream that carries the report
    report_stream: OutputStream,
}

impl HostWorker {
    /// Create a new host worker
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        index: usize,
        target: HostTarget,
        command: Arc<str>,
        executor: Arc<dyn RemoteExecutor>,
        samples_tx: mpsc::Sender<Sample>,
        semaphore: Option<Arc<Semaphore>>,
        rate_limiter: Arc<ConnectRateLimiter>,
        host_timeout: Duration,
        report_stream: OutputStream,
    ) -> Self {
        Self {
            index,
            target,
            command,
            executor,
            samples_tx,
            semaphore,
            rate_limiter,
            host_timeout,
            report_stream,
        }
    }

    /// Run the host to completion
    ///
    /// Never fails: connection, authentication, session and timeout errors
    /// all come back as a [`HostStatus::Failed`] outcome. A shutdown signal
    /// received before the output is captured aborts the remote session and
    /// yields a `Cancelled` failure.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> HostOutcome {
        let start = Instant::now();

        tracing::debug!(host = %self.target, index = self.index, "Host dispatched");

        let result = tokio::select! {
            biased;

            // Check for shutdown signal (highest priority)
            _ = wait_for_shutdown(&mut shutdown) => Err(BenchError::shutdown()),

            result = self.execute_one() => result,
        };

        match result {
            Ok(output) => self.forward(output, start).await,
            Err(err) => {
                let elapsed = start.elapsed();
                tracing::warn!(
                    host = %self.target,
                    kind = %err.kind,
                    error = %err.message,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Host failed"
                );
                HostOutcome {
                    elapsed,
                    ..HostOutcome::failed(self.index, self.target.address.clone(), err)
                }
            }
        }
    }

    /// Wait for a slot, then run the command under the host deadline
    async fn execute_one(&self) -> BenchResult<CommandOutput> {
        // 1. Acquire a permit first so the rate slot is spent on a real connect
        let _permit = match &self.semaphore {
            Some(semaphore) => Some(
                semaphore
                    .acquire()
                    .await
                    .map_err(|_| BenchError::shutdown())?,
            ),
            None => None,
        };

        // 2. Apply connect rate limiting (waits if necessary)
        self.rate_limiter.wait().await;

        // 3. Execute under the deadline; dropping the future closes the session
        let execution = self.executor.execute(&self.target, &self.command);
        match tokio::time::timeout(self.host_timeout, execution).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(BenchError::remote(e.to_error_kind(), e.to_string())),
            Err(_) => Err(BenchError::remote(
                ErrorKind::Timeout,
                format!("no result within {:?}", self.host_timeout),
            )),
        }
    }

    /// Extract metrics from the captured output and send them to the collector
    async fn forward(&self, output: CommandOutput, start: Instant) -> HostOutcome {
        if !output.success() {
            // siege exits non-zero when it hits its failure threshold; the report is still valid
            tracing::debug!(
                host = %self.target,
                exit_code = ?output.exit_code,
                "Remote command exited with non-zero status"
            );
        }

        let extraction = extract(&output.report_text(self.report_stream));

        for issue in &extraction.issues {
            tracing::warn!(
                host = %self.target,
                metric = %issue.metric,
                raw = %issue.raw,
                "Dropping unparsable metric value"
            );
        }

        let mut samples_sent = 0;
        for (&metric, &value) in &extraction.values {
            let sample = Sample {
                host: self.index,
                metric,
                value,
            };
            if self.samples_tx.send(sample).await.is_err() {
                tracing::debug!(host = %self.target, "Sample channel closed");
                break;
            }
            samples_sent += 1;
        }

        let elapsed = start.elapsed();
        tracing::debug!(
            host = %self.target,
            samples = samples_sent,
            elapsed_ms = elapsed.as_millis() as u64,
            "Host finished"
        );

        HostOutcome {
            index: self.index,
            address: self.target.address.clone(),
            status: HostStatus::Completed,
            samples_sent,
            parse_issues: extraction.issues,
            exit_code: output.exit_code,
            elapsed,
        }
    }
}

/// Resolves once shutdown is requested
///
/// A dropped sender means nobody can request shutdown any more, so this then
/// never resolves.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

impl std::fmt::Debug for HostWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostWorker")
            .field("index", &self.index)
            .field("target", &self.target)
            .field("executor", &self.executor.name())
            .field("bounded", &self.semaphore.is_some())
            .field("rate_limiter", &self.rate_limiter)
            .field("host_timeout", &self.host_timeout)
            .field("report_stream", &self.report_stream)
            .finish()
    }
}
