//! Integration tests for the Worker module

use super::*;
use crate::catalog::MetricId;
use crate::error::ErrorKind;
use crate::host::HostTarget;
use crate::samples::{Sample, SampleStore, collect_samples};
use crate::traits::{CommandOutput, OutputStream, RemoteError, RemoteExecutor};

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc, watch};

const REPORT: &str = "\
Transactions:\t\t        1200 hits
Availability:\t\t       99.50 %
Elapsed time:\t\t       30.02 secs
Data transferred:\t        1.75 MB
Response time:\t\t        0.12 secs
Transaction rate:\t       39.97 trans/sec
Throughput:\t\t        0.06 MB/sec
Concurrency:\t\t        4.95
Successful transactions:        1194
Failed transactions:\t           6
Longest transaction:\t        0.88
Shortest transaction:\t        0.01
";

// ============================================================================
// Mock RemoteExecutor
// ============================================================================

enum Reply {
    Output {
        stdout: String,
        stderr: String,
        exit_code: Option<i32>,
    },
    Refused,
    Denied,
}

struct MockExecutor {
    reply: Reply,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockExecutor {
    fn new(reply: Reply) -> Self {
        Self {
            reply,
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    fn stderr(text: &str) -> Self {
        Self::new(Reply::Output {
            stdout: String::new(),
            stderr: text.to_string(),
            exit_code: Some(0),
        })
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl RemoteExecutor for MockExecutor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn execute(
        &self,
        target: &HostTarget,
        _command: &str,
    ) -> Result<CommandOutput, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match &self.reply {
            Reply::Output {
                stdout,
                stderr,
                exit_code,
            } => Ok(CommandOutput {
                stdout: stdout.clone(),
                stderr: stderr.clone(),
                exit_code: *exit_code,
            }),
            Reply::Refused => Err(RemoteError::Connect(format!(
                "ssh: connect to host {} port {}: Connection refused",
                target.address, target.port
            ))),
            Reply::Denied => Err(RemoteError::Auth("Permission denied (publickey)".into())),
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

fn target(addr: &str) -> HostTarget {
    HostTarget::new(addr, 22, "root", "/root/.ssh/id_rsa")
}

fn create_test_worker(
    index: usize,
    executor: Arc<dyn RemoteExecutor>,
) -> (HostWorker, mpsc::Receiver<Sample>, watch::Sender<bool>) {
    let (samples_tx, samples_rx) = mpsc::channel(100);
    let (shutdown_tx, _) = watch::channel(false);

    let worker = HostWorkerBuilder::new(index)
        .target(target(&format!("10.0.0.{index}")))
        .command("siege -c 5 -t 30s http://web/")
        .executor(executor)
        .samples_tx(samples_tx)
        .build()
        .expect("Failed to build worker");

    (worker, samples_rx, shutdown_tx)
}

fn drain(rx: &mut mpsc::Receiver<Sample>) -> Vec<Sample> {
    let mut samples = Vec::new();
    while let Ok(sample) = rx.try_recv() {
        samples.push(sample);
    }
    samples
}

// ============================================================================
// Integration Tests
// ============================================================================

#[tokio::test]
async fn test_worker_sends_one_sample_per_metric() {
    let executor = Arc::new(MockExecutor::stderr(REPORT));
    let (worker, mut samples_rx, shutdown_tx) = create_test_worker(4, executor.clone());

    let outcome = worker.run(shutdown_tx.subscribe()).await;

    assert!(outcome.is_completed());
    assert_eq!(outcome.index, 4);
    assert_eq!(outcome.address, "10.0.0.4");
    assert_eq!(outcome.samples_sent, 12);
    assert_eq!(outcome.exit_code, Some(0));
    assert_eq!(executor.calls.load(Ordering::SeqCst), 1);

    let samples = drain(&mut samples_rx);
    assert_eq!(samples.len(), 12);
    assert!(samples.iter().all(|s| s.host == 4));
    assert!(samples.contains(&Sample {
        host: 4,
        metric: MetricId::FailedTransactions,
        value: 6.0,
    }));
}

#[tokio::test]
async fn test_worker_non_zero_exit_still_contributes() {
    let executor = Arc::new(MockExecutor::new(Reply::Output {
        stdout: String::new(),
        stderr: REPORT.to_string(),
        exit_code: Some(1),
    }));
    let (worker, mut samples_rx, shutdown_tx) = create_test_worker(0, executor);

    let outcome = worker.run(shutdown_tx.subscribe()).await;

    assert!(outcome.is_completed());
    assert_eq!(outcome.exit_code, Some(1));
    assert_eq!(drain(&mut samples_rx).len(), 12);
}

#[tokio::test]
async fn test_worker_reads_configured_stream() {
    let executor = Arc::new(MockExecutor::new(Reply::Output {
        stdout: "Transactions:\t\t 10 hits\n".to_string(),
        stderr: "Transactions:\t\t 20 hits\n".to_string(),
        exit_code: Some(0),
    }));
    let (samples_tx, mut samples_rx) = mpsc::channel(10);
    let (shutdown_tx, _) = watch::channel(false);

    let worker = HostWorkerBuilder::new(0)
        .target(target("a"))
        .command("siege")
        .executor(executor)
        .samples_tx(samples_tx)
        .report_stream(OutputStream::Stdout)
        .build()
        .unwrap();

    worker.run(shutdown_tx.subscribe()).await;

    let samples = drain(&mut samples_rx);
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].value, 10.0);
}

#[tokio::test]
async fn test_worker_no_report_completes_without_samples() {
    let executor = Arc::new(MockExecutor::stderr("bash: siege: command not found\n"));
    let (worker, mut samples_rx, shutdown_tx) = create_test_worker(0, executor);

    let outcome = worker.run(shutdown_tx.subscribe()).await;

    assert!(outcome.is_completed());
    assert_eq!(outcome.samples_sent, 0);
    assert!(drain(&mut samples_rx).is_empty());
}

#[tokio::test]
async fn test_worker_parse_issue_drops_only_that_metric() {
    let executor = Arc::new(MockExecutor::stderr(
        "Transactions:\t\t 1.2.3 hits\nAvailability:\t\t 97.00 %\n",
    ));
    let (worker, mut samples_rx, shutdown_tx) = create_test_worker(0, executor);

    let outcome = worker.run(shutdown_tx.subscribe()).await;

    assert!(outcome.is_completed());
    assert_eq!(outcome.samples_sent, 1);
    assert_eq!(outcome.parse_issues.len(), 1);
    assert_eq!(outcome.parse_issues[0].metric, MetricId::Transactions);

    let samples = drain(&mut samples_rx);
    assert_eq!(samples[0].metric, MetricId::Availability);
}

#[tokio::test]
async fn test_worker_connection_failure() {
    let executor = Arc::new(MockExecutor::new(Reply::Refused));
    let (worker, mut samples_rx, shutdown_tx) = create_test_worker(2, executor);

    let outcome = worker.run(shutdown_tx.subscribe()).await;

    let failure = outcome.failure().expect("host should have failed");
    assert_eq!(failure.kind, ErrorKind::Connection);
    assert!(failure.cause.contains("Connection refused"));
    assert_eq!(outcome.samples_sent, 0);
    assert!(drain(&mut samples_rx).is_empty());
}

#[tokio::test]
async fn test_worker_auth_failure() {
    let executor = Arc::new(MockExecutor::new(Reply::Denied));
    let (worker, _samples_rx, shutdown_tx) = create_test_worker(0, executor);

    let outcome = worker.run(shutdown_tx.subscribe()).await;

    assert_eq!(
        outcome.failure().map(|f| f.kind),
        Some(ErrorKind::Authentication)
    );
}

#[tokio::test]
async fn test_worker_timeout() {
    let executor =
        Arc::new(MockExecutor::stderr(REPORT).with_delay(Duration::from_millis(500)));
    let (samples_tx, mut samples_rx) = mpsc::channel(100);
    let (shutdown_tx, _) = watch::channel(false);

    let worker = HostWorkerBuilder::new(0)
        .target(target("slow"))
        .command("siege")
        .executor(executor)
        .samples_tx(samples_tx)
        .host_timeout(Duration::from_millis(20))
        .build()
        .unwrap();

    let outcome = worker.run(shutdown_tx.subscribe()).await;

    assert_eq!(outcome.failure().map(|f| f.kind), Some(ErrorKind::Timeout));
    assert!(outcome.elapsed < Duration::from_millis(500));
    assert!(drain(&mut samples_rx).is_empty());
}

#[tokio::test]
async fn test_worker_run_shutdown() {
    let executor = Arc::new(MockExecutor::stderr(REPORT).with_delay(Duration::from_secs(30)));
    let (worker, mut samples_rx, shutdown_tx) = create_test_worker(0, executor);

    let shutdown_rx = shutdown_tx.subscribe();
    let handle = tokio::spawn(async move { worker.run(shutdown_rx).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    shutdown_tx.send(true).expect("Failed to send shutdown");

    let outcome = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("Worker ignored shutdown")
        .expect("Worker task panicked");

    assert_eq!(outcome.failure().map(|f| f.kind), Some(ErrorKind::Cancelled));
    assert!(drain(&mut samples_rx).is_empty());
}

#[tokio::test]
async fn test_worker_dropped_shutdown_sender_does_not_cancel() {
    let executor = Arc::new(MockExecutor::stderr(REPORT).with_delay(Duration::from_millis(10)));
    let (worker, _samples_rx, shutdown_tx) = create_test_worker(0, executor);

    let shutdown_rx = shutdown_tx.subscribe();
    drop(shutdown_tx);

    let outcome = worker.run(shutdown_rx).await;
    assert!(outcome.is_completed());
}

#[tokio::test]
async fn test_workers_respect_semaphore() {
    let executor = Arc::new(MockExecutor::stderr(REPORT).with_delay(Duration::from_millis(20)));
    let semaphore = Arc::new(Semaphore::new(2));
    let (samples_tx, samples_rx) = mpsc::channel(16);
    let (shutdown_tx, _) = watch::channel(false);

    let collector = tokio::spawn(collect_samples(samples_rx, 16));

    let mut handles = Vec::new();
    for index in 0..6 {
        let worker = HostWorkerBuilder::new(index)
            .target(target(&format!("h{index}")))
            .command("siege")
            .executor(executor.clone())
            .samples_tx(samples_tx.clone())
            .semaphore(Some(semaphore.clone()))
            .build()
            .unwrap();
        handles.push(tokio::spawn(worker.run(shutdown_tx.subscribe())));
    }
    drop(samples_tx);

    for handle in handles {
        assert!(handle.await.unwrap().is_completed());
    }

    let store: SampleStore = collector.await.unwrap();
    assert_eq!(store.count(MetricId::Transactions), 6);
    assert!(executor.max_in_flight.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn test_worker_with_rate_limit() {
    let executor = Arc::new(MockExecutor::stderr(REPORT));
    let limiter = Arc::new(ConnectRateLimiter::new(Some(1000.0)));
    let (samples_tx, _samples_rx) = mpsc::channel(100);
    let (shutdown_tx, _) = watch::channel(false);

    let worker = HostWorkerBuilder::new(0)
        .target(target("a"))
        .command("siege")
        .executor(executor)
        .samples_tx(samples_tx)
        .rate_limiter(limiter)
        .build()
        .unwrap();

    let outcome = worker.run(shutdown_tx.subscribe()).await;
    assert!(outcome.is_completed());
}

#[tokio::test]
async fn test_worker_closed_channel_stops_forwarding() {
    let executor = Arc::new(MockExecutor::stderr(REPORT));
    let (worker, samples_rx, shutdown_tx) = create_test_worker(0, executor);
    drop(samples_rx);

    let outcome = worker.run(shutdown_tx.subscribe()).await;

    assert!(outcome.is_completed());
    assert_eq!(outcome.samples_sent, 0);
}

#[test]
fn test_worker_debug() {
    let executor = Arc::new(MockExecutor::stderr(REPORT));
    let (worker, _rx, _tx) = create_test_worker(1, executor);
    let debug = format!("{worker:?}");
    assert!(debug.contains("HostWorker"));
    assert!(debug.contains("mock"));
    assert!(debug.contains("10.0.0.1"));
}
