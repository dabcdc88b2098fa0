//! Worker module for running the command on one host
//!
//! A HostWorker is a one-shot tokio task: it owns a single target and walks
//! it through **wait -> execute -> extract -> forward** exactly once.
//!
//! 1. Waits for a concurrency permit (optional) and a connect rate slot
//! 2. Executes the command via a RemoteExecutor under the host deadline
//! 3. Extracts catalog metrics from the captured report text
//! 4. Sends one Sample per metric to the collector via channel
//!
//! Host-level failures never propagate as errors. They are folded into the
//! returned [`HostOutcome`] so one bad host cannot stop the fleet.
//!
//! # Example
//!
//! ```ignore
//! use candia_core::worker::HostWorkerBuilder;
//!
//! let worker = HostWorkerBuilder::new(0)
//!     .target(target)
//!     .command("siege -c 25 -t 30s http://10.0.0.1/")
//!     .executor(executor)
//!     .samples_tx(tx)
//!     .rate_limiter(limiter)
//!     .build()?;
//!
//! let outcome = worker.run(shutdown_rx).await;
//! println!("{}: {} samples", outcome.address, outcome.samples_sent);
//! ```

mod builder;
mod executor;
mod outcome;
mod rate_limiter;

pub use builder::HostWorkerBuilder;
pub use executor::HostWorker;
pub use outcome::{HostFailure, HostOutcome, HostParseIssue, HostStatus};
pub use rate_limiter::{ConnectRateLimiter, session_period};

#[cfg(test)]
mod tests;
