//! Orchestrator for the fleet fan-out
//!
//! The Orchestrator coordinates one run across every host:
//! - Spawning one worker task per target
//! - Bounding hosts in flight via an optional semaphore
//! - Managing cancellation via a watch channel
//! - Owning the sample collector and waiting for every host
//! - Reducing the sample sets into the fleet-wide report
//!
//! # Example
//!
//! ```ignore
//! use candia_core::OrchestratorBuilder;
//!
//! let orchestrator = OrchestratorBuilder::new()
//!     .concurrency(Some(64))
//!     .executor(executor)
//!     .build()?;
//!
//! let report = orchestrator
//!     .run_with_signal_handling(hosts.targets(), "siege -c 25 -t 60s http://web/")
//!     .await?;
//! ```

mod aggregator;
mod builder;
mod executor;

pub use aggregator::{DispatchOutcome, aggregate, reduce};
pub use builder::OrchestratorBuilder;
pub use executor::Orchestrator;
