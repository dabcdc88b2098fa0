//! candia-core: Fan-out and aggregation engine for fleet load generation
//!
//! This crate provides everything between a host list and the fleet-wide
//! report, including:
//!
//! - The metric catalog and report-text extractor
//! - Host targets and host-list merging
//! - The remote executor seam (RemoteExecutor)
//! - Per-host workers, the sample collector, and the orchestrator
//! - Cross-host aggregation
//! - Error handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod channel;
pub mod config;
pub mod error;
pub mod extractor;
pub mod host;
pub mod orchestrator;
pub mod report;
pub mod samples;
pub mod traits;
pub mod worker;

pub use catalog::{Aggregation, MetricDefinition, MetricId, definitions};
pub use channel::ChannelConfig;
pub use config::{ConfigError, FleetConfig};
pub use error::*;
pub use extractor::{Extraction, ParseIssue, extract};
pub use host::{HostDefaults, HostList, HostTarget, resolve_identity};
pub use orchestrator::{DispatchOutcome, Orchestrator, OrchestratorBuilder, aggregate, reduce};
pub use report::{AggregateReport, ReportEntry};
pub use samples::{Sample, SampleSet, SampleStore, collect_samples};
pub use traits::*;
pub use worker::{
    ConnectRateLimiter, HostFailure, HostOutcome, HostParseIssue, HostStatus, HostWorker,
    HostWorkerBuilder,
};
