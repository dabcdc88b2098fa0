//! Per-host results returned by workers

use std::time::Duration;

use serde::Serialize;

use crate::catalog::MetricId;
use crate::error::{BenchError, ErrorKind};
use crate::extractor::ParseIssue;

/// How a host finished
#[derive(Debug, Clone, PartialEq)]
pub enum HostStatus {
    /// The command ran to completion (whatever its exit status)
    Completed,
    /// The host failed before its output could be captured
    Failed(BenchError),
}

/// What one worker reports back to the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub struct HostOutcome {
    /// Position in the dispatched target list
    pub index: usize,
    /// Address of the host, as given
    pub address: String,
    /// Completed or failed, with cause
    pub status: HostStatus,
    /// Samples handed to the collector
    pub samples_sent: usize,
    /// Labels that matched but did not parse
    pub parse_issues: Vec<ParseIssue>,
    /// Remote exit status, when the command completed
    pub exit_code: Option<i32>,
    /// Time from dispatch to outcome, including any wait for a permit
    pub elapsed: Duration,
}

impl HostOutcome {
    /// Outcome for a host that never produced output
    pub fn failed(index: usize, address: impl Into<String>, error: BenchError) -> Self {
        Self {
            index,
            address: address.into(),
            status: HostStatus::Failed(error),
            samples_sent: 0,
            parse_issues: Vec::new(),
            exit_code: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Whether the remote command ran to completion
    pub fn is_completed(&self) -> bool {
        matches!(self.status, HostStatus::Completed)
    }

    /// Failure record, if the host failed
    pub fn failure(&self) -> Option<HostFailure> {
        match &self.status {
            HostStatus::Completed => None,
            HostStatus::Failed(err) => Some(HostFailure {
                address: self.address.clone(),
                kind: err.kind,
                cause: err.message.clone(),
            }),
        }
    }

    /// Parse issues tagged with this host's address
    pub fn host_parse_issues(&self) -> impl Iterator<Item = HostParseIssue> + '_ {
        self.parse_issues.iter().map(|issue| HostParseIssue {
            address: self.address.clone(),
            metric: issue.metric,
            raw: issue.raw.clone(),
        })
    }
}

/// A host that contributed nothing, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostFailure {
    /// Address of the host
    pub address: String,
    /// Failure classification
    pub kind: ErrorKind,
    /// Underlying cause
    pub cause: String,
}

impl std::fmt::Display for HostFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.address, self.cause, self.kind)
    }
}

/// A metric one host reported but whose value could not be parsed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostParseIssue {
    /// Address of the host
    pub address: String,
    /// Metric whose label matched
    pub metric: MetricId,
    /// Text captured after the label
    pub raw: String,
}
