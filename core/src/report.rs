//! Fleet-wide aggregate report

use serde::Serialize;

use crate::catalog::{Aggregation, MetricId};
use crate::worker::{HostFailure, HostParseIssue};

/// One line of the aggregate report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    /// Metric identifier
    pub metric: MetricId,
    /// Display label
    pub label: &'static str,
    /// Display unit, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    /// Rule used to combine hosts
    pub rule: Aggregation,
    /// Decimal places for display
    #[serde(skip)]
    pub precision: usize,
    /// Fleet-wide value (0 when no host reported the metric)
    pub value: f64,
    /// Number of hosts that contributed a value
    pub samples: usize,
}

impl ReportEntry {
    /// False when no host reported this metric
    ///
    /// `value` is then the defined zero, not a measurement.
    pub fn has_data(&self) -> bool {
        self.samples > 0
    }
}

/// Final result of a fleet run, produced once after every host finished
#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    /// One entry per catalog metric, in catalog order
    pub entries: Vec<ReportEntry>,
    /// Hosts dispatched
    pub hosts_total: usize,
    /// Hosts whose command ran to completion
    pub hosts_succeeded: usize,
    /// Hosts that failed, with cause
    pub failures: Vec<HostFailure>,
    /// Metrics dropped because their value did not parse
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parse_issues: Vec<HostParseIssue>,
    /// When dispatch started
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// When the last host finished
    pub finished_at: chrono::DateTime<chrono::Utc>,
}

impl AggregateReport {
    /// Entry for `metric`
    pub fn entry(&self, metric: MetricId) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.metric == metric)
    }

    /// Fleet-wide value for `metric`
    pub fn value(&self, metric: MetricId) -> Option<f64> {
        self.entry(metric).map(|e| e.value)
    }

    /// Hosts that failed
    pub fn hosts_failed(&self) -> usize {
        self.failures.len()
    }

    /// Wall clock time of the whole dispatch, in seconds
    pub fn duration_secs(&self) -> f64 {
        (self.finished_at - self.started_at)
            .num_microseconds()
            .unwrap_or(0) as f64
            / 1_000_000.0
    }

    /// True when every host failed
    pub fn all_failed(&self) -> bool {
        self.hosts_total > 0 && self.hosts_succeeded == 0
    }
}
