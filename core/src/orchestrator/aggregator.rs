//! Reduction of per-metric sample sets into the fleet-wide report

use chrono::{DateTime, Utc};

use crate::catalog::{Aggregation, definitions};
use crate::report::{AggregateReport, ReportEntry};
use crate::samples::SampleStore;
use crate::worker::{HostFailure, HostOutcome};

/// Everything the fan-out produced, before reduction
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// Per-metric sample sets, frozen after every host finished
    pub samples: SampleStore,
    /// One outcome per dispatched target, in target order
    pub hosts: Vec<HostOutcome>,
    /// Hosts that contributed nothing, in target order
    pub failures: Vec<HostFailure>,
    /// When dispatch started
    pub started_at: DateTime<Utc>,
    /// When the last host finished
    pub finished_at: DateTime<Utc>,
}

impl DispatchOutcome {
    /// Hosts whose command ran to completion
    pub fn hosts_succeeded(&self) -> usize {
        self.hosts.iter().filter(|h| h.is_completed()).count()
    }

    /// Reduce the sample sets and attach the host summary
    pub fn into_report(self) -> AggregateReport {
        let entries = aggregate(&self.samples);
        let hosts_succeeded = self.hosts_succeeded();
        let parse_issues = self
            .hosts
            .iter()
            .flat_map(HostOutcome::host_parse_issues)
            .collect();

        AggregateReport {
            entries,
            hosts_total: self.hosts.len(),
            hosts_succeeded,
            failures: self.failures,
            parse_issues,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

/// Apply `rule` to `values`
///
/// An empty slice reduces to 0 for every rule; callers flag that case by the
/// sample count. Sums are taken in sorted order, so the result is the same
/// bit for bit whatever order the hosts reported in.
pub fn reduce(rule: Aggregation, values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    match rule {
        Aggregation::Sum => sorted_sum(values),
        Aggregation::Average => sorted_sum(values) / values.len() as f64,
        Aggregation::Maximum => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Aggregation::Minimum => values.iter().copied().fold(f64::INFINITY, f64::min),
    }
}

fn sorted_sum(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.iter().sum()
}

/// Reduce every catalog metric, in catalog order
pub fn aggregate(samples: &SampleStore) -> Vec<ReportEntry> {
    definitions()
        .iter()
        .map(|def| {
            let set = samples.get(def.id);
            ReportEntry {
                metric: def.id,
                label: def.label(),
                unit: def.unit,
                rule: def.rule,
                precision: def.precision,
                value: reduce(def.rule, set.values()),
                samples: set.len(),
            }
        })
        .collect()
}
