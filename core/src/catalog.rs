//! Static catalog of recognised report metrics
//!
//! Each entry pairs the label the load generator prints with the rule used to
//! combine that metric across hosts. Catalog order is report order.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Identifier for every metric the catalog knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricId {
    /// Completed transactions (hits)
    Transactions,
    /// Percentage of successful transactions
    Availability,
    /// Wall clock duration of the run
    ElapsedTime,
    /// Megabytes transferred
    DataTransferred,
    /// Mean response time in seconds
    ResponseTime,
    /// Transactions per second
    TransactionRate,
    /// Megabytes per second
    Throughput,
    /// Average number of simultaneous connections
    Concurrency,
    /// Transactions that returned a success status
    SuccessfulTransactions,
    /// Transactions that failed
    FailedTransactions,
    /// Slowest single transaction
    LongestTransaction,
    /// Fastest single transaction
    ShortestTransaction,
}

impl MetricId {
    /// All metrics in report order
    pub fn all() -> &'static [MetricId] {
        &[
            MetricId::Transactions,
            MetricId::Availability,
            MetricId::ElapsedTime,
            MetricId::DataTransferred,
            MetricId::ResponseTime,
            MetricId::TransactionRate,
            MetricId::Throughput,
            MetricId::Concurrency,
            MetricId::SuccessfulTransactions,
            MetricId::FailedTransactions,
            MetricId::LongestTransaction,
            MetricId::ShortestTransaction,
        ]
    }

    /// The label as printed by the load generator, without the colon
    pub fn label(&self) -> &'static str {
        match self {
            MetricId::Transactions => "Transactions",
            MetricId::Availability => "Availability",
            MetricId::ElapsedTime => "Elapsed time",
            MetricId::DataTransferred => "Data transferred",
            MetricId::ResponseTime => "Response time",
            MetricId::TransactionRate => "Transaction rate",
            MetricId::Throughput => "Throughput",
            MetricId::Concurrency => "Concurrency",
            MetricId::SuccessfulTransactions => "Successful transactions",
            MetricId::FailedTransactions => "Failed transactions",
            MetricId::LongestTransaction => "Longest transaction",
            MetricId::ShortestTransaction => "Shortest transaction",
        }
    }

    /// Catalog entry for this metric
    pub fn definition(&self) -> &'static MetricDefinition {
        // The catalog is built from `MetricId::all()`, so position == discriminant.
        &CATALOG[*self as usize]
    }
}

impl std::fmt::Display for MetricId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How per-host values of one metric become a single fleet-wide value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Arithmetic sum
    Sum,
    /// Arithmetic mean
    Average,
    /// Largest value
    Maximum,
    /// Smallest value
    Minimum,
}

impl std::fmt::Display for Aggregation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Aggregation::Sum => write!(f, "sum"),
            Aggregation::Average => write!(f, "avg"),
            Aggregation::Maximum => write!(f, "max"),
            Aggregation::Minimum => write!(f, "min"),
        }
    }
}

/// One catalog entry
#[derive(Debug)]
pub struct MetricDefinition {
    /// Metric identifier
    pub id: MetricId,
    /// Unit shown after the value, if any
    pub unit: Option<&'static str>,
    /// Cross-host combination rule
    pub rule: Aggregation,
    /// Decimal places used when rendering
    pub precision: usize,
    /// Matches `<Label>:<blanks><number>` and captures the number
    pub pattern: Regex,
}

impl MetricDefinition {
    fn new(id: MetricId, unit: Option<&'static str>, rule: Aggregation, precision: usize) -> Self {
        let pattern = Regex::new(&format!(r"{}:[\t ]*([0-9.]+)", regex::escape(id.label())))
            .unwrap_or_else(|e| panic!("invalid catalog pattern for {id}: {e}"));
        Self {
            id,
            unit,
            rule,
            precision,
            pattern,
        }
    }

    /// Label as printed by the load generator
    pub fn label(&self) -> &'static str {
        self.id.label()
    }

    /// Captured numeral of the first match in `text`, if any
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

static CATALOG: LazyLock<Vec<MetricDefinition>> = LazyLock::new(|| {
    use Aggregation::*;

    MetricId::all()
        .iter()
        .map(|&id| match id {
            MetricId::Transactions => MetricDefinition::new(id, Some("hits"), Sum, 0),
            MetricId::Availability => MetricDefinition::new(id, Some("%"), Average, 2),
            MetricId::ElapsedTime => MetricDefinition::new(id, Some("secs"), Maximum, 2),
            MetricId::DataTransferred => MetricDefinition::new(id, Some("MB"), Sum, 2),
            MetricId::ResponseTime => MetricDefinition::new(id, Some("secs"), Average, 2),
            MetricId::TransactionRate => MetricDefinition::new(id, Some("trans/sec"), Sum, 2),
            MetricId::Throughput => MetricDefinition::new(id, Some("MB/sec"), Sum, 2),
            MetricId::Concurrency => MetricDefinition::new(id, None, Sum, 2),
            MetricId::SuccessfulTransactions => MetricDefinition::new(id, None, Sum, 0),
            MetricId::FailedTransactions => MetricDefinition::new(id, None, Sum, 0),
            MetricId::LongestTransaction => MetricDefinition::new(id, None, Maximum, 2),
            MetricId::ShortestTransaction => MetricDefinition::new(id, None, Minimum, 2),
        })
        .collect()
});

/// Every metric definition, in report order
pub fn definitions() -> &'static [MetricDefinition] {
    &CATALOG
}
