//! Pulls catalog metrics out of one host's free-text report

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{MetricId, definitions};

/// A label that matched but whose value is not a number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseIssue {
    /// Metric whose label matched
    pub metric: MetricId,
    /// Text captured after the label
    pub raw: String,
}

impl std::fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: unparsable value {:?}", self.metric, self.raw)
    }
}

/// Metrics found in one report
///
/// Absence of a key means the metric did not appear in the text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Parsed values, keyed by metric
    pub values: BTreeMap<MetricId, f64>,
    /// Matched labels whose value failed to parse
    pub issues: Vec<ParseIssue>,
}

impl Extraction {
    /// Value for `metric`, if it was found and parsed
    pub fn get(&self, metric: MetricId) -> Option<f64> {
        self.values.get(&metric).copied()
    }

    /// True when nothing matched at all
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.issues.is_empty()
    }
}

/// Extract every catalog metric present in `text`
///
/// A malformed numeral only drops that one metric; the rest of the report is
/// still used.
pub fn extract(text: &str) -> Extraction {
    let mut extraction = Extraction::default();

    for def in definitions() {
        let Some(raw) = def.find(text) else {
            continue;
        };
        match raw.parse::<f64>() {
            Ok(value) => {
                extraction.values.insert(def.id, value);
            }
            Err(_) => extraction.issues.push(ParseIssue {
                metric: def.id,
                raw: raw.to_string(),
            }),
        }
    }

    extraction
}
