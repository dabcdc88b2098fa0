//! Per-metric sample sets and the collector task that fills them
//!
//! Host workers never touch the sample sets directly. Each extracted value is
//! sent as a [`Sample`] over an mpsc channel and a single collector task owns
//! the [`SampleStore`], so appends from different hosts cannot race.

use std::collections::BTreeMap;

use tokio::sync::mpsc;

use crate::catalog::MetricId;

/// One extracted value from one host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Index of the host in the dispatched target list
    pub host: usize,
    /// Metric the value belongs to
    pub metric: MetricId,
    /// Parsed value
    pub value: f64,
}

/// Values of one metric in arrival order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSet {
    hosts: Vec<usize>,
    values: Vec<f64>,
}

impl SampleSet {
    /// Append a value contributed by `host`
    pub fn push(&mut self, host: usize, value: f64) {
        self.hosts.push(host);
        self.values.push(value);
    }

    /// Values in arrival order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Contributing host indices, parallel to [`values`](Self::values)
    pub fn hosts(&self) -> &[usize] {
        &self.hosts
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no host reported this metric
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Sample sets for every catalog metric
#[derive(Debug, Clone, PartialEq)]
pub struct SampleStore {
    sets: BTreeMap<MetricId, SampleSet>,
}

impl Default for SampleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleStore {
    /// Create a store with one empty set per catalog metric
    pub fn new() -> Self {
        let sets = MetricId::all()
            .iter()
            .map(|&id| (id, SampleSet::default()))
            .collect();
        Self { sets }
    }

    /// Record one sample
    pub fn record(&mut self, sample: Sample) {
        self.sets
            .entry(sample.metric)
            .or_default()
            .push(sample.host, sample.value);
    }

    /// Record a batch of samples
    pub fn record_all(&mut self, samples: &[Sample]) {
        samples.iter().for_each(|s| self.record(*s));
    }

    /// Sample set for `metric`
    pub fn get(&self, metric: MetricId) -> &SampleSet {
        // Every catalog metric is present from construction.
        &self.sets[&metric]
    }

    /// Number of samples recorded for `metric`
    pub fn count(&self, metric: MetricId) -> usize {
        self.get(metric).len()
    }

    /// Total samples across all metrics
    pub fn total(&self) -> usize {
        self.sets.values().map(SampleSet::len).sum()
    }
}

/// Tokio task that drains the sample channel into a [`SampleStore`]
///
/// Returns once every sender has been dropped.
pub async fn collect_samples(mut rx: mpsc::Receiver<Sample>, batch_size: usize) -> SampleStore {
    let mut store = SampleStore::new();
    let batch_size = batch_size.max(1);
    let mut batch = Vec::with_capacity(batch_size);

    // Block for the first sample; `None` means every sender is gone
    while let Some(sample) = rx.recv().await {
        batch.push(sample);

        while batch.len() < batch_size {
            match rx.try_recv() {
                Ok(sample) => batch.push(sample),
                Err(_) => break,
            }
        }

        store.record_all(&batch);
        batch.clear();
    }

    tracing::debug!(samples = store.total(), "Sample collector finished");
    store
}
