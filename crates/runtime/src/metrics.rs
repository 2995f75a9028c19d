use std::collections::BTreeMap;

use tracing::info;

/// Well-known metric names recorded by the overlay pipeline.
pub mod keys {
    pub const GEOSEARCH_REQUESTS: &str = "geosearch.requests";
    pub const FETCH_FAILURES: &str = "geosearch.failures";
    pub const ARTICLES_ADDED: &str = "articles.added";
    pub const SUMMARIES_FILLED: &str = "articles.summaries_filled";
    pub const STALE_RESULTS_DROPPED: &str = "articles.stale_dropped";
    pub const SUGGEST_REQUESTS: &str = "suggest.requests";
    pub const SUGGEST_FAILURES: &str = "suggest.failures";
    pub const RECENTERS: &str = "view.recenters";
    pub const BATCH_SIZE: &str = "geosearch.batch_size";
}

/// Deterministic metrics aggregation.
///
/// Metrics must not depend on wall-clock time or unordered iteration.
/// This type uses sorted maps so snapshots have stable ordering.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<String, u64>,
    histograms: BTreeMap<String, Histogram>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Histogram {
    pub count: u64,
    pub sum: u64,
    pub min: u64,
    pub max: u64,
}

impl Histogram {
    pub fn record(&mut self, value: u64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub counters: Vec<(String, u64)>,
    pub histograms: Vec<(String, Histogram)>,
}

impl MetricsSnapshot {
    pub fn counter(&self, name: &str) -> u64 {
        self.counters
            .iter()
            .find(|(k, _)| k == name)
            .map_or(0, |(_, v)| *v)
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn inc_counter(&mut self, name: &str, by: u64) {
        if by == 0 {
            return;
        }
        *self.counters.entry(name.to_string()).or_insert(0) += by;
    }

    pub fn record_histogram(&mut self, name: &str, value: u64) {
        self.histograms
            .entry(name.to_string())
            .or_default()
            .record(value);
    }

    pub fn histogram(&self, name: &str) -> Option<Histogram> {
        self.histograms.get(name).copied()
    }

    /// Returns a stable, sorted snapshot suitable for logs/debug UI.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            histograms: self
                .histograms
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
        }
    }

    /// Emits one `info` line per metric.
    pub fn log_summary(&self) {
        for (name, value) in &self.counters {
            info!(metric = %name, value, "counter");
        }
        for (name, h) in &self.histograms {
            info!(
                metric = %name,
                count = h.count,
                min = h.min,
                max = h.max,
                mean = h.mean().unwrap_or(0.0),
                "histogram"
            );
        }
    }
}
