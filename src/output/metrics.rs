//! Metrics sink implementations

use crate::output::traits::MetricsSink;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Emits every metric as a `tracing` event under the `sumi_scout::metrics` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
    fn increment(&self, name: &str, by: u64) {
        tracing::trace!(target: "sumi_scout::metrics", counter = name, by);
    }

    fn timing(&self, name: &str, seconds: f64) {
        tracing::trace!(target: "sumi_scout::metrics", timing = name, seconds);
    }

    fn gauge(&self, name: &str, value: f64) {
        tracing::trace!(target: "sumi_scout::metrics", gauge = name, value);
    }
}

#[derive(Debug, Default)]
struct Recorded {
    counters: HashMap<String, u64>,
    timings: HashMap<String, Vec<f64>>,
    gauges: HashMap<String, f64>,
}

/// Keeps every metric in memory for later inspection
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    recorded: Mutex<Recorded>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.recorded.lock().counters.get(name).copied().unwrap_or(0)
    }

    pub fn timings(&self, name: &str) -> Vec<f64> {
        self.recorded
            .lock()
            .timings
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Last value set for a gauge
    pub fn gauge_value(&self, name: &str) -> Option<f64> {
        self.recorded.lock().gauges.get(name).copied()
    }
}

impl MetricsSink for InMemoryMetrics {
    fn increment(&self, name: &str, by: u64) {
        *self
            .recorded
            .lock()
            .counters
            .entry(name.to_string())
            .or_insert(0) += by;
    }

    fn timing(&self, name: &str, seconds: f64) {
        self.recorded
            .lock()
            .timings
            .entry(name.to_string())
            .or_default()
            .push(seconds);
    }

    fn gauge(&self, name: &str, value: f64) {
        self.recorded.lock().gauges.insert(name.to_string(), value);
    }
}
