//! Run metrics reporting

use std::sync::Mutex;

use tracing::info;

/// Name of the per-run record count metric.
pub const RECORDS_COUNTER: &str = "records";

/// Receives counters from a completed run.
///
/// Fire-and-forget: the pipeline neither retries nor inspects a result.
pub trait MetricsSink: Send + Sync {
    /// Record a counter value.
    fn record(&self, name: &str, value: u64);
}

/// Sink that logs counters through `tracing`
#[derive(Debug, Default)]
pub struct LogMetrics;

impl MetricsSink for LogMetrics {
    fn record(&self, name: &str, value: u64) {
        info!(counter = name, value, "run metric");
    }
}

/// Sink that collects counters in memory, for tests and embedding
#[derive(Debug, Default)]
pub struct CollectingMetrics {
    counters: Mutex<Vec<(String, u64)>>,
}

impl CollectingMetrics {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn snapshot(&self) -> Vec<(String, u64)> {
        self.counters.lock().unwrap().clone()
    }
}

impl MetricsSink for CollectingMetrics {
    fn record(&self, name: &str, value: u64) {
        self.counters.lock().unwrap().push((name.to_string(), value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink_records_in_order() {
        let sink = CollectingMetrics::new();
        sink.record(RECORDS_COUNTER, 3);
        sink.record("bytes", 120);
        assert_eq!(
            sink.snapshot(),
            vec![(RECORDS_COUNTER.to_string(), 3), ("bytes".to_string(), 120)]
        );
    }
}
