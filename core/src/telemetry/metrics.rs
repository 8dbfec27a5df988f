use serde::Serialize;
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

/// Counters accumulated across every worker of a dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub tracks_processed: usize,
    pub tracks_failed: usize,
    pub fixes_flagged: usize,
    pub malformed_rows: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_processed(&self, flagged: usize, malformed: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.tracks_processed += 1;
            metrics.fixes_flagged += flagged;
            metrics.malformed_rows += malformed;
        }
    }

    /// Counts a failed track along with the malformed rows found before it failed.
    pub fn record_failed(&self, malformed: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.tracks_failed += 1;
            metrics.malformed_rows += malformed;
        }
    }

    pub fn snapshot(&self) -> Metrics {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            Metrics::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
