//! Error counters and the submitted-values distribution for the meta test.

use std::collections::BTreeMap;
use std::sync::{Mutex, OnceLock};

use serde::Serialize;

/// Upper bound of the last finite histogram bucket.
const HISTOGRAM_MAX_BUCKET: usize = 20;

/// Receiver of the observations the meta test emits.
pub trait MetricsSink {
    /// Increment the error counter for `(test, step)` by one.
    fn inc_error(&self, test: &str, step: &str);

    /// Record how many meta values a client submitted in a successful exchange.
    fn observe_submitted_meta_values(&self, count: usize);
}

/// Sink that drops every observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn inc_error(&self, _test: &str, _step: &str) {}

    fn observe_submitted_meta_values(&self, _count: usize) {}
}

/// In-process recorder.
///
/// The histogram uses linear buckets `0..=20` plus an overflow bucket.
#[derive(Debug, Default)]
pub struct MetaMetrics {
    inner: Mutex<Recorded>,
}

#[derive(Debug, Default, Clone)]
struct Recorded {
    errors: BTreeMap<(String, String), u64>,
    buckets: [u64; HISTOGRAM_MAX_BUCKET + 2],
    observations: u64,
    sum: u64,
}

/// Point-in-time copy of a [`MetaMetrics`] recorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub errors: Vec<ErrorCount>,
    pub submitted_meta_values: HistogramSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorCount {
    pub test: String,
    pub step: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistogramSnapshot {
    pub count: u64,
    pub sum: u64,
    /// Non-cumulative bucket counts; index `i` holds observations equal to `i`,
    /// the final entry holds everything above 20.
    pub buckets: Vec<u64>,
}

impl MetaMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of the error counter for `(test, step)`.
    pub fn error_count(&self, test: &str, step: &str) -> u64 {
        let recorded = self.lock();
        recorded
            .errors
            .get(&(test.to_string(), step.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let recorded = self.lock().clone();
        MetricsSnapshot {
            errors: recorded
                .errors
                .into_iter()
                .map(|((test, step), count)| ErrorCount { test, step, count })
                .collect(),
            submitted_meta_values: HistogramSnapshot {
                count: recorded.observations,
                sum: recorded.sum,
                buckets: recorded.buckets.to_vec(),
            },
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MetricsSink for MetaMetrics {
    fn inc_error(&self, test: &str, step: &str) {
        let mut recorded = self.lock();
        *recorded
            .errors
            .entry((test.to_string(), step.to_string()))
            .or_insert(0) += 1;
    }

    fn observe_submitted_meta_values(&self, count: usize) {
        let mut recorded = self.lock();
        let bucket = count.min(HISTOGRAM_MAX_BUCKET + 1);
        recorded.buckets[bucket] += 1;
        recorded.observations += 1;
        recorded.sum += count as u64;
    }
}

/// Process-wide recorder used by [`manage_test`](crate::manage_test).
pub fn global() -> &'static MetaMetrics {
    static GLOBAL: OnceLock<MetaMetrics> = OnceLock::new();
    GLOBAL.get_or_init(MetaMetrics::new)
}
