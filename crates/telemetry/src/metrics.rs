//! In-process metrics.
//!
//! Lock-free counters, gauges and latency histograms read through
//! [`Metrics::snapshot`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge metric, set to the latest observed value.
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 10s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 10000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for (i, &bound) in Self::BUCKET_BOUNDS.iter().enumerate() {
            if ms <= bound {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        // Value exceeds all buckets, add to last
        self.buckets[10].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// `(upper bound in ms, count)` per bucket.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for Meteora Nexus.
#[derive(Debug, Default)]
pub struct Metrics {
    // Recorder metrics
    pub events_tracked: Counter,
    pub events_forwarded: Counter,
    pub forward_errors: Counter,
    pub web_vitals_reported: Counter,

    // Collection endpoint metrics
    pub events_collected: Counter,
    pub events_rejected: Counter,
    pub rate_limited_requests: Counter,
    pub rate_limiter_cleanups: Counter,

    // Latency histograms
    pub collect_latency_ms: Histogram,
    pub forward_latency_ms: Histogram,

    // Gauges
    pub tracked_clients: Gauge,
    pub buffered_events: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub events_tracked: u64,
    pub events_forwarded: u64,
    pub forward_errors: u64,
    pub web_vitals_reported: u64,
    pub events_collected: u64,
    pub events_rejected: u64,
    pub rate_limited_requests: u64,
    pub rate_limiter_cleanups: u64,
    pub collect_latency_mean_ms: f64,
    pub collect_latency_buckets: Vec<(u64, u64)>,
    pub forward_latency_mean_ms: f64,
    pub forward_latency_buckets: Vec<(u64, u64)>,
    pub tracked_clients: u64,
    pub buffered_events: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            events_tracked: self.events_tracked.get(),
            events_forwarded: self.events_forwarded.get(),
            forward_errors: self.forward_errors.get(),
            web_vitals_reported: self.web_vitals_reported.get(),
            events_collected: self.events_collected.get(),
            events_rejected: self.events_rejected.get(),
            rate_limited_requests: self.rate_limited_requests.get(),
            rate_limiter_cleanups: self.rate_limiter_cleanups.get(),
            collect_latency_mean_ms: self.collect_latency_ms.mean(),
            collect_latency_buckets: self.collect_latency_ms.buckets(),
            forward_latency_mean_ms: self.forward_latency_ms.mean(),
            forward_latency_buckets: self.forward_latency_ms.buckets(),
            tracked_clients: self.tracked_clients.get(),
            buffered_events: self.buffered_events.get(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
