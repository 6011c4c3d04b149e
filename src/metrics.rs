// Counters for message loading, shared across request handlers

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use utoipa::ToSchema;

#[derive(Debug, Default)]
pub struct LoadMetrics {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    network_failures: AtomicU64,
    filesystem_failures: AtomicU64,
    load_errors: AtomicU64,
    loads: AtomicU64,
    total_load_micros: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub network_failures: u64,
    pub filesystem_failures: u64,
    pub total_errors: u64,
    pub loads: u64,
    pub average_load_ms: f64,
}

impl LoadMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_network_failure(&self) {
        self.network_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_filesystem_failure(&self) {
        self.filesystem_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load_error(&self) {
        self.load_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one successful tier load and how long it took.
    pub fn record_load(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.total_load_micros.fetch_add(micros, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let loads = self.loads.load(Ordering::Relaxed);
        let total_micros = self.total_load_micros.load(Ordering::Relaxed);
        let average_load_ms = if loads == 0 {
            0.0
        } else {
            total_micros as f64 / loads as f64 / 1000.0
        };

        MetricsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            network_failures: self.network_failures.load(Ordering::Relaxed),
            filesystem_failures: self.filesystem_failures.load(Ordering::Relaxed),
            total_errors: self.load_errors.load(Ordering::Relaxed),
            loads,
            average_load_ms,
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.cache_hits,
            &self.cache_misses,
            &self.network_failures,
            &self.filesystem_failures,
            &self.load_errors,
            &self.loads,
            &self.total_load_micros,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
