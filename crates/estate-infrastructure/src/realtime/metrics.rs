use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for the store's write and notification traffic.
#[derive(Default)]
pub struct StoreMetrics {
    pub writes_total: AtomicU64,
    pub events_published_total: AtomicU64,
    pub events_lagged_total: AtomicU64,
    pub timeouts_total: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub writes_total: u64,
    pub events_published_total: u64,
    pub events_lagged_total: u64,
    pub timeouts_total: u64,
    pub topics: u64,
}

impl StoreMetrics {
    pub fn inc_writes(&self) {
        self.writes_total.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_published(&self) {
        self.events_published_total.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_lagged(&self) {
        self.events_lagged_total.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_timeouts(&self) {
        self.timeouts_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, topics: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            writes_total: self.writes_total.load(Ordering::Relaxed),
            events_published_total: self.events_published_total.load(Ordering::Relaxed),
            events_lagged_total: self.events_lagged_total.load(Ordering::Relaxed),
            timeouts_total: self.timeouts_total.load(Ordering::Relaxed),
            topics,
        }
    }
}
