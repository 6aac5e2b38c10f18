use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Row counters shared by every worker of a run.
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    transactions_loaded: AtomicU64,
    transactions_valued: AtomicU64,
    aggregates: AtomicU64,
    output_rows: AtomicU64,
}

impl MetricsRegistry {
    pub fn inc_transactions_loaded(&self, delta: u64) {
        self.inner.transactions_loaded.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_transactions_valued(&self, delta: u64) {
        self.inner.transactions_valued.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_aggregates(&self, delta: u64) {
        self.inner.aggregates.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_output_rows(&self, delta: u64) {
        self.inner.output_rows.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let loaded = self.inner.transactions_loaded.load(Ordering::Relaxed);
        let valued = self.inner.transactions_valued.load(Ordering::Relaxed);
        MetricsSnapshot {
            transactions_loaded: loaded,
            transactions_valued: valued,
            transactions_excluded: loaded.saturating_sub(valued),
            aggregates: self.inner.aggregates.load(Ordering::Relaxed),
            output_rows: self.inner.output_rows.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub transactions_loaded: u64,
    pub transactions_valued: u64,
    pub transactions_excluded: u64,
    pub aggregates: u64,
    pub output_rows: u64,
}

impl MetricsSnapshot {
    pub fn to_json_line(&self, label: &str, elapsed: Option<Duration>) -> String {
        #[derive(Serialize)]
        struct Snapshot<'a> {
            label: &'a str,
            #[serde(flatten)]
            counters: &'a MetricsSnapshot,
            elapsed_ms: Option<u128>,
        }

        let payload = Snapshot { label, counters: self, elapsed_ms: elapsed.map(|d| d.as_millis()) };
        serde_json::to_string(&payload).unwrap_or_else(|_| String::from("{}"))
    }
}

pub struct StageTimer {
    start: Instant,
}

impl StageTimer {
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
