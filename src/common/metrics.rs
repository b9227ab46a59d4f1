//! Metrics collection
//!
//! Prometheus-compatible counters for the gateway hot path and the
//! revalidation workflow, exposed on `/metrics`.

use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for monotonically increasing values
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Gauge for values that move both ways
#[derive(Debug, Default)]
pub struct Gauge {
    value: AtomicU64,
}

impl Gauge {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self) {
        let _ = self
            .value
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
                Some(v.saturating_sub(1))
            });
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Global metrics registry
#[derive(Debug, Default)]
pub struct Metrics {
    pub cache_hits: Counter,
    pub cache_misses: Counter,
    pub passthrough: Counter,
    pub origin_fetches: Counter,
    pub runs_triggered: Counter,
    pub runs_completed: Counter,
    pub runs_already_running: Counter,
    pub runs_failed: Counter,
    pub paths_warmed: Counter,
    pub warm_failures: Counter,
    pub active_runs: Gauge,
}

impl Metrics {
    /// Render the registry in Prometheus text exposition format
    pub fn to_prometheus(&self) -> String {
        let mut out = String::new();
        let counters: [(&str, &Counter); 10] = [
            ("warmgate_cache_hits_total", &self.cache_hits),
            ("warmgate_cache_misses_total", &self.cache_misses),
            ("warmgate_passthrough_total", &self.passthrough),
            ("warmgate_origin_fetches_total", &self.origin_fetches),
            ("warmgate_runs_triggered_total", &self.runs_triggered),
            ("warmgate_runs_completed_total", &self.runs_completed),
            (
                "warmgate_runs_already_running_total",
                &self.runs_already_running,
            ),
            ("warmgate_runs_failed_total", &self.runs_failed),
            ("warmgate_paths_warmed_total", &self.paths_warmed),
            ("warmgate_warm_failures_total", &self.warm_failures),
        ];
        for (name, counter) in counters {
            out += &format!("# TYPE {} counter\n{} {}\n", name, name, counter.get());
        }
        out += &format!(
            "# TYPE warmgate_active_runs gauge\nwarmgate_active_runs {}\n",
            self.active_runs.get()
        );
        out
    }
}

/// Global metrics instance
pub static METRICS: Lazy<Metrics> = Lazy::new(Metrics::default);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter() {
        let c = Counter::new();
        c.inc();
        c.add(2);
        assert_eq!(c.get(), 3);
    }

    #[test]
    fn test_gauge() {
        let g = Gauge::new();
        g.inc();
        g.inc();
        g.dec();
        assert_eq!(g.get(), 1);
        g.dec();
        g.dec(); // saturates at zero
        assert_eq!(g.get(), 0);
    }

    #[test]
    fn test_prometheus_output() {
        let m = Metrics::default();
        m.cache_hits.add(5);
        m.paths_warmed.add(12);
        let out = m.to_prometheus();
        assert!(out.contains("warmgate_cache_hits_total 5"));
        assert!(out.contains("warmgate_paths_warmed_total 12"));
        assert!(out.contains("# TYPE warmgate_active_runs gauge"));
    }
}
