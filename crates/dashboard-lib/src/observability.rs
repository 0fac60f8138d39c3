//! Observability infrastructure for the dashboard
//!
//! Provides:
//! - Prometheus metrics (load latency, rows loaded, cache hits, views rendered)
//! - Structured logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge_vec,
    Histogram, IntCounter, IntCounterVec, IntGaugeVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for dataset load latency (in seconds)
const LOAD_LATENCY_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<DashboardMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct DashboardMetricsInner {
    load_latency_seconds: Histogram,
    rows_loaded: IntGaugeVec,
    load_errors: IntCounterVec,
    cache_hits: IntCounter,
    cache_misses: IntCounter,
    views_rendered: IntCounterVec,
    exports_generated: IntCounterVec,
}

impl DashboardMetricsInner {
    fn new() -> Self {
        Self {
            load_latency_seconds: register_histogram!(
                "costdash_load_latency_seconds",
                "Time spent reading and parsing a recommendation table",
                LOAD_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register load_latency_seconds"),

            rows_loaded: register_int_gauge_vec!(
                "costdash_rows_loaded",
                "Number of recommendation rows currently loaded per domain",
                &["domain"]
            )
            .expect("Failed to register rows_loaded"),

            load_errors: register_int_counter_vec!(
                "costdash_load_errors_total",
                "Total number of failed dataset loads",
                &["domain"]
            )
            .expect("Failed to register load_errors"),

            cache_hits: register_int_counter!(
                "costdash_cache_hits_total",
                "Dataset requests served from the cache"
            )
            .expect("Failed to register cache_hits"),

            cache_misses: register_int_counter!(
                "costdash_cache_misses_total",
                "Dataset requests that required parsing the source"
            )
            .expect("Failed to register cache_misses"),

            views_rendered: register_int_counter_vec!(
                "costdash_views_rendered_total",
                "Dashboard views computed per domain",
                &["domain"]
            )
            .expect("Failed to register views_rendered"),

            exports_generated: register_int_counter_vec!(
                "costdash_exports_generated_total",
                "Filtered CSV exports generated per domain",
                &["domain"]
            )
            .expect("Failed to register exports_generated"),
        }
    }
}

/// Dashboard metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct DashboardMetrics {
    _private: (),
}

impl Default for DashboardMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(DashboardMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &DashboardMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_load_latency(&self, duration_secs: f64) {
        self.inner().load_latency_seconds.observe(duration_secs);
    }

    pub fn set_rows_loaded(&self, domain: &str, rows: i64) {
        self.inner().rows_loaded.with_label_values(&[domain]).set(rows);
    }

    pub fn inc_load_errors(&self, domain: &str) {
        self.inner().load_errors.with_label_values(&[domain]).inc();
    }

    pub fn inc_cache_hits(&self) {
        self.inner().cache_hits.inc();
    }

    pub fn inc_cache_misses(&self) {
        self.inner().cache_misses.inc();
    }

    pub fn inc_views_rendered(&self, domain: &str) {
        self.inner().views_rendered.with_label_values(&[domain]).inc();
    }

    pub fn inc_exports_generated(&self, domain: &str) {
        self.inner().exports_generated.with_label_values(&[domain]).inc();
    }
}

/// Structured logger for dashboard events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    /// Log a successful dataset load
    pub fn log_dataset_loaded(&self, domain: &str, path: &str, rows: usize, checksum: &str) {
        info!(
            event = "dataset_loaded",
            instance = %self.instance,
            domain = %domain,
            path = %path,
            rows = rows,
            checksum = %checksum,
            "Loaded recommendation dataset"
        );
    }

    /// Log a dataset that could not be loaded
    pub fn log_dataset_unavailable(&self, domain: &str, path: &str, reason: &str) {
        warn!(
            event = "dataset_unavailable",
            instance = %self.instance,
            domain = %domain,
            path = %path,
            reason = %reason,
            "Dataset unavailable, domain disabled"
        );
    }

    pub fn log_cache_hit(&self, domain: &str, path: &str) {
        tracing::debug!(
            event = "cache_hit",
            instance = %self.instance,
            domain = %domain,
            path = %path,
            "Served dataset from cache"
        );
    }

    /// Log a TTL expiry that found the source unchanged
    pub fn log_cache_refreshed(&self, domain: &str, path: &str, changed: bool) {
        info!(
            event = "cache_refreshed",
            instance = %self.instance,
            domain = %domain,
            path = %path,
            changed = changed,
            "Revalidated cached dataset"
        );
    }

    pub fn log_export(&self, domain: &str, file_name: &str, rows: usize) {
        info!(
            event = "export_generated",
            instance = %self.instance,
            domain = %domain,
            file_name = %file_name,
            rows = rows,
            "Generated filtered data export"
        );
    }

    pub fn log_startup(&self, version: &str, data_dir: &str) {
        info!(
            event = "server_started",
            instance = %self.instance,
            version = %version,
            data_dir = %data_dir,
            "Cost dashboard started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "server_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Cost dashboard shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_metrics_creation() {
        // Metrics register into the global Prometheus registry once per process.
        let metrics = DashboardMetrics::new();
        let again = DashboardMetrics::new();

        metrics.observe_load_latency(0.002);
        metrics.set_rows_loaded("dataflow", 42);
        metrics.inc_load_errors("cloudsql");
        metrics.inc_cache_hits();
        again.inc_cache_misses();
        again.inc_views_rendered("overview");
        again.inc_exports_generated("kubernetes");
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-instance");
        assert_eq!(logger.instance, "test-instance");
    }
}
