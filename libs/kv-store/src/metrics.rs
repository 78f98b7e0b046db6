//! Storage metrics for observability

use prometheus::{CounterVec, Opts, Registry};
use std::sync::OnceLock;

use crate::keys::StorageKey;

static METRICS: OnceLock<StorageMetricsInner> = OnceLock::new();

struct StorageMetricsInner {
    hits: CounterVec,
    misses: CounterVec,
    writes: CounterVec,
    rejected_writes: CounterVec,
    removals: CounterVec,
    errors: CounterVec,
}

fn counter(name: &str, help: &str, labels: &[&str]) -> CounterVec {
    CounterVec::new(Opts::new(name, help), labels).expect("valid metric definition")
}

impl StorageMetricsInner {
    fn new() -> Self {
        Self {
            hits: counter("kv_store_hits_total", "Total storage reads that found a value", &["entity"]),
            misses: counter("kv_store_misses_total", "Total storage reads that found nothing", &["entity"]),
            writes: counter("kv_store_writes_total", "Total successful storage writes", &["entity"]),
            rejected_writes: counter(
                "kv_store_rejected_writes_total",
                "Total writes rejected before reaching the backend",
                &["entity"],
            ),
            removals: counter("kv_store_removals_total", "Total storage key removals", &["entity"]),
            errors: counter(
                "kv_store_errors_total",
                "Total storage errors",
                &["entity", "error_type"],
            ),
        }
    }

    fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.hits.clone()))?;
        registry.register(Box::new(self.misses.clone()))?;
        registry.register(Box::new(self.writes.clone()))?;
        registry.register(Box::new(self.rejected_writes.clone()))?;
        registry.register(Box::new(self.removals.clone()))?;
        registry.register(Box::new(self.errors.clone()))?;
        Ok(())
    }
}

fn get_metrics() -> &'static StorageMetricsInner {
    METRICS.get_or_init(StorageMetricsInner::new)
}

fn entity(key: &str) -> &str {
    StorageKey::entity_type(key).unwrap_or("unknown")
}

/// Storage metrics wrapper
#[derive(Clone, Debug, Default)]
pub struct StorageMetrics;

impl StorageMetrics {
    pub fn new() -> Self {
        Self
    }

    /// Register metrics with a Prometheus registry
    pub fn register(registry: &Registry) -> Result<(), prometheus::Error> {
        get_metrics().register(registry)
    }

    pub fn record_hit(&self, key: &str) {
        get_metrics().hits.with_label_values(&[entity(key)]).inc();
    }

    pub fn record_miss(&self, key: &str) {
        get_metrics().misses.with_label_values(&[entity(key)]).inc();
    }

    pub fn record_write(&self, key: &str) {
        get_metrics().writes.with_label_values(&[entity(key)]).inc();
    }

    pub fn record_rejected_write(&self, key: &str) {
        get_metrics()
            .rejected_writes
            .with_label_values(&[entity(key)])
            .inc();
    }

    pub fn record_removal(&self, key: &str) {
        get_metrics().removals.with_label_values(&[entity(key)]).inc();
    }

    pub fn record_error(&self, key: &str, error_type: &str) {
        get_metrics()
            .errors
            .with_label_values(&[entity(key), error_type])
            .inc();
    }

    /// Current write count for an entity label
    pub fn writes(&self, entity: &str) -> f64 {
        get_metrics().writes.with_label_values(&[entity]).get()
    }

    /// Current error count for an entity label and error type
    pub fn errors(&self, entity: &str, error_type: &str) -> f64 {
        get_metrics()
            .errors
            .with_label_values(&[entity, error_type])
            .get()
    }
}
