//! Prometheus metrics for stage resource usage.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `fleet_cpu_usage_percentile` | Histogram | `pool_id`, `os`, `arch`, `provider` |
//! | `fleet_memory_usage_percentile` | Histogram | `pool_id`, `os`, `arch`, `provider` |

use std::sync::Arc;

use prometheus::{Encoder, HistogramOpts, HistogramVec, Registry, TextEncoder};
use thiserror::Error;

use crate::application::ports::{MetricsSink, UsageLabels};

const USAGE_LABELS: &[&str] = &["pool_id", "os", "arch", "provider"];

/// Ten-percent buckets over the 0–100 usage range.
pub const USAGE_BUCKETS: &[f64] = &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0];

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to register metric: {0}")]
    RegistrationFailed(#[from] prometheus::Error),

    #[error("failed to encode metrics: {0}")]
    EncodingFailed(String),
}

pub type MetricsResult<T> = Result<T, MetricsError>;

/// Peak CPU and memory usage distributions, one observation per destroyed
/// stage. `Clone`, `Send` and `Sync`.
#[derive(Clone)]
pub struct PrometheusMetrics {
    cpu_percentile: HistogramVec,
    memory_percentile: HistogramVec,
}

impl PrometheusMetrics {
    /// # Errors
    ///
    /// Returns an error if a metric with the same name is already registered.
    pub fn new(registry: &Registry) -> MetricsResult<Self> {
        let cpu_percentile = HistogramVec::new(
            HistogramOpts::new(
                "fleet_cpu_usage_percentile",
                "Peak CPU usage percentage of a stage's instance",
            )
            .buckets(USAGE_BUCKETS.to_vec()),
            USAGE_LABELS,
        )?;
        registry.register(Box::new(cpu_percentile.clone()))?;

        let memory_percentile = HistogramVec::new(
            HistogramOpts::new(
                "fleet_memory_usage_percentile",
                "Peak memory usage percentage of a stage's instance",
            )
            .buckets(USAGE_BUCKETS.to_vec()),
            USAGE_LABELS,
        )?;
        registry.register(Box::new(memory_percentile.clone()))?;

        Ok(Self {
            cpu_percentile,
            memory_percentile,
        })
    }

    #[must_use]
    pub fn cpu_sample_count(&self, labels: UsageLabels<'_>) -> u64 {
        self.cpu_percentile
            .with_label_values(&labels.values())
            .get_sample_count()
    }

    #[must_use]
    pub fn memory_sample_count(&self, labels: UsageLabels<'_>) -> u64 {
        self.memory_percentile
            .with_label_values(&labels.values())
            .get_sample_count()
    }
}

impl MetricsSink for PrometheusMetrics {
    fn observe_cpu_percentile(&self, labels: UsageLabels<'_>, pct: f64) {
        self.cpu_percentile
            .with_label_values(&labels.values())
            .observe(pct);
    }

    fn observe_memory_percentile(&self, labels: UsageLabels<'_>, pct: f64) {
        self.memory_percentile
            .with_label_values(&labels.values())
            .observe(pct);
    }
}

/// Owns the Prometheus registry and the fleet metrics registered in it.
pub struct MetricsRegistry {
    registry: Registry,
    metrics: Arc<PrometheusMetrics>,
}

impl MetricsRegistry {
    /// # Errors
    ///
    /// Returns an error if metric registration fails.
    pub fn new() -> MetricsResult<Self> {
        let registry = Registry::new();
        let metrics = Arc::new(PrometheusMetrics::new(&registry)?);
        Ok(Self { registry, metrics })
    }

    #[must_use]
    pub fn sink(&self) -> Arc<PrometheusMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Render every registered metric in the Prometheus text format.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode_text(&self) -> MetricsResult<String> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(|e| MetricsError::EncodingFailed(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| MetricsError::EncodingFailed(e.to_string()))
    }
}
