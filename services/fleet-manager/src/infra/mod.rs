//! Infrastructure layer: concrete implementations of application ports.

pub mod config;
pub mod metrics;
pub mod valkey_store;

pub use metrics::{MetricsError, MetricsRegistry, PrometheusMetrics};
pub use valkey_store::ValkeyStageOwnerStore;
