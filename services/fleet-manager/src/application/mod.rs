//! Application layer: port trait definitions and use-case orchestration.
//!
//! This module depends only on `crate::domain`, never on `crate::infra`
//! or `crate::api`.

pub mod backoff;
pub mod ports;
pub mod services;
pub mod stage_state;

pub use backoff::ExponentialBackoff;
pub use ports::{
    AgentClient, AgentClientFactory, MetricsSink, PoolManager, StageOwnerStore, UsageLabels,
};
pub use stage_state::{StageSession, StageStateRegistry};
