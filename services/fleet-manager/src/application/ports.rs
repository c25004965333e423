//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! All ports are object-safe and `Send + Sync` so a single set of
//! collaborators can be shared across concurrent destroy requests.

use anyhow::Result;
use async_trait::async_trait;
use fleet_common::{GuestDestroyRequest, GuestDestroyResponse, Instance, StageOwner};

// ── Stage Ownership Port ──────────────────────────────────────────────────────

/// Persistent stage → pool ownership records.
#[async_trait]
pub trait StageOwnerStore: Send + Sync {
    /// Look up the ownership record for a stage, `None` if absent.
    async fn find(&self, stage_runtime_id: &str) -> Result<Option<StageOwner>>;
    /// Remove the ownership record. Deleting a missing record succeeds.
    async fn delete(&self, stage_runtime_id: &str) -> Result<()>;
}

// ── Pool Manager Port ─────────────────────────────────────────────────────────

/// Instance registry and cloud driver front-end.
#[async_trait]
pub trait PoolManager: Send + Sync {
    /// Find the live instance bound to a stage, `None` if there is none.
    async fn instance_by_stage_id(
        &self,
        pool: &str,
        stage_runtime_id: &str,
    ) -> Result<Option<Instance>>;
    /// Terminate an instance. Irreversible.
    ///
    /// # Errors
    ///
    /// Repeat calls after a successful destroy may fail with "not found".
    async fn destroy(&self, pool: &str, instance_id: &str) -> Result<()>;
}

// ── In-Guest Agent Ports ──────────────────────────────────────────────────────

/// Client for the agent process running inside an instance.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Ask the agent to clean up and report execution statistics.
    async fn destroy(&self, req: GuestDestroyRequest) -> Result<GuestDestroyResponse>;
}

/// Builds [`AgentClient`]s for instances.
pub trait AgentClientFactory: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the client cannot be configured (bad address,
    /// missing certificates).
    fn client(
        &self,
        instance: &Instance,
        runner_name: &str,
        port: u16,
        mock: bool,
        mock_timeout_secs: u64,
    ) -> Result<Box<dyn AgentClient>>;
}

// ── Metrics Port ──────────────────────────────────────────────────────────────

/// Label set shared by the usage distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageLabels<'a> {
    pub pool_id: &'a str,
    pub os: &'a str,
    pub arch: &'a str,
    pub provider: &'a str,
}

impl UsageLabels<'_> {
    #[must_use]
    pub fn values(&self) -> [&str; 4] {
        [self.pool_id, self.os, self.arch, self.provider]
    }
}

/// Observation channels for per-stage resource usage. Sync trait, no async
/// needed.
pub trait MetricsSink: Send + Sync {
    /// Record the peak CPU usage percentage of one stage.
    fn observe_cpu_percentile(&self, labels: UsageLabels<'_>, pct: f64);
    /// Record the peak memory usage percentage of one stage.
    fn observe_memory_percentile(&self, labels: UsageLabels<'_>, pct: f64);
}
