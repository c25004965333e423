use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifiers of the pipeline execution that issued a request.
///
/// Every field is optional; populated fields are attached to log records.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_sequence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

/// Request to tear down the VM bound to a stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VmCleanupRequest {
    #[serde(default)]
    pub pool_id: String,
    #[serde(default)]
    pub stage_runtime_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_key: Option<String>,
    #[serde(default)]
    pub context: RequestContext,
}

/// Persistent mapping from a stage to the pool that owns its instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageOwner {
    pub stage_runtime_id: String,
    pub pool_name: String,
}

/// Cloud driver an instance was provisioned through.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Amazon,
    Google,
    Azure,
    #[serde(rename = "digitalocean")]
    DigitalOcean,
    Anka,
    Nomad,
    Noop,
}

impl Provider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Amazon => "amazon",
            Provider::Google => "google",
            Provider::Azure => "azure",
            Provider::DigitalOcean => "digitalocean",
            Provider::Anka => "anka",
            Provider::Nomad => "nomad",
            Provider::Noop => "noop",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provisioned VM as known to the pool manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Instance {
    pub id: String,
    pub name: String,
    /// Address the in-guest agent listens on.
    pub address: String,
    pub pool: String,
    /// Stage runtime id the instance is bound to, empty while idle in the pool.
    #[serde(default)]
    pub stage: String,
    pub os: String,
    pub arch: String,
    pub provider: Provider,
    pub port: u16,
    pub started_at: DateTime<Utc>,
}

/// Resource usage reported by the in-guest agent at teardown.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecutionStats {
    pub total_mem_mb: f64,
    pub cpu_cores: u32,
    pub avg_mem_usage_pct: f64,
    pub avg_cpu_usage_pct: f64,
    pub max_mem_usage_pct: f64,
    pub max_cpu_usage_pct: f64,
}

/// Body of the in-guest agent's destroy call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuestDestroyRequest {
    /// Stream the agent's own log to the build log.
    pub log_drone: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_key: Option<String>,
    /// Where the agent writes its log inside the guest.
    pub lite_engine_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GuestDestroyResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_stats: Option<ExecutionStats>,
}
