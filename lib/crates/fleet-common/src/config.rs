use serde::Deserialize;

/// Control-plane configuration.
///
/// Every field has a default so an empty environment yields a usable config.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvConfig {
    /// Runner name reported to the in-guest agent.
    #[serde(default = "default_runner_name")]
    pub runner_name: String,

    /// Talk to a mocked in-guest agent instead of a real one.
    #[serde(default)]
    pub lite_engine_enable_mock: bool,

    /// Step timeout used by the mocked in-guest agent.
    #[serde(default = "default_mock_step_timeout_secs")]
    pub lite_engine_mock_step_timeout_secs: u64,

    /// Upper bound on the time spent retrying a destroy request.
    #[serde(default = "default_destroy_max_elapsed_secs")]
    pub destroy_max_elapsed_secs: u64,

    /// Upper bound on a single in-guest cleanup call.
    #[serde(default = "default_guest_cleanup_timeout_secs")]
    pub guest_cleanup_timeout_secs: u64,

    /// Valkey (Redis-compatible) connection URL for stage ownership records.
    #[serde(default = "default_valkey_url")]
    pub valkey_url: String,
}

fn default_runner_name() -> String {
    "fleet-runner".to_string()
}

fn default_mock_step_timeout_secs() -> u64 {
    120
}

fn default_destroy_max_elapsed_secs() -> u64 {
    600
}

fn default_guest_cleanup_timeout_secs() -> u64 {
    300
}

fn default_valkey_url() -> String {
    "redis://valkey:6379".to_string()
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            runner_name: default_runner_name(),
            lite_engine_enable_mock: false,
            lite_engine_mock_step_timeout_secs: default_mock_step_timeout_secs(),
            destroy_max_elapsed_secs: default_destroy_max_elapsed_secs(),
            guest_cleanup_timeout_secs: default_guest_cleanup_timeout_secs(),
            valkey_url: default_valkey_url(),
        }
    }
}
