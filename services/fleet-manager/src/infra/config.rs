//! Environment-backed configuration loading.

use anyhow::{Context, Result};
use fleet_common::EnvConfig;

/// Prefix of every configuration variable, e.g. `FLEET_RUNNER_NAME`.
pub const ENV_PREFIX: &str = "FLEET_";

/// Load [`EnvConfig`] from `FLEET_*` environment variables.
///
/// # Errors
///
/// Returns an error if a variable is present but cannot be parsed.
pub fn load_env_config() -> Result<EnvConfig> {
    envy::prefixed(ENV_PREFIX)
        .from_env()
        .context("failed to load config from FLEET_* env vars")
}

/// Load [`EnvConfig`] from explicit `(name, value)` pairs.
///
/// # Errors
///
/// Returns an error if a value cannot be parsed.
pub fn env_config_from_vars<I>(vars: I) -> Result<EnvConfig>
where
    I: IntoIterator<Item = (String, String)>,
{
    envy::prefixed(ENV_PREFIX)
        .from_iter(vars)
        .context("failed to parse FLEET_* config")
}
