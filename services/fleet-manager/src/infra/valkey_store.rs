//! Valkey-backed stage ownership records.

use anyhow::{Context, Result};
use async_trait::async_trait;
use fred::prelude::*;
use fleet_common::{StageOwner, stage_owner_key};

use crate::application::ports::StageOwnerStore;

#[derive(Clone)]
pub struct ValkeyStageOwnerStore {
    client: Client,
}

impl ValkeyStageOwnerStore {
    /// Connect to Valkey and verify connectivity with a PING.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the server is unreachable.
    pub async fn connect(valkey_url: &str) -> Result<Self> {
        let config = Config::from_url(valkey_url).context("invalid Valkey URL")?;
        let client = Builder::from_config(config)
            .with_connection_config(|conn_config| {
                conn_config.connection_timeout = std::time::Duration::from_secs(5);
                conn_config.internal_command_timeout = std::time::Duration::from_secs(10);
            })
            .set_policy(ReconnectPolicy::new_exponential(0, 100, 5000, 5))
            .build()?;

        client.init().await.context("Valkey connection failed")?;
        client
            .ping::<String>(None)
            .await
            .context("Valkey startup PING failed")?;

        tracing::info!(url = %valkey_url, "stage owner store ready");
        Ok(Self { client })
    }

    /// Record which pool owns a stage's instance. Called by provisioning.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or written.
    pub async fn create(&self, owner: &StageOwner) -> Result<()> {
        let key = stage_owner_key(&owner.stage_runtime_id);
        self.client
            .set::<(), _, _>(&key, encode_owner(owner)?, None, None, false)
            .await
            .with_context(|| format!("failed to write {key}"))?;
        Ok(())
    }
}

#[async_trait]
impl StageOwnerStore for ValkeyStageOwnerStore {
    async fn find(&self, stage_runtime_id: &str) -> Result<Option<StageOwner>> {
        let key = stage_owner_key(stage_runtime_id);
        let raw: Option<String> = self
            .client
            .get(&key)
            .await
            .with_context(|| format!("failed to read {key}"))?;
        raw.as_deref().map(decode_owner).transpose()
    }

    async fn delete(&self, stage_runtime_id: &str) -> Result<()> {
        let key = stage_owner_key(stage_runtime_id);
        let removed: i64 = self
            .client
            .del(&key)
            .await
            .with_context(|| format!("failed to delete {key}"))?;
        if removed == 0 {
            tracing::debug!(key = %key, "stage owner already absent");
        }
        Ok(())
    }
}

fn encode_owner(owner: &StageOwner) -> Result<String> {
    serde_json::to_string(owner).context("failed to encode stage owner")
}

fn decode_owner(raw: &str) -> Result<StageOwner> {
    serde_json::from_str(raw).context("malformed stage owner record")
}
