/// Valkey key prefixes for fleet state
pub mod keys {
    /// Stage ownership records
    /// Format: fleet:stage_owner:{stage_runtime_id}
    /// Value: JSON-serialized StageOwner
    /// TTL: None (deleted when the stage's instance is destroyed)
    pub const STAGE_OWNER: &str = "fleet:stage_owner";
}

/// Build the Valkey key holding a stage's ownership record.
#[must_use]
pub fn stage_owner_key(stage_runtime_id: &str) -> String {
    format!("{}:{}", keys::STAGE_OWNER, stage_runtime_id)
}
