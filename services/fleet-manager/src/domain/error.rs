//! Typed domain error enums.
//!
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator. The HTTP surface recovers them with `downcast_ref`.

use fleet_common::VmCleanupRequest;
use thiserror::Error;

// ── Destroy errors ────────────────────────────────────────────────────────────

/// Errors raised by the stage VM destroy workflow.
#[derive(Debug, Error)]
pub enum DestroyError {
    /// Malformed request. Never retried.
    #[error("{0}")]
    BadRequest(String),

    #[error("failed to find stage owner entity for stage: {0}")]
    OwnerNotFound(String),

    #[error("instance with stage runtime ID {0} not found")]
    InstanceNotFound(String),

    #[error("destroy of stage {stage_runtime_id} cancelled after {retries} retries")]
    Cancelled {
        stage_runtime_id: String,
        retries: u32,
    },
}

impl DestroyError {
    /// Whether the error is the caller's fault rather than the system's.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, DestroyError::BadRequest(_))
    }
}

/// Reject requests that cannot identify a stage.
///
/// # Errors
///
/// Returns `DestroyError::BadRequest` when `stage_runtime_id` is empty.
pub fn validate_cleanup_request(req: &VmCleanupRequest) -> Result<(), DestroyError> {
    if req.stage_runtime_id.is_empty() {
        return Err(DestroyError::BadRequest(
            "mandatory field 'stage_runtime_id' in the request body is empty".to_string(),
        ));
    }
    Ok(())
}
