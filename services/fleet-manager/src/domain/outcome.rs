//! Outcome of a sub-step whose failure must never abort the workflow.
//!
//! Fatal sub-steps return `anyhow::Result` and propagate with `?`.
//! Best-effort sub-steps return [`BestEffort`], which has no `?` support: the
//! only way to get the value out is to acknowledge the failure.

/// Result of a best-effort sub-step.
#[must_use = "best-effort failures must be logged via `or_log`"]
#[derive(Debug)]
pub enum BestEffort<T> {
    Done(T),
    Failed(anyhow::Error),
}

impl<T> BestEffort<T> {
    pub fn from_result(result: anyhow::Result<T>) -> Self {
        match result {
            Ok(v) => BestEffort::Done(v),
            Err(e) => BestEffort::Failed(e),
        }
    }

    /// Hand the failure (if any) to `log` and keep going.
    pub fn or_log(self, log: impl FnOnce(&anyhow::Error)) -> Option<T> {
        match self {
            BestEffort::Done(v) => Some(v),
            BestEffort::Failed(e) => {
                log(&e);
                None
            }
        }
    }
}
