//! Process-wide per-stage session state.
//!
//! The provisioning path stores a [`StageSession`] when a stage's instance is
//! set up; the destroy path retires it once the instance is terminated. The
//! registry is an owned value shared by `Arc`, not a global, so every test can
//! use its own.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};

/// Ephemeral data kept for a stage between provisioning and destroy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSession {
    pub pool_id: String,
    pub instance_id: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub variables: BTreeMap<String, String>,
}

impl StageSession {
    #[must_use]
    pub fn new(pool_id: impl Into<String>) -> Self {
        Self {
            pool_id: pool_id.into(),
            instance_id: None,
            registered_at: Utc::now(),
            variables: BTreeMap::new(),
        }
    }
}

/// Concurrency-safe map from stage runtime id to [`StageSession`].
#[derive(Debug, Default)]
pub struct StageStateRegistry {
    inner: RwLock<HashMap<String, Arc<StageSession>>>,
}

impl StageStateRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) the session for a stage.
    pub fn set(&self, stage_runtime_id: impl Into<String>, session: StageSession) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(stage_runtime_id.into(), Arc::new(session));
    }

    #[must_use]
    pub fn get(&self, stage_runtime_id: &str) -> Option<Arc<StageSession>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(stage_runtime_id)
            .cloned()
    }

    /// Remove a stage's session. Missing keys are a no-op.
    pub fn delete(&self, stage_runtime_id: &str) -> Option<Arc<StageSession>> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(stage_runtime_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
