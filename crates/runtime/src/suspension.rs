// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! suspension & resumption. `SuspensionStore` is the persistence seam
//! `dflow_runtime::engine` writes through; `InMemorySuspensionStore` is the
//! default backend, and `dflow-store` adds a filesystem-backed one
//! (atomic-rename checkpoint writes, the same discipline as a snapshot
//! writer) without this crate depending on it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use dflow_core::{decode_value, encode_value, CoreError, ExecutionId, NodeId, Type, Value};
use indexmap::IndexMap;
use parking_lot::Mutex;
use thiserror::Error;

/// One node's status, mirroring `statuses` map. `Missing` is not
/// part of the declared set — an unresolved `Input` node simply stays
/// `Pending` forever until the missing value arrives, which is how
/// `dflow_runtime::engine` distinguishes "blocked" from "failed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum NodeStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
    Suspended,
}

/// A `Value` paired with the `Type` needed to decode it back out of the
/// boundary JSON model — `Value` itself carries no `serde` impl (its
/// structural-equality semantics would be awkward to round-trip directly),
/// so persistence always goes through this pair.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StoredValue {
    pub ty: Type,
    pub json: serde_json::Value,
}

impl StoredValue {
    pub fn encode(value: &Value) -> Self {
        Self { ty: value.type_of(), json: encode_value(value) }
    }

    pub fn decode(&self) -> Result<Value, CoreError> {
        decode_value(&self.json, &self.ty)
    }
}

/// The full serializable snapshot of a paused execution.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SuspendedExecution {
    pub execution_id: ExecutionId,
    /// The compiled DAG's structural hash, so a resume can be matched back
    /// against the same pipeline image.
    pub dag_structural_hash: String,
    pub values: HashMap<NodeId, StoredValue>,
    pub statuses: HashMap<NodeId, NodeStatus>,
    pub resumption_count: u32,
    pub missing_inputs: IndexMap<String, Type>,
    pub pending_outputs: Vec<String>,
    pub created_at_millis: u64,
}

impl SuspendedExecution {
    pub fn now_millis() -> u64 {
        SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
    }
}

#[derive(Debug, Error)]
pub enum SuspensionError {
    #[error("execution `{0}` not found")]
    NotFound(String),
    #[error("execution `{0}` is already being resumed")]
    ResumeInProgress(String),
    #[error("storage error: {0}")]
    Backend(String),
}

/// persistence seam. `save`/`load`/`delete` plus the
/// `mark_resuming`/`clear_resuming` pair implementing "atomically mark the
/// store entry `Resuming`; reject concurrent resumes".
#[async_trait]
pub trait SuspensionStore: Send + Sync {
    async fn save(&self, state: SuspendedExecution) -> Result<(), SuspensionError>;
    async fn load(&self, id: &ExecutionId) -> Result<Option<SuspendedExecution>, SuspensionError>;
    async fn delete(&self, id: &ExecutionId) -> Result<(), SuspensionError>;
    /// Claims `id` for resumption, failing if another resume is already in
    /// flight. The caller must eventually call `clear_resuming` (success or
    /// failure) so a later resume attempt is not permanently locked out.
    async fn mark_resuming(&self, id: &ExecutionId) -> Result<(), SuspensionError>;
    async fn clear_resuming(&self, id: &ExecutionId) -> Result<(), SuspensionError>;
}

struct Entry {
    state: SuspendedExecution,
    resuming: bool,
}

/// Default in-process backend: a `Mutex`-guarded map. Sufficient for a
/// single runtime instance; `dflow-store`'s filesystem backend is for
/// surviving process restarts.
#[derive(Default)]
pub struct InMemorySuspensionStore {
    entries: Mutex<HashMap<ExecutionId, Entry>>,
}

impl InMemorySuspensionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl SuspensionStore for InMemorySuspensionStore {
    async fn save(&self, state: SuspendedExecution) -> Result<(), SuspensionError> {
        let mut entries = self.entries.lock();
        let resuming = entries.get(&state.execution_id).map(|e| e.resuming).unwrap_or(false);
        entries.insert(state.execution_id.clone(), Entry { state, resuming });
        Ok(())
    }

    async fn load(&self, id: &ExecutionId) -> Result<Option<SuspendedExecution>, SuspensionError> {
        Ok(self.entries.lock().get(id).map(|e| e.state.clone()))
    }

    async fn delete(&self, id: &ExecutionId) -> Result<(), SuspensionError> {
        self.entries.lock().remove(id);
        Ok(())
    }

    async fn mark_resuming(&self, id: &ExecutionId) -> Result<(), SuspensionError> {
        let mut entries = self.entries.lock();
        let entry = entries.get_mut(id).ok_or_else(|| SuspensionError::NotFound(id.to_string()))?;
        if entry.resuming {
            return Err(SuspensionError::ResumeInProgress(id.to_string()));
        }
        entry.resuming = true;
        Ok(())
    }

    async fn clear_resuming(&self, id: &ExecutionId) -> Result<(), SuspensionError> {
        if let Some(entry) = self.entries.lock().get_mut(id) {
            entry.resuming = false;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "suspension_tests.rs"]
mod tests;
