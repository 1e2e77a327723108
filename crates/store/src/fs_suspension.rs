// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem-backed `dflow_runtime::SuspensionStore`: one JSON file per
//! suspended execution under `<base>/<execution_id>.json`, written
//! atomically via the same `.tmp`-then-rename discipline as
//! `crate::fs_store`. `mark_resuming` is a sibling `.resuming` marker
//! file created with `create_new` so two concurrent resume attempts race
//! on the filesystem itself rather than on an in-process lock — the
//! loser gets `AlreadyExists` and reports `ResumeInProgress`.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dflow_core::ExecutionId;
use dflow_runtime::{SuspendedExecution, SuspensionError, SuspensionStore};

pub struct FsSuspensionStore {
    base_dir: PathBuf,
}

fn state_path(base_dir: &Path, id: &ExecutionId) -> PathBuf {
    base_dir.join(format!("{}.json", id.as_str()))
}

fn resuming_path(base_dir: &Path, id: &ExecutionId) -> PathBuf {
    base_dir.join(format!("{}.resuming", id.as_str()))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SuspensionError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SuspensionError::Backend(e.to_string()))?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, bytes).map_err(|e| SuspensionError::Backend(e.to_string()))?;
    fs::rename(&tmp_path, path).map_err(|e| SuspensionError::Backend(e.to_string()))?;
    Ok(())
}

impl FsSuspensionStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }
}

#[async_trait]
impl SuspensionStore for FsSuspensionStore {
    async fn save(&self, state: SuspendedExecution) -> Result<(), SuspensionError> {
        let path = state_path(&self.base_dir, &state.execution_id);
        let bytes = serde_json::to_vec_pretty(&state).map_err(|e| SuspensionError::Backend(e.to_string()))?;
        write_atomic(&path, &bytes)
    }

    async fn load(&self, id: &ExecutionId) -> Result<Option<SuspendedExecution>, SuspensionError> {
        let path = state_path(&self.base_dir, id);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|e| SuspensionError::Backend(e.to_string()))?;
        let state = serde_json::from_slice(&bytes).map_err(|e| SuspensionError::Backend(e.to_string()))?;
        Ok(Some(state))
    }

    async fn delete(&self, id: &ExecutionId) -> Result<(), SuspensionError> {
        let path = state_path(&self.base_dir, id);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| SuspensionError::Backend(e.to_string()))?;
        }
        let marker = resuming_path(&self.base_dir, id);
        if marker.exists() {
            fs::remove_file(&marker).map_err(|e| SuspensionError::Backend(e.to_string()))?;
        }
        Ok(())
    }

    async fn mark_resuming(&self, id: &ExecutionId) -> Result<(), SuspensionError> {
        let path = state_path(&self.base_dir, id);
        if !path.exists() {
            return Err(SuspensionError::NotFound(id.to_string()));
        }
        let marker = resuming_path(&self.base_dir, id);
        if let Some(parent) = marker.parent() {
            fs::create_dir_all(parent).map_err(|e| SuspensionError::Backend(e.to_string()))?;
        }
        match fs::OpenOptions::new().write(true).create_new(true).open(&marker) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(SuspensionError::ResumeInProgress(id.to_string()))
            }
            Err(e) => Err(SuspensionError::Backend(e.to_string())),
        }
    }

    async fn clear_resuming(&self, id: &ExecutionId) -> Result<(), SuspensionError> {
        let marker = resuming_path(&self.base_dir, id);
        if marker.exists() {
            fs::remove_file(&marker).map_err(|e| SuspensionError::Backend(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fs_suspension_tests.rs"]
mod tests;
