// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem-backed `PipelineStore`: one JSON file per image under
//! `<base>/images/<hash>.json`, plus a single `<base>/aliases.json`
//! table. Both are written to a `.tmp` sibling and then renamed into
//! place — a crash mid-write leaves the previous file intact rather
//! than a half-written one.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::warn;

use crate::error::StoreError;
use crate::image::StoredImage;
use crate::now_millis;
use crate::pipeline_store::{is_hash_reference, strip_hash_prefix, PipelineStore, VersionEntry};

type AliasTable = HashMap<String, Vec<VersionEntry>>;

/// Persists images and the alias table under `base_dir`. A single mutex
/// serializes alias-table read-modify-write cycles (images are
/// content-addressed and therefore never mutated in place, so they need
/// no lock beyond the filesystem's own atomic rename).
pub struct FsPipelineStore {
    base_dir: PathBuf,
    alias_lock: Mutex<()>,
}

fn images_dir(base_dir: &Path) -> PathBuf {
    base_dir.join("images")
}

fn image_path(base_dir: &Path, hash: &str) -> PathBuf {
    images_dir(base_dir).join(format!("{hash}.json"))
}

fn alias_path(base_dir: &Path) -> PathBuf {
    base_dir.join("aliases.json")
}

/// Write `bytes` to `path` via a `.tmp` sibling then an atomic rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, bytes)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

impl FsPipelineStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into(), alias_lock: Mutex::new(()) }
    }

    fn read_aliases(&self) -> Result<AliasTable, StoreError> {
        let path = alias_path(&self.base_dir);
        if !path.exists() {
            return Ok(AliasTable::new());
        }
        let bytes = fs::read(&path)?;
        match serde_json::from_slice(&bytes) {
            Ok(table) => Ok(table),
            Err(err) => {
                warn!(error = %err, path = %path.display(), "corrupt alias table, starting fresh");
                Ok(AliasTable::new())
            }
        }
    }

    fn write_aliases(&self, table: &AliasTable) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(table)?;
        write_atomic(&alias_path(&self.base_dir), &bytes)
    }
}

fn current_hash(history: &[VersionEntry]) -> Option<&str> {
    history.iter().rev().find(|e| e.active).map(|e| e.structural_hash.as_str())
}

#[async_trait]
impl PipelineStore for FsPipelineStore {
    async fn put(&self, image: StoredImage) -> Result<(), StoreError> {
        let path = image_path(&self.base_dir, image.structural_hash());
        if path.exists() {
            return Ok(());
        }
        let bytes = serde_json::to_vec_pretty(&image)?;
        write_atomic(&path, &bytes)
    }

    async fn get(&self, reference: &str) -> Result<Option<StoredImage>, StoreError> {
        let hash = if is_hash_reference(reference) {
            strip_hash_prefix(reference).to_string()
        } else {
            let _guard = self.alias_lock.lock();
            match self.read_aliases()?.get(reference).and_then(|h| current_hash(h).map(str::to_string)) {
                Some(hash) => hash,
                None => return Ok(None),
            }
        };
        let path = image_path(&self.base_dir, &hash);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn list(&self) -> Result<Vec<StoredImage>, StoreError> {
        let dir = images_dir(&self.base_dir);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.path().extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = fs::read(entry.path())?;
            out.push(serde_json::from_slice(&bytes)?);
        }
        Ok(out)
    }

    async fn delete(&self, reference: &str) -> Result<(), StoreError> {
        let _guard = self.alias_lock.lock();
        let hash = if is_hash_reference(reference) {
            strip_hash_prefix(reference).to_string()
        } else {
            let aliases = self.read_aliases()?;
            match aliases.get(reference).and_then(|h| current_hash(h).map(str::to_string)) {
                Some(hash) => hash,
                None => return Err(StoreError::AliasNotFound(reference.to_string())),
            }
        };
        let aliases = self.read_aliases()?;
        let referencing: Vec<String> = aliases
        .iter()
        .filter(|(_, history)| current_hash(history) == Some(hash.as_str()))
        .map(|(name, _)| name.clone())
        .collect();
        if !referencing.is_empty() {
            return Err(StoreError::AliasInUse { hash, aliases: referencing });
        }
        let path = image_path(&self.base_dir, &hash);
        if !path.exists() {
            return Err(StoreError::NotFound(hash));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    async fn alias_put(&self, name: &str, structural_hash: &str) -> Result<(), StoreError> {
        let _guard = self.alias_lock.lock();
        if !image_path(&self.base_dir, structural_hash).exists() {
            return Err(StoreError::NotFound(structural_hash.to_string()));
        }
        let mut aliases = self.read_aliases()?;
        let history = aliases.entry(name.to_string()).or_default();
        for entry in history.iter_mut() {
            entry.active = false;
        }
        let version = history.len() as u32 + 1;
        history.push(VersionEntry {
                version,
                structural_hash: structural_hash.to_string(),
                created_at_millis: now_millis(),
                active: true,
        });
        self.write_aliases(&aliases)
    }

    async fn versions(&self, name: &str) -> Result<Vec<VersionEntry>, StoreError> {
        let _guard = self.alias_lock.lock();
        self.read_aliases()?.get(name).cloned().ok_or_else(|| StoreError::AliasNotFound(name.to_string()))
    }

    async fn rollback(&self, name: &str, version: Option<u32>) -> Result<(), StoreError> {
        let target_hash = {
            let _guard = self.alias_lock.lock();
            let aliases = self.read_aliases()?;
            let history = aliases.get(name).ok_or_else(|| StoreError::AliasNotFound(name.to_string()))?;
            let target = match version {
                Some(v) => history
                .iter()
                .find(|e| e.version == v)
                .ok_or_else(|| StoreError::VersionNotFound { name: name.to_string(), version: v })?,
                None => {
                    let active_idx = history
                    .iter()
                    .position(|e| e.active)
                    .ok_or_else(|| StoreError::AliasNotFound(name.to_string()))?;
                    if active_idx == 0 {
                        return Err(StoreError::VersionNotFound { name: name.to_string(), version: 0 });
                    }
                    &history[active_idx - 1]
                }
            };
            target.structural_hash.clone()
        };
        self.alias_put(name, &target_hash).await
    }
}

#[cfg(test)]
#[path = "fs_store_tests.rs"]
mod tests;
