// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process default `PipelineStore` backend: two `HashMap`s behind one
//! `Mutex`, mirroring the in-memory cache's single-lock-per-instance
//! design (`dflow_runtime::cache::MemoryCache`) since the pipeline store
//! has no per-key hot path to shard.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::StoreError;
use crate::image::StoredImage;
use crate::now_millis;
use crate::pipeline_store::{is_hash_reference, strip_hash_prefix, PipelineStore, VersionEntry};

#[derive(Default)]
struct Inner {
    images: HashMap<String, StoredImage>,
    aliases: HashMap<String, Vec<VersionEntry>>,
}

/// Default in-process backend, `put`/`get`/`list`/`delete` plus an
/// alias table held under one lock.
#[derive(Default)]
pub struct InMemoryPipelineStore {
    inner: Mutex<Inner>,
}

impl InMemoryPipelineStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn current_hash(history: &[VersionEntry]) -> Option<&str> {
    history.iter().rev().find(|e| e.active).map(|e| e.structural_hash.as_str())
}

#[async_trait]
impl PipelineStore for InMemoryPipelineStore {
    async fn put(&self, image: StoredImage) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.images.entry(image.structural_hash().to_string()).or_insert(image);
        Ok(())
    }

    async fn get(&self, reference: &str) -> Result<Option<StoredImage>, StoreError> {
        let inner = self.inner.lock();
        let hash = if is_hash_reference(reference) {
            strip_hash_prefix(reference).to_string()
        } else {
            match inner.aliases.get(reference).and_then(|h| current_hash(h)) {
                Some(hash) => hash.to_string(),
                None => return Ok(None),
            }
        };
        Ok(inner.images.get(&hash).cloned())
    }

    async fn list(&self) -> Result<Vec<StoredImage>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner.images.values().cloned().collect())
    }

    async fn delete(&self, reference: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let hash = if is_hash_reference(reference) {
            strip_hash_prefix(reference).to_string()
        } else {
            match inner.aliases.get(reference).and_then(|h| current_hash(h)) {
                Some(hash) => hash.to_string(),
                None => return Err(StoreError::AliasNotFound(reference.to_string())),
            }
        };
        let referencing: Vec<String> = inner
        .aliases
        .iter()
        .filter(|(_, history)| current_hash(history) == Some(hash.as_str()))
        .map(|(name, _)| name.clone())
        .collect();
        if !referencing.is_empty() {
            return Err(StoreError::AliasInUse { hash, aliases: referencing });
        }
        if inner.images.remove(&hash).is_none() {
            return Err(StoreError::NotFound(hash));
        }
        Ok(())
    }

    async fn alias_put(&self, name: &str, structural_hash: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if !inner.images.contains_key(structural_hash) {
            return Err(StoreError::NotFound(structural_hash.to_string()));
        }
        let history = inner.aliases.entry(name.to_string()).or_default();
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
        Ok(())
    }

    async fn versions(&self, name: &str) -> Result<Vec<VersionEntry>, StoreError> {
        let inner = self.inner.lock();
        inner.aliases.get(name).cloned().ok_or_else(|| StoreError::AliasNotFound(name.to_string()))
    }

    async fn rollback(&self, name: &str, version: Option<u32>) -> Result<(), StoreError> {
        let target_hash = {
            let inner = self.inner.lock();
            let history = inner.aliases.get(name).ok_or_else(|| StoreError::AliasNotFound(name.to_string()))?;
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
#[path = "memory_store_tests.rs"]
mod tests;
