// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline store contract: content-addressed `put`/`get`/`list`/
//! `delete` plus a mutable alias table with atomic repointing, version
//! history, and rollback. `get`'s `reference` accepts a bare 64-hex-char
//! structural hash, a `sha256:<hash>`-prefixed hash, or an alias name —
//! `normalize_reference` is the one place that ambiguity is resolved.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::image::StoredImage;

/// One entry in an alias's append-only history. `alias_put`/`rollback`
/// both append rather than mutate in place — the previous target is
/// always retained for rollback — so `version` is simply the entry's
/// position.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VersionEntry {
    pub version: u32,
    pub structural_hash: String,
    pub created_at_millis: u64,
    /// Whether this entry is the alias's current target.
    pub active: bool,
}

/// A 64-char hex digest, optionally `sha256:`-prefixed, is a direct hash
/// reference; anything else is looked up as an alias name.
pub fn is_hash_reference(reference: &str) -> bool {
    let hex = reference.strip_prefix("sha256:").unwrap_or(reference);
    hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// Strips an optional `sha256:` prefix so callers always key their
/// image table by the bare hex digest.
pub fn strip_hash_prefix(reference: &str) -> &str {
    reference.strip_prefix("sha256:").unwrap_or(reference)
}

/// `put`/`get`/`list`/`delete` operate on content-addressed images;
/// `alias_put`/`versions`/`rollback` operate on the mutable name -> hash
/// pointer table layered on top.
#[async_trait]
pub trait PipelineStore: Send + Sync {
    /// Idempotent: an existing entry at the same structural hash wins,
    /// so the new image is simply discarded, not merged.
    async fn put(&self, image: StoredImage) -> Result<(), StoreError>;

    /// `reference` is a bare hash, a `sha256:`-prefixed hash, or an alias
    /// name resolved through the alias table.
    async fn get(&self, reference: &str) -> Result<Option<StoredImage>, StoreError>;

    async fn list(&self) -> Result<Vec<StoredImage>, StoreError>;

    /// Refuses with `AliasInUse` if any alias still actively targets
    /// `reference`'s resolved hash.
    async fn delete(&self, reference: &str) -> Result<(), StoreError>;

    /// Atomically repoints `name` at `structural_hash`, appending a new
    /// `VersionEntry` to its history. The image itself must already be
    /// `put` — `alias_put` does not implicitly store it.
    async fn alias_put(&self, name: &str, structural_hash: &str) -> Result<(), StoreError>;

    async fn versions(&self, name: &str) -> Result<Vec<VersionEntry>, StoreError>;

    /// Repoints `name` at a prior version's hash: the given `version`, or
    /// (when `None`) the entry immediately before the current one.
    /// Implemented as a new `alias_put` onto the old hash, so the
    /// rollback itself becomes the newest history entry rather than
    /// truncating anything.
    async fn rollback(&self, name: &str, version: Option<u32>) -> Result<(), StoreError>;
}

#[cfg(test)]
#[path = "pipeline_store_tests.rs"]
mod tests;
