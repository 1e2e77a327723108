// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors raised by the pipeline store and its filesystem-backed
/// suspension store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no image found for `{0}`")]
    NotFound(String),

    #[error("no alias named `{0}`")]
    AliasNotFound(String),

    #[error("cannot delete `{hash}`: alias(es) {aliases:?} still reference it")]
    AliasInUse { hash: String, aliases: Vec<String> },

    #[error("version {version} not found in history of alias `{name}`")]
    VersionNotFound { name: String, version: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
