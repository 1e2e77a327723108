// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Pipeline store: a content-addressed catalog of compiled
//! `dflow_compile::PipelineImage`s keyed by structural hash, with a
//! mutable alias table (atomic repointing, version history, rollback)
//! layered on top. Also hosts the filesystem-backed
//! `dflow_runtime::SuspensionStore` implementation, since both backends
//! share the same atomic-rename-on-write discipline.
//!
//! Two backends per store: an in-memory default (`memory_store`,
//! `fs_suspension`'s in-process counterpart already lives in
//! `dflow-runtime`) and a filesystem backend (`fs_store`,
//! `fs_suspension`) that persists one file per entry plus an
//! atomically-written alias/index file.

mod backend;
mod error;
mod fs_store;
mod fs_suspension;
mod image;
mod memory_store;
mod pipeline_store;
#[cfg(test)]
mod test_support;

pub use backend::BackendRegistry;
pub use error::StoreError;
pub use fs_store::FsPipelineStore;
pub use fs_suspension::FsSuspensionStore;
pub use image::StoredImage;
pub use memory_store::InMemoryPipelineStore;
pub use pipeline_store::{is_hash_reference, strip_hash_prefix, PipelineStore, VersionEntry};

use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) fn now_millis() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}
