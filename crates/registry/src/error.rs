// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors raised by registration and lookup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("module not found: {0}")]
    ModuleNotFound(String),
    #[error("ambiguous reference `{name}`: candidates {candidates:?}")]
    AmbiguousReference { name: String, candidates: Vec<String> },
    #[error("module `{0}` is already registered; signatures never change after registration")]
    AlreadyRegistered(String),
    #[error("cannot unregister `{name}`: {in_flight} execution(s) still reference it")]
    InFlight { name: String, in_flight: usize },
}
