// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generic name -> implementation registry, the same
//! register/resolve-with-fallback-and-warning shape as
//! `dflow_runtime::cache::CacheRegistry`, reused here for both the
//! pipeline store and the suspension store so neither backend selection
//! mechanism drifts from the other.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

/// Maps backend names to implementations of trait object `T`, always
/// falling back to a designated default (named `"memory"` by every
/// caller in this crate) with a logged warning when the requested name
/// is not registered.
pub struct BackendRegistry<T: ?Sized> {
    backends: HashMap<String, Arc<T>>,
    default_name: String,
}

impl<T: ?Sized> BackendRegistry<T> {
    pub fn new(default_name: impl Into<String>, default: Arc<T>) -> Self {
        let default_name = default_name.into();
        let mut backends = HashMap::new();
        backends.insert(default_name.clone(), default);
        Self { backends, default_name }
    }

    pub fn register(&mut self, name: impl Into<String>, backend: Arc<T>) {
        self.backends.insert(name.into(), backend);
    }

    /// Resolves `name`, falling back to the default backend (with a
    /// `warn!`) when `name` is not registered.
    #[allow(clippy::expect_used)]
    pub fn resolve(&self, name: &str) -> Arc<T> {
        match self.backends.get(name) {
            Some(backend) => backend.clone(),
            None => {
                warn!(backend = name, default = %self.default_name, "unknown backend, falling back to default");
                self.backends
                .get(&self.default_name)
                .expect("default backend is always registered")
                .clone()
            }
        }
    }
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
