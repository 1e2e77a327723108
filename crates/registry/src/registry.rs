// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The registry itself: copy-on-write snapshot behind an `ArcSwap`, a
//! single-writer mutex serializing registrations, and per-module in-flight
//! counters so `unregister` can refuse while live executions still
//! reference a module.

use crate::error::RegistryError;
use crate::module::Module;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A `use` import: `use stdlib.math as math` or `use stdlib.math` (no
/// alias, namespace segment becomes the implicit prefix). Declaration
/// order matters for ambiguity resolution.
#[derive(Debug, Clone)]
pub struct NamespaceImport {
    pub namespace: String,
    pub alias: Option<String>,
}

impl NamespaceImport {
    /// The prefix an unqualified name is joined against for this import.
    pub fn prefix(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.namespace)
    }
}

/// RAII guard marking a module call in flight; dropping it releases the
/// reference so a concurrent `unregister` can proceed once all guards for
/// that module are gone.
pub struct CallGuard<'a> {
    registry: &'a ModuleRegistry,
    name: String,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.registry.release(&self.name);
    }
}

/// Read-mostly catalog of registered modules.
pub struct ModuleRegistry {
    modules: ArcSwap<HashMap<String, Arc<Module>>>,
    write_lock: Mutex<()>,
    in_flight: Mutex<HashMap<String, Arc<AtomicUsize>>>,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            modules: ArcSwap::from_pointee(HashMap::new()),
            write_lock: Mutex::new(()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a module. Registration is serialized through a single
    /// writer; readers never block (they see the snapshot in effect at
    /// the time of their `load`). Re-registering the same fully-qualified
    /// name is rejected: signatures never change after registration.
    pub fn register(&self, module: Module) -> Result<(), RegistryError> {
        let _guard = self.write_lock.lock();
        let current = self.modules.load();
        if current.contains_key(&module.qualified_name) {
            return Err(RegistryError::AlreadyRegistered(module.qualified_name));
        }
        let mut next = (**current).clone();
        next.insert(module.qualified_name.clone(), Arc::new(module));
        self.modules.store(Arc::new(next));
        Ok(())
    }

    /// Unregisters a module, rejected if any call guard for it is still
    /// held (an in-flight execution references it).
    pub fn unregister(&self, name: &str) -> Result<(), RegistryError> {
        let _guard = self.write_lock.lock();
        let in_flight = self
        .in_flight
        .lock()
        .get(name)
        .map(|c| c.load(Ordering::SeqCst))
        .unwrap_or(0);
        if in_flight > 0 {
            return Err(RegistryError::InFlight {
                    name: name.to_string(),
                    in_flight,
            });
        }
        let current = self.modules.load();
        if !current.contains_key(name) {
            return Err(RegistryError::ModuleNotFound(name.to_string()));
        }
        let mut next = (**current).clone();
        next.remove(name);
        self.modules.store(Arc::new(next));
        Ok(())
    }

    /// Looks up a module by its exact fully-qualified name.
    pub fn lookup_fqn(&self, name: &str) -> Result<Arc<Module>, RegistryError> {
        self.modules
        .load()
        .get(name)
        .cloned()
        .ok_or_else(|| RegistryError::ModuleNotFound(name.to_string()))
    }

    /// Resolves an unqualified (or partially-qualified) reference against
    /// the active namespace imports, in declaration order. A name already
    /// containing a `.` is tried first as a direct fully-qualified lookup.
    pub fn lookup(
        &self,
        name: &str,
        imports: &[NamespaceImport],
    ) -> Result<Arc<Module>, RegistryError> {
        if name.contains('.') {
            if let Ok(m) = self.lookup_fqn(name) {
                return Ok(m);
            }
        }
        let snapshot = self.modules.load();
        let mut candidates = Vec::new();
        for import in imports {
            let qualified = format!("{}.{}", import.namespace, name);
            if snapshot.contains_key(&qualified) {
                candidates.push(qualified);
            }
        }
        candidates.dedup();
        match candidates.len() {
            0 => Err(RegistryError::ModuleNotFound(name.to_string())),
            1 => Ok(snapshot[&candidates[0]].clone()),
            _ => Err(RegistryError::AmbiguousReference {
                    name: name.to_string(),
                    candidates,
            }),
        }
    }

    /// Marks one in-flight call against `name`; the returned guard
    /// releases it on drop.
    pub fn begin_call(&self, name: &str) -> CallGuard<'_> {
        let counter = self
        .in_flight
        .lock()
        .entry(name.to_string())
        .or_insert_with(|| Arc::new(AtomicUsize::new(0)))
        .clone();
        counter.fetch_add(1, Ordering::SeqCst);
        CallGuard {
            registry: self,
            name: name.to_string(),
        }
    }

    fn release(&self, name: &str) {
        if let Some(counter) = self.in_flight.lock().get(name) {
            counter.fetch_sub(1, Ordering::SeqCst);
        }
    }

    pub fn len(&self) -> usize {
        self.modules.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
