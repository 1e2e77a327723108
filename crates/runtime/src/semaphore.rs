// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! named semaphore: a FIFO permit pool per module name, capacity set
//! by the call site's `concurrency` option. Built on `tokio::sync::Semaphore`,
//! which is itself FIFO and releases the permit on every exit path (drop of
//! the returned guard), satisfying "holders must release on every exit path
//! including failure, cancellation, timeout" without any explicit cleanup
//! code at call sites.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Default)]
pub struct NamedSemaphores {
    pools: RwLock<HashMap<String, Arc<Semaphore>>>,
}

impl NamedSemaphores {
    pub fn new() -> Self {
        Self::default()
    }

    fn pool_for(&self, module: &str, capacity: u32) -> Arc<Semaphore> {
        if let Some(existing) = self.pools.read().get(module) {
            return existing.clone();
        }
        self.pools
        .write()
        .entry(module.to_string())
        .or_insert_with(|| Arc::new(Semaphore::new(capacity.max(1) as usize)))
        .clone()
    }

    /// Acquires one permit for `module`, creating its pool (sized to
    /// `capacity`) on first use. The returned permit releases automatically
    /// when dropped, including on cancellation of the awaiting future.
    #[allow(clippy::expect_used)]
    pub async fn acquire(&self, module: &str, capacity: u32) -> OwnedSemaphorePermit {
        let pool = self.pool_for(module, capacity);
        pool.acquire_owned().await.expect("semaphore is never closed")
    }
}

#[cfg(test)]
#[path = "semaphore_tests.rs"]
mod tests;
