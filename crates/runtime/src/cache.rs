// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! cache: keyed by `(module_fqn, canonical_hash_of_inputs, version)`,
//! TTL-expiring, with the in-process default backend additionally bounded by
//! capacity and evicted LRU. Canonical hashing of the input record reuses
//! the same field-name-sorted-pairs rule `dflow_compile::hash` uses for
//! structural hashing, so two calls with the same logical inputs collide on
//! key regardless of the order fields were supplied in.

use async_trait::async_trait;
use dflow_core::{Clock, Value};
use indexmap::IndexMap;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Computes the cache key for a module call: fqn, version, and a digest of
/// the consumed arguments sorted by field name.
pub fn cache_key(module_fqn: &str, version: &str, consumed: &IndexMap<String, Value>) -> String {
    let mut names: Vec<&String> = consumed.keys().collect();
    names.sort();
    let mut text = format!("{module_fqn}@{version}|");
    for name in names {
        let _ = write!(text, "{name}={};", canonical_value(&consumed[name]));
    }
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

fn canonical_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("s:{s:?}"),
        Value::Int(n) => format!("i:{n}"),
        Value::Float(f) => format!("f:{f}"),
        Value::Bool(b) => format!("b:{b}"),
        Value::List { elements,.. } => {
            let parts: Vec<String> = elements.iter().map(canonical_value).collect();
            format!("[{}]", parts.join(","))
        }
        Value::Map { entries,.. } => {
            let mut parts: Vec<String> = entries
            .iter()
            .map(|(k, v)| format!("{}:{}", canonical_value(k), canonical_value(v)))
            .collect();
            parts.sort();
            format!("{{{}}}", parts.join(","))
        }
        Value::Record { fields,.. } => {
            let mut names: Vec<&String> = fields.keys().collect();
            names.sort();
            let parts: Vec<String> = names
            .into_iter()
            .map(|n| format!("{n}={}", canonical_value(&fields[n])))
            .collect();
            format!("{{{}}}", parts.join(","))
        }
        Value::Union { tag, payload,.. } => format!("<{tag}:{}>", canonical_value(payload)),
        Value::Some { inner,.. } => format!("some({})", canonical_value(inner)),
        Value::None {.. } => "none".to_string(),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// A pluggable cache implementation. `supports_lock_free_reads`
/// decides whether the runtime performs the cache lookup before or after
/// acquiring the module's concurrency permit.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn lookup(&self, key: &str) -> Option<Value>;
    async fn put(&self, key: String, value: Value, ttl: Duration);
    async fn invalidate(&self, key: &str);
    async fn invalidate_by_module(&self, module_fqn: &str);
    fn stats(&self) -> CacheStats;

    /// In-process backends can check an `IndexMap` without awaiting I/O;
    /// remote backends cannot, so their lookup must wait for the module's
    /// concurrency permit like everything else.
    fn supports_lock_free_reads(&self) -> bool {
        true
    }
}

struct Entry {
    value: Value,
    module_fqn: String,
    expires_at: Instant,
}

struct MemoryCacheInner {
    entries: IndexMap<String, Entry>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Default in-process backend: TTL expiry plus a bounded-capacity LRU.
/// `IndexMap` doubles as the LRU ledger — a hit moves its entry to the back
/// via `shift_remove` + reinsert, and overflow evicts from the front.
pub struct MemoryCache {
    inner: Mutex<MemoryCacheInner>,
    clock: Arc<dyn Clock>,
    capacity: usize,
}

const DEFAULT_CAPACITY: usize = 10_000;

impl MemoryCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_capacity(clock, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(clock: Arc<dyn Clock>, capacity: usize) -> Self {
        Self {
            inner: Mutex::new(MemoryCacheInner {
                    entries: IndexMap::new(),
                    hits: 0,
                    misses: 0,
                    evictions: 0,
            }),
            clock,
            capacity,
        }
    }

    fn evict_expired_locked(inner: &mut MemoryCacheInner, now: Instant) {
        inner.entries.retain(|_, e| e.expires_at > now);
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    #[allow(clippy::expect_used)]
    async fn lookup(&self, key: &str) -> Option<Value> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        match inner.entries.get(key) {
            Some(entry) if entry.expires_at > now => {}
            Some(_) => {
                inner.entries.shift_remove(key);
                inner.misses += 1;
                return None;
            }
            None => {
                inner.misses += 1;
                return None;
            }
        }
        // Move to the back (most recently used) by removing and reinserting.
        let entry = inner.entries.shift_remove(key).expect("checked present above");
        let value = entry.value.clone();
        inner.entries.insert(key.to_string(), entry);
        inner.hits += 1;
        Some(value)
    }

    async fn put(&self, key: String, value: Value, ttl: Duration) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        Self::evict_expired_locked(&mut inner, now);
        let module_fqn = key.split('@').next().unwrap_or_default().to_string();
        inner.entries.insert(
            key,
            Entry {
                value,
                module_fqn,
                expires_at: now + ttl,
            },
        );
        while inner.entries.len() > self.capacity {
            inner.entries.shift_remove_index(0);
            inner.evictions += 1;
        }
    }

    async fn invalidate(&self, key: &str) {
        self.inner.lock().entries.shift_remove(key);
    }

    async fn invalidate_by_module(&self, module_fqn: &str) {
        self.inner.lock().entries.retain(|_, e| e.module_fqn != module_fqn);
    }

    fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            size: inner.entries.len(),
        }
    }
}

/// Maps `cache_backend: "name"` to a registered implementation, falling
/// back to the in-memory default (with a warning) when the name is unknown.
pub struct CacheRegistry {
    backends: HashMap<String, Arc<dyn CacheBackend>>,
    default: Arc<dyn CacheBackend>,
}

impl CacheRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            backends: HashMap::new(),
            default: Arc::new(MemoryCache::new(clock)),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, backend: Arc<dyn CacheBackend>) {
        self.backends.insert(name.into(), backend);
    }

    pub fn resolve(&self, name: &str) -> Arc<dyn CacheBackend> {
        if name == "memory" {
            return self.default.clone();
        }
        match self.backends.get(name) {
            Some(backend) => backend.clone(),
            None => {
                tracing::warn!(backend = name, "unknown cache_backend, falling back to memory");
                self.default.clone()
            }
        }
    }
}

/// single-flight guarantee: at most one concurrent compute per key.
/// The leader computes and calls `finish`; followers await `wait` and then
/// re-check the cache themselves.
#[derive(Default)]
pub struct SingleFlightGroup {
    inflight: Mutex<HashMap<String, Arc<tokio::sync::Notify>>>,
    joins: AtomicU64,
}

pub enum FlightRole {
    Leader,
    Follower(Arc<tokio::sync::Notify>),
}

impl SingleFlightGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers interest in `key`. The first caller becomes the leader and
    /// must call `finish(key)` once it has published the result (success or
    /// failure) so followers wake up.
    pub fn join(&self, key: &str) -> FlightRole {
        let mut guard = self.inflight.lock();
        if let Some(notify) = guard.get(key) {
            self.joins.fetch_add(1, Ordering::Relaxed);
            FlightRole::Follower(notify.clone())
        } else {
            let notify = Arc::new(tokio::sync::Notify::new());
            guard.insert(key.to_string(), notify);
            FlightRole::Leader
        }
    }

    pub fn finish(&self, key: &str) {
        if let Some(notify) = self.inflight.lock().remove(key) {
            notify.notify_waiters();
        }
    }

    /// Count of calls that joined as a follower, for tests asserting
    /// that the module body executes exactly once under concurrent
    /// identical-key calls.
    pub fn follower_joins(&self) -> u64 {
        self.joins.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
