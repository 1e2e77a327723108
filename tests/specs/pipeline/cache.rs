//! A module declared `cache:5min` executes its body exactly once
//! across two identical-input calls within the TTL.

use crate::prelude::*;
use dflow_registry::ModuleRegistry;
use indexmap::IndexMap;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn second_call_within_ttl_is_served_from_cache() {
    let registry = ModuleRegistry::new();
    let calls = register_expensive(&registry);

    let source = "result = test.expensive() with cache: 5min\nout result\n";
    let image = compile_ok(source, &registry);
    let runtime = unbounded_runtime(registry);

    runtime.execute(&image.dag, IndexMap::new()).await;
    runtime.execute(&image.dag, IndexMap::new()).await;

    assert_eq!(calls.0.load(Ordering::SeqCst), 1, "second call must be served from cache, not re-executed");
}

#[tokio::test]
async fn concurrent_identical_cache_misses_execute_the_body_exactly_once() {
    let registry = ModuleRegistry::new();
    let calls = register_expensive(&registry);

    let source = "result = test.expensive() with cache: 5min\nout result\n";
    let image = std::sync::Arc::new(compile_ok(source, &registry));
    let runtime = std::sync::Arc::new(unbounded_runtime(registry));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let image = image.clone();
        let runtime = runtime.clone();
        handles.push(tokio::spawn(async move { runtime.execute(&image.dag, IndexMap::new()).await }));
    }
    for h in handles {
        h.await.expect("task panicked");
    }

    assert_eq!(calls.0.load(Ordering::SeqCst), 1, "single-flight: exactly one concurrent miss computes");
}
