// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::test]
async fn acquire_bounds_concurrency_to_capacity() {
    let pools = Arc::new(NamedSemaphores::new());
    let concurrent = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::new();

    for _ in 0..5 {
        let pools = pools.clone();
        let concurrent = concurrent.clone();
        let max_seen = max_seen.clone();
        handles.push(tokio::spawn(async move {
                    let _permit = pools.acquire("ns.fn", 2).await;
                    let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    concurrent.fetch_sub(1, Ordering::SeqCst);
        }));
    }

    for h in handles {
        h.await.expect("task completes");
    }
    assert!(max_seen.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn separate_modules_have_independent_pools() {
    let pools = NamedSemaphores::new();
    let _a = pools.acquire("ns.a", 1).await;
    let b = tokio::time::timeout(Duration::from_millis(50), pools.acquire("ns.b", 1)).await;
    assert!(b.is_ok());
}
