// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test(start_paused = true)]
async fn acquire_is_immediate_while_tokens_remain() {
    let throttle = Throttle::new();
    let start = tokio::time::Instant::now();
    throttle.acquire("ns.fn", 5, Duration::from_secs(1)).await;
    throttle.acquire("ns.fn", 5, Duration::from_secs(1)).await;
    assert!(start.elapsed() < Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn acquire_waits_for_refill_once_the_bucket_is_empty() {
    let throttle = Throttle::new();
    for _ in 0..2 {
        throttle.acquire("ns.fn", 2, Duration::from_secs(1)).await;
    }
    let start = tokio::time::Instant::now();
    throttle.acquire("ns.fn", 2, Duration::from_secs(1)).await;
    assert!(start.elapsed() >= Duration::from_millis(400));
}

#[tokio::test(start_paused = true)]
async fn separate_modules_have_independent_buckets() {
    let throttle = Throttle::new();
    throttle.acquire("ns.a", 1, Duration::from_secs(10)).await;
    let start = tokio::time::Instant::now();
    throttle.acquire("ns.b", 1, Duration::from_secs(10)).await;
    assert!(start.elapsed() < Duration::from_millis(50));
}
