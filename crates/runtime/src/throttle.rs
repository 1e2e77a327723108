// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! throttle: a token bucket per module name. Capacity and refill
//! rate come from the call site's `throttle: (count, per)` option; buckets
//! are created lazily on first use and keyed independently so contention on
//! one module's bucket never blocks another's (fine-grained, not global).

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

struct Bucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl Bucket {
    fn new(count: i64, per: Duration, now: Instant) -> Self {
        let capacity = count.max(1) as f64;
        let refill_per_sec = capacity / per.as_secs_f64().max(f64::EPSILON);
        Self {
            capacity,
            tokens: capacity,
            refill_per_sec,
            last_refill: now,
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        if elapsed <= 0.0 {
            return;
        }
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    fn time_to_next_token(&self) -> Duration {
        let deficit = (1.0 - self.tokens).max(0.0);
        Duration::from_secs_f64(deficit / self.refill_per_sec)
    }
}

/// Per-module token-bucket rate limiter.
#[derive(Default)]
pub struct Throttle {
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl Throttle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one token for `module`, waiting (via the host's async
    /// sleep) until the bucket has refilled enough if it is currently
    /// empty. `count`/`per` describe the call site's declared rate.
    pub async fn acquire(&self, module: &str, count: i64, per: Duration) {
        loop {
            let wait = {
                let mut buckets = self.buckets.lock();
                let now = Instant::now();
                // `tokio::time::Instant::now()` tracks the paused virtual
                // clock under `#[tokio::test(start_paused = true)]`, so
                // refill math stays consistent with `sleep` below.
                let bucket = buckets
                .entry(module.to_string())
                .or_insert_with(|| Bucket::new(count, per, now));
                bucket.refill(now);
                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    None
                } else {
                    Some(bucket.time_to_next_token())
                }
            };
            match wait {
                None => return,
                Some(duration) => tokio::time::sleep(duration).await,
            }
        }
    }
}

#[cfg(test)]
#[path = "throttle_tests.rs"]
mod tests;
