// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The execution engine: the per-call cache/throttle/semaphore layer,
//! an unbounded-or-bounded-priority scheduler, a layer-by-layer runtime
//! wrapping every module call in the exact
//! throttle -> semaphore -> cache -> timeout -> retry -> body -> on_error
//! nesting, and suspension/resumption against a `SuspensionStore` trait
//! whose persistence backend lives in `dflow-store`.

mod cache;
mod engine;
mod error;
mod scheduler;
mod semaphore;
mod suspension;
mod throttle;

pub use cache::{
    cache_key, CacheBackend, CacheRegistry, CacheStats, FlightRole, MemoryCache, SingleFlightGroup,
};
pub use engine::{ExecutionOutcome, ExecutionResult, Runtime};
pub use error::{Attempt, RuntimeError};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerStats};
pub use semaphore::NamedSemaphores;
pub use suspension::{
    InMemorySuspensionStore, NodeStatus, StoredValue, SuspendedExecution, SuspensionError, SuspensionStore,
};
pub use throttle::Throttle;
