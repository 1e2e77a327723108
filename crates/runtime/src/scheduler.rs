// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! scheduler: either unbounded (tasks run as soon as their
//! dependencies are satisfied, gated only by per-module `concurrency`
//! semaphores — priority is ignored) or a single bounded priority queue
//! with starvation-preventing aging. `dflow_runtime::engine` submits one
//! task per module invocation; sibling nodes in a layer submit
//! concurrently and the scheduler decides when each actually runs.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dflow_core::Clock;
use dflow_syntax::Priority;
use parking_lot::Mutex;
use tokio::sync::{oneshot, Notify, Semaphore};

use crate::error::RuntimeError;

/// defaults.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Off by default: the unbounded scheduler runs until turned on.
    pub bounded: bool,
    pub max_concurrency: usize,
    /// The aging bonus's period.
    pub starvation_timeout: Duration,
    pub max_queue_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            bounded: false,
            max_concurrency: 16,
            starvation_timeout: Duration::from_secs(5),
            max_queue_size: 10_000,
        }
    }
}

/// A point-in-time read of the scheduler's stats surface.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStats {
    pub active: usize,
    pub queued: usize,
    pub submitted: u64,
    pub completed: u64,
    pub by_priority_band: HashMap<&'static str, u64>,
    pub starvation_promotions: u64,
}

#[derive(Default)]
struct StatsInner {
    submitted: AtomicU64,
    completed: AtomicU64,
    starvation_promotions: AtomicU64,
    queued: AtomicUsize,
    active: AtomicUsize,
    by_priority_band: Mutex<HashMap<&'static str, u64>>,
}

impl StatsInner {
    fn snapshot(&self) -> SchedulerStats {
        SchedulerStats {
            active: self.active.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            by_priority_band: self.by_priority_band.lock().clone(),
            starvation_promotions: self.starvation_promotions.load(Ordering::Relaxed),
        }
    }

    fn record_completion(&self, band: &'static str) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        *self.by_priority_band.lock().entry(band).or_insert(0) += 1;
    }
}

/// `critical`/`high`/`normal`/`low`/`background`, keyed by the effective
/// priority a task crosses — used for `by_priority_band` bucketing
/// regardless of whether the base priority was a named level or a raw
/// 0..100 integer.
fn band_for(effective: u8) -> &'static str {
    match effective {
        80..=u8::MAX => "critical",
        60..=79 => "high",
        40..=59 => "normal",
        20..=39 => "low",
        _ => "background",
    }
}

type BoxedTask = Pin<Box<dyn Future<Output = ()> + Send>>;

struct QueuedTask {
    base_priority: u8,
    enqueued_at: std::time::Instant,
    seq: u64,
    run: BoxedTask,
}

struct BoundedInner {
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
    queue: Mutex<Vec<QueuedTask>>,
    notify: Notify,
    concurrency: Arc<Semaphore>,
    seq: AtomicU64,
    stats: Arc<StatsInner>,
}

/// scheduler. Construction spawns a background dispatcher task (in
/// bounded mode) that lives as long as the returned handle; dropping the
/// last `Scheduler` clone stops it (the dispatcher loop holds only a
/// `Weak`-free `Arc` it owns, so this is driven by `Arc` strong-count, not
/// an explicit shutdown flag — acceptable because the dispatcher's only
/// side effect while idle is awaiting a `Notify`).
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Mode>,
}

enum Mode {
    Unbounded { stats: Arc<StatsInner> },
    Bounded(Arc<BoundedInner>),
}

impl Scheduler {
    pub fn unbounded() -> Self {
        Self {
            inner: Arc::new(Mode::Unbounded { stats: Arc::new(StatsInner::default()) }),
        }
    }

    pub fn bounded(config: SchedulerConfig, clock: Arc<dyn Clock>) -> Self {
        let inner = Arc::new(BoundedInner {
                concurrency: Arc::new(Semaphore::new(config.max_concurrency.max(1))),
                clock,
                config,
                queue: Mutex::new(Vec::new()),
                notify: Notify::new(),
                seq: AtomicU64::new(0),
                stats: Arc::new(StatsInner::default()),
        });
        spawn_dispatcher(inner.clone());
        Self { inner: Arc::new(Mode::Bounded(inner)) }
    }

    pub fn from_config(config: SchedulerConfig, clock: Arc<dyn Clock>) -> Self {
        if config.bounded {
            Self::bounded(config, clock)
        } else {
            Self::unbounded()
        }
    }

    /// Submits `fut` for execution at `priority`. In unbounded mode this
    /// just spawns it (priority ignored); in bounded mode it enqueues and
    /// awaits its turn, subject to aging and `max_queue_size`.
    pub async fn submit<F, T>(&self, priority: Priority, fut: F) -> Result<T, RuntimeError>
    where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
    {
        match &*self.inner {
            Mode::Unbounded { stats } => {
                stats.submitted.fetch_add(1, Ordering::Relaxed);
                stats.active.fetch_add(1, Ordering::Relaxed);
                let result = fut.await;
                stats.active.fetch_sub(1, Ordering::Relaxed);
                stats.record_completion(band_for(priority.base()));
                Ok(result)
            }
            Mode::Bounded(inner) => {
                let (tx, rx) = oneshot::channel::<T>();
                {
                    let mut queue = inner.queue.lock();
                    if queue.len() >= inner.config.max_queue_size {
                        return Err(RuntimeError::QueueFull);
                    }
                    let seq = inner.seq.fetch_add(1, Ordering::Relaxed);
                    let stats = inner.stats.clone();
                    let run: BoxedTask = Box::pin(async move {
                            let result = fut.await;
                            stats.record_completion(band_for(priority.base()));
                            let _ = tx.send(result);
                    });
                    queue.push(QueuedTask {
                            base_priority: priority.base(),
                            enqueued_at: inner.clock.now(),
                            seq,
                            run,
                    });
                    inner.stats.queued.fetch_add(1, Ordering::Relaxed);
                    inner.stats.submitted.fetch_add(1, Ordering::Relaxed);
                }
                inner.notify.notify_one();
                rx.await.map_err(|_| RuntimeError::ShuttingDown)
            }
        }
    }

    pub fn stats(&self) -> SchedulerStats {
        match &*self.inner {
            Mode::Unbounded { stats } => stats.snapshot(),
            Mode::Bounded(inner) => inner.stats.snapshot(),
        }
    }
}

/// Effective priority: base plus `+10` per `aging_step` of queue
/// residency, capped at 100.
fn effective_priority(task: &QueuedTask, now: std::time::Instant, aging_step: Duration) -> f64 {
    let waited = now.saturating_duration_since(task.enqueued_at);
    let steps = waited.as_secs_f64() / aging_step.as_secs_f64().max(f64::EPSILON);
    (task.base_priority as f64 + steps * 10.0).min(100.0)
}

/// Pops the highest-effective-priority task (FIFO among ties), recording
/// a starvation promotion when aging alone lifted it past its base band.
fn pop_highest(inner: &BoundedInner) -> Option<QueuedTask> {
    let mut queue = inner.queue.lock();
    if queue.is_empty() {
        return None;
    }
    let now = inner.clock.now();
    let aging_step = inner.config.starvation_timeout;
    let mut best = 0usize;
    let mut best_score = effective_priority(&queue[0], now, aging_step);
    for (i, task) in queue.iter().enumerate().skip(1) {
        let score = effective_priority(task, now, aging_step);
        if score > best_score || (score == best_score && task.seq < queue[best].seq) {
            best = i;
            best_score = score;
        }
    }
    let task = queue.remove(best);
    inner.stats.queued.fetch_sub(1, Ordering::Relaxed);
    if best_score.floor() as u8 > task.base_priority && band_for(best_score.floor() as u8) != band_for(task.base_priority) {
        inner.stats.starvation_promotions.fetch_add(1, Ordering::Relaxed);
    }
    Some(task)
}

fn spawn_dispatcher(inner: Arc<BoundedInner>) {
    tokio::spawn(async move {
            loop {
                let permit = match inner.concurrency.clone().acquire_owned().await {
                    Ok(p) => p,
                    Err(_) => return,
                };
                let task = loop {
                    if let Some(task) = pop_highest(&inner) {
                        break task;
                    }
                    // Wake at least once per aging step so a lone low-priority
                    // task still ages into eligibility without a fresh submit.
                    tokio::select! {
                        _ = inner.notify.notified() => {}
                        _ = tokio::time::sleep(inner.config.starvation_timeout) => {}
                    }
                };
                inner.stats.active.fetch_add(1, Ordering::Relaxed);
                let active = inner.stats.clone();
                tokio::spawn(async move {
                        task.run.await;
                        active.active.fetch_sub(1, Ordering::Relaxed);
                        drop(permit);
                });
            }
    });
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
