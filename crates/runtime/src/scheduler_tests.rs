use super::*;
use dflow_core::{FakeClock, SystemClock};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

#[tokio::test]
async fn unbounded_runs_immediately_regardless_of_priority() {
    let scheduler = Scheduler::unbounded();
    let result = scheduler.submit(Priority::Background, async { 1 + 1 }).await.unwrap();
    assert_eq!(result, 2);
    assert_eq!(scheduler.stats().completed, 1);
}

#[tokio::test]
async fn bounded_respects_max_concurrency() {
    let scheduler = Scheduler::bounded(
        SchedulerConfig { bounded: true, max_concurrency: 2, ..Default::default() },
        Arc::new(SystemClock),
    );
    let concurrent = Arc::new(AtomicU32::new(0));
    let peak = Arc::new(AtomicU32::new(0));
    let mut handles = Vec::new();
    for _ in 0..6 {
        let scheduler = scheduler.clone();
        let concurrent = concurrent.clone();
        let peak = peak.clone();
        handles.push(tokio::spawn(async move {
                    scheduler
                    .submit(Priority::Normal, async move {
                            let n = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                            peak.fetch_max(n, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            concurrent.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await
                    .unwrap();
        }));
    }
    for h in handles {
        h.await.unwrap();
    }
    assert!(peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn higher_priority_dequeues_before_lower_when_submitted_together() {
    let clock = Arc::new(FakeClock::new());
    let scheduler = Scheduler::bounded(
        SchedulerConfig { bounded: true, max_concurrency: 1, ..Default::default() },
        clock.clone(),
    );
    // Occupy the single slot so subsequent submissions queue up.
    let holder = scheduler.clone();
    let hold = tokio::spawn(async move {
            holder
            .submit(Priority::Normal, async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
            })
            .await
            .unwrap();
    });
    tokio::time::sleep(Duration::from_millis(5)).await;

    let order = Arc::new(Mutex::new(Vec::new()));
    let low_order = order.clone();
    let low = scheduler.submit(Priority::Low, async move {
            low_order.lock().push("low");
    });
    let crit_order = order.clone();
    let crit = scheduler.submit(Priority::Critical, async move {
            crit_order.lock().push("critical");
    });
    let (_, _) = tokio::join!(low, crit);
    hold.await.unwrap();

    assert_eq!(*order.lock(), vec!["critical", "low"]);
}

#[tokio::test]
async fn queue_full_is_reported_immediately() {
    let scheduler = Scheduler::bounded(
        SchedulerConfig { bounded: true, max_concurrency: 1, max_queue_size: 1, ..Default::default() },
        Arc::new(SystemClock),
    );
    let holder = scheduler.clone();
    let hold = tokio::spawn(async move {
            holder.submit(Priority::Normal, async { tokio::time::sleep(Duration::from_millis(50)).await }).await
    });
    tokio::time::sleep(Duration::from_millis(5)).await;
    let filler = scheduler.clone();
    let _first = tokio::spawn(async move {
            filler.submit(Priority::Normal, async { tokio::time::sleep(Duration::from_millis(50)).await }).await
    });
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = scheduler.submit(Priority::Normal, async {}).await;
    assert!(matches!(second, Err(RuntimeError::QueueFull)));
    hold.await.unwrap().unwrap();
}

#[test]
fn band_for_matches_priority_thresholds() {
    assert_eq!(band_for(90), "critical");
    assert_eq!(band_for(70), "high");
    assert_eq!(band_for(50), "normal");
    assert_eq!(band_for(30), "low");
    assert_eq!(band_for(5), "background");
}
