//! Integration tests for TaskQueue
//!
//! These tests verify end-to-end scheduling behavior through the public API.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use taskqueue::{Scheduler, SchedulerConfig, SchedulerError, TaskError};
use tokio::sync::oneshot;

// =============================================================================
// Admission Tests
// =============================================================================

#[tokio::test]
async fn test_limit_two_with_three_tasks() {
    let scheduler = Scheduler::with_limit(2).expect("limit 2 is valid");

    let (gate1, rx1) = oneshot::channel::<()>();
    let (gate2, rx2) = oneshot::channel::<()>();
    let (gate3, rx3) = oneshot::channel::<()>();

    let h1 = scheduler.submit(async move { rx1.await.ok() }).await;
    let h2 = scheduler.submit(async move { rx2.await.ok() }).await;
    let h3 = scheduler.submit(async move { rx3.await.ok() }).await;

    // T1 and T2 start immediately, T3 waits
    assert_eq!(scheduler.ongoing_count().await, 2);
    assert_eq!(scheduler.waiting_count().await, 1);

    // When one finishes, T3 gets its slot
    gate1.send(()).unwrap();
    h1.await.expect("t1 settles");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(scheduler.ongoing_count().await, 2);
    assert_eq!(scheduler.waiting_count().await, 0);

    gate2.send(()).unwrap();
    gate3.send(()).unwrap();
    h2.await.expect("t2 settles");
    h3.await.expect("t3 settles");

    scheduler.wait_until_drained().await;
    assert_eq!(scheduler.ongoing_count().await, 0);
    assert_eq!(scheduler.waiting_count().await, 0);
}

#[tokio::test]
async fn test_batch_preserves_order_across_failure() {
    let scheduler = Scheduler::new(SchedulerConfig::with_limit(1)).expect("limit 1 is valid");
    let order = Arc::new(Mutex::new(Vec::new()));

    let o1 = order.clone();
    let o2 = order.clone();
    let handles = scheduler
        .submit_all(vec![
            async move {
                o1.lock().unwrap().push("t1");
                Err::<(), &str>("t1 failed")
            }
            .boxed(),
            async move {
                o2.lock().unwrap().push("t2");
                Ok::<(), &str>(())
            }
            .boxed(),
        ])
        .await;
    assert_eq!(handles.len(), 2);

    scheduler.wait_until_drained().await;

    // T2 ran only after T1 settled, and T1's failure changed nothing
    assert_eq!(order.lock().unwrap().clone(), vec!["t1", "t2"]);
    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.expect("neither task was cleared"));
    }
    assert_eq!(results, vec![Err("t1 failed"), Ok(())]);
}

#[tokio::test]
async fn test_invalid_limit_is_the_only_construction_failure() {
    assert_eq!(
        Scheduler::with_limit(0).err(),
        Some(SchedulerError::InvalidConcurrency(0))
    );
    assert!(Scheduler::with_limit(1).is_ok());
    assert!(Scheduler::with_limit(100).is_ok());
}

// =============================================================================
// Flow Control Tests
// =============================================================================

#[tokio::test]
async fn test_pause_resume_round_trip() {
    let scheduler = Arc::new(Scheduler::with_limit(2).expect("limit 2 is valid"));
    let completed = Arc::new(Mutex::new(0u32));

    scheduler.pause().await;
    for _ in 0..4 {
        let completed = completed.clone();
        scheduler
            .submit(async move {
                *completed.lock().unwrap() += 1;
            })
            .await;
    }

    // Paused: nothing runs no matter how much was submitted
    assert_eq!(scheduler.ongoing_count().await, 0);
    assert_eq!(scheduler.waiting_count().await, 4);
    assert_eq!(*completed.lock().unwrap(), 0);

    scheduler.resume().await;
    scheduler.wait_until_drained().await;
    assert_eq!(*completed.lock().unwrap(), 4);
}

#[tokio::test]
async fn test_clear_then_keep_scheduling() {
    let scheduler = Scheduler::with_limit(1).expect("limit 1 is valid");

    let (gate, rx) = oneshot::channel::<()>();
    let running = scheduler.submit(async move { rx.await.ok() }).await;
    let queued = scheduler.submit(async { "never starts" }).await;

    scheduler.clear().await;
    assert_eq!(queued.await, Err(TaskError::Cleared));

    // The scheduler keeps working after a clear
    let fresh = scheduler.submit(async { "fresh" }).await;
    assert_eq!(fresh.await, Ok("fresh"));

    gate.send(()).unwrap();
    running.await.expect("pre-clear task still delivers");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(scheduler.ongoing_count().await, 0);
}

// =============================================================================
// Drain Tests
// =============================================================================

#[tokio::test]
async fn test_drained_waiter_wakes_on_last_completion() {
    let scheduler = Arc::new(Scheduler::with_limit(2).expect("limit 2 is valid"));

    let (gate, rx) = oneshot::channel::<()>();
    scheduler.submit(async move { rx.await.ok() }).await;

    let waiter = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.wait_until_drained().await })
    };

    // Not drained while the task is in flight
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiter.is_finished());

    gate.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), waiter)
        .await
        .expect("drained within timeout")
        .expect("waiter task completes");
}
