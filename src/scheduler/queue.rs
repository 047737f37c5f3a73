//! Queue types for the scheduler

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use futures::future::BoxFuture;
use tokio::sync::oneshot;

use super::error::TaskError;

/// A not-yet-started task, type-erased and bound to its completion channel.
///
/// Dropping a Runner before it starts drops the channel sender, which is
/// how a handle learns its task was cleared.
pub(crate) struct Runner {
    /// Runs the task and delivers its output to the handle
    pub(crate) future: BoxFuture<'static, ()>,

    /// When the task was submitted, for queue wait accounting
    pub(crate) submitted_at: Instant,
}

/// Handle to a submitted task's eventual output.
///
/// Awaiting the handle yields the task's output once it settles,
/// [`TaskError::Cleared`] if the task was discarded from the waiting
/// queue by `clear()` before it ever started, or [`TaskError::Panicked`]
/// if the task panicked while running. The handle may be dropped freely;
/// the scheduler runs the task either way.
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<Result<T, TaskError>>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(rx: oneshot::Receiver<Result<T, TaskError>>) -> Self {
        Self { rx }
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, TaskError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|res| match res {
            Ok(output) => output,
            Err(_) => Err(TaskError::Cleared),
        })
    }
}

/// Statistics for the scheduler
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Tasks ever admitted, whether started immediately or queued
    pub total_submitted: u64,
    /// Tasks that settled and released their slot
    pub total_completed: u64,
    /// Queued tasks discarded by `clear()`
    pub total_cleared: u64,
    /// Time tasks spent waiting for a slot, summed
    pub total_wait_time_ms: u64,
    pub peak_queue_depth: usize,
    pub peak_concurrent: usize,
}

/// One consistent snapshot of scheduler state
#[derive(Debug, Clone)]
pub struct QueueState {
    /// Tasks started but not yet settled
    pub ongoing: usize,
    /// Tasks waiting for a slot
    pub waiting: usize,
    pub paused: bool,
    pub stats: SchedulerStats,
}
