//! Scheduler implementation

use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tokio::sync::{Mutex, Notify, oneshot};
use tracing::debug;

use super::config::SchedulerConfig;
use super::error::{SchedulerError, TaskError};
use super::queue::{QueueState, Runner, SchedulerStats, TaskHandle};

/// Internal state protected by mutex
struct SchedulerInner {
    /// FIFO queue of not-yet-started runners
    waiting: VecDeque<Runner>,

    /// Tasks started and not yet settled
    running: usize,

    /// While set, the waiting queue does not advance
    paused: bool,

    /// Bumped by `clear()`; runners started under an older epoch skip
    /// their completion bookkeeping (their slot no longer exists)
    epoch: u64,

    /// Statistics
    stats: SchedulerStats,
}

/// State shared between the scheduler and its spawned runners
struct Shared {
    config: SchedulerConfig,
    inner: Mutex<SchedulerInner>,

    /// Signalled whenever the scheduler becomes idle
    drained: Notify,
}

/// The Scheduler admits async tasks up to a fixed concurrency limit,
/// queueing the rest in submission order.
///
/// Tasks are opaque: the scheduler never inspects their output, it only
/// reacts to their settling. A task that resolves to an error value is
/// bookkept exactly like one that succeeds; the outcome is delivered to
/// the submitter through the [`TaskHandle`] and nowhere else.
pub struct Scheduler {
    shared: Arc<Shared>,
}

impl Scheduler {
    /// Create a new scheduler with the given configuration
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        debug!(?config, "Scheduler::new: called");
        config.validate()?;

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                inner: Mutex::new(SchedulerInner {
                    waiting: VecDeque::new(),
                    running: 0,
                    paused: false,
                    epoch: 0,
                    stats: SchedulerStats::default(),
                }),
                drained: Notify::new(),
            }),
        })
    }

    /// Create a scheduler with the given concurrency limit
    pub fn with_limit(max_concurrent: usize) -> Result<Self, SchedulerError> {
        Self::new(SchedulerConfig::with_limit(max_concurrent))
    }

    /// Submit a task for execution
    ///
    /// Starts the task immediately if a slot is free and the scheduler is
    /// not paused, otherwise appends it to the waiting queue. Futures are
    /// lazy, so a queued task does no work until it is started.
    ///
    /// Returns a [`TaskHandle`] resolving to the task's output. A task
    /// that panics still releases its slot; its handle resolves with
    /// [`TaskError::Panicked`].
    ///
    /// [`TaskError::Panicked`]: super::TaskError::Panicked
    pub async fn submit<F, T>(&self, task: F) -> TaskHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let runner = Runner {
            future: Box::pin(async move {
                // Contain panics so the slot is always released
                let output = AssertUnwindSafe(task).catch_unwind().await;
                // The submitter may have dropped its handle
                let _ = tx.send(output.map_err(|_| TaskError::Panicked));
            }),
            submitted_at: Instant::now(),
        };

        let mut inner = self.shared.inner.lock().await;
        inner.stats.total_submitted += 1;

        if inner.running < self.shared.config.max_concurrent && !inner.paused {
            debug!(running = inner.running, "Scheduler::submit: slot free, starting immediately");
            Shared::start(&self.shared, &mut inner, runner);
        } else {
            inner.waiting.push_back(runner);
            inner.stats.peak_queue_depth = inner.stats.peak_queue_depth.max(inner.waiting.len());
            debug!(waiting = inner.waiting.len(), "Scheduler::submit: at capacity or paused, queued");
        }

        TaskHandle::new(rx)
    }

    /// Submit an ordered batch of tasks
    ///
    /// Each element is admitted exactly as [`submit`](Self::submit) would,
    /// in iteration order. Returns one handle per task, in the same order.
    pub async fn submit_all<I, F, T>(&self, tasks: I) -> Vec<TaskHandle<T>>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let mut handles = Vec::new();
        for task in tasks {
            handles.push(self.submit(task).await);
        }
        debug!(count = handles.len(), "Scheduler::submit_all: batch admitted");
        handles
    }

    /// Stop the waiting queue from advancing
    ///
    /// Tasks already started are unaffected.
    pub async fn pause(&self) {
        debug!("Scheduler::pause: called");
        self.shared.inner.lock().await.paused = true;
    }

    /// Resume the waiting queue, starting tasks until every free slot is
    /// filled or the queue empties
    pub async fn resume(&self) {
        debug!("Scheduler::resume: called");
        let mut inner = self.shared.inner.lock().await;
        inner.paused = false;
        while Shared::advance(&self.shared, &mut inner) {}
    }

    /// Discard every waiting task and forget all running slots
    ///
    /// Handles of discarded tasks resolve with [`TaskError::Cleared`]
    /// (see [`TaskHandle`]). Tasks already started keep running and still
    /// deliver their output, but they no longer own a slot: when they
    /// settle they neither decrement the running count nor advance the
    /// queue. The paused flag and the concurrency limit are untouched.
    ///
    /// [`TaskError::Cleared`]: super::TaskError::Cleared
    pub async fn clear(&self) {
        let mut inner = self.shared.inner.lock().await;
        debug!(
            dropped = inner.waiting.len(),
            in_flight = inner.running,
            "Scheduler::clear: called"
        );

        inner.epoch += 1;
        inner.stats.total_cleared += inner.waiting.len() as u64;
        inner.waiting.clear();
        inner.running = 0;
        drop(inner);

        // Counts are zero now, so the scheduler is drained by the books
        self.shared.drained.notify_waiters();
    }

    /// Number of tasks waiting for a slot
    pub async fn waiting_count(&self) -> usize {
        self.shared.inner.lock().await.waiting.len()
    }

    /// Number of tasks started but not yet settled
    pub async fn ongoing_count(&self) -> usize {
        self.shared.inner.lock().await.running
    }

    /// Whether the waiting queue is currently paused
    pub async fn is_paused(&self) -> bool {
        self.shared.inner.lock().await.paused
    }

    /// Get one consistent snapshot of counts, paused flag, and stats
    pub async fn queue_state(&self) -> QueueState {
        let inner = self.shared.inner.lock().await;
        QueueState {
            ongoing: inner.running,
            waiting: inner.waiting.len(),
            paused: inner.paused,
            stats: inner.stats.clone(),
        }
    }

    /// Get the scheduler statistics
    pub async fn stats(&self) -> SchedulerStats {
        self.shared.inner.lock().await.stats.clone()
    }

    /// Wait until the queue is empty and nothing is running
    ///
    /// Resolves immediately if the scheduler is already idle.
    pub async fn wait_until_drained(&self) {
        debug!("Scheduler::wait_until_drained: called");
        loop {
            // Register for the notification before checking, so a runner
            // finishing between the check and the await is not missed
            let notified = self.shared.drained.notified();
            {
                let inner = self.shared.inner.lock().await;
                if inner.running == 0 && inner.waiting.is_empty() {
                    debug!("Scheduler::wait_until_drained: idle");
                    return;
                }
            }
            notified.await;
        }
    }
}

impl Shared {
    /// Take a slot for the runner and spawn it. Caller holds the lock.
    fn start(shared: &Arc<Shared>, inner: &mut SchedulerInner, runner: Runner) {
        inner.running += 1;
        inner.stats.peak_concurrent = inner.stats.peak_concurrent.max(inner.running);
        inner.stats.total_wait_time_ms += runner.submitted_at.elapsed().as_millis() as u64;

        let epoch = inner.epoch;
        let shared = Arc::clone(shared);
        tokio::spawn(async move {
            runner.future.await;
            shared.finish(epoch).await;
        });
    }

    /// Start the next waiting runner if a slot is free and the queue is
    /// not paused. Returns whether a runner was started. Caller holds
    /// the lock.
    fn advance(shared: &Arc<Shared>, inner: &mut SchedulerInner) -> bool {
        if inner.running >= shared.config.max_concurrent || inner.paused {
            return false;
        }
        match inner.waiting.pop_front() {
            Some(runner) => {
                debug!("Scheduler::advance: starting next queued task");
                Shared::start(shared, inner, runner);
                true
            }
            None => false,
        }
    }

    /// Bookkeeping after a runner settles: release its slot and advance
    /// the queue by exactly one
    async fn finish(self: Arc<Self>, epoch: u64) {
        let mut inner = self.inner.lock().await;

        if inner.epoch != epoch {
            debug!("Scheduler::finish: runner predates a clear(), skipping bookkeeping");
            return;
        }

        inner.running -= 1;
        inner.stats.total_completed += 1;
        debug!(running = inner.running, "Scheduler::finish: slot released");

        Shared::advance(&self, &mut inner);

        if inner.running == 0 && inner.waiting.is_empty() {
            drop(inner);
            self.drained.notify_waiters();
        }
    }
}
