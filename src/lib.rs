//! TaskQueue - bounded-concurrency async task scheduler
//!
//! TaskQueue throttles parallel asynchronous operations: submit any number
//! of tasks and at most `max_concurrent` run at a time, with the rest held
//! in a FIFO waiting queue. Useful for rate-sensitive work like outbound
//! network calls where callers need admission control without building it
//! themselves.
//!
//! # Core Concepts
//!
//! - **Bounded admission**: a task starts immediately when a slot is free,
//!   otherwise it waits its turn in submission order
//! - **Flow control**: `pause` holds the queue, `resume` fills every free
//!   slot, `clear` discards everything not yet started
//! - **Opaque tasks**: the scheduler never inspects a task's output; success
//!   and failure release a slot the same way
//! - **Observable outcomes**: every submission returns a [`TaskHandle`]
//!   resolving to the task's output, and [`Scheduler::wait_until_drained`]
//!   signals when everything has settled
//!
//! # Example
//!
//! ```no_run
//! use taskqueue::Scheduler;
//!
//! # async fn demo() -> Result<(), taskqueue::SchedulerError> {
//! let scheduler = Scheduler::with_limit(2)?;
//!
//! let handle = scheduler.submit(async { 40 + 2 }).await;
//! assert_eq!(handle.await, Ok(42));
//!
//! scheduler.wait_until_drained().await;
//! # Ok(())
//! # }
//! ```

pub mod scheduler;

pub use scheduler::{QueueState, Scheduler, SchedulerConfig, SchedulerError, SchedulerStats, TaskError, TaskHandle};
