//! Scheduler error types

use thiserror::Error;

/// Errors from scheduler construction
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Expected `max_concurrent` to be at least 1, got {0}")]
    InvalidConcurrency(usize),
}

/// Errors observed through a [`TaskHandle`](super::TaskHandle)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    /// The task was discarded by `clear()` before it ever started
    #[error("Task was cleared from the queue before starting")]
    Cleared,

    /// The task panicked while running; its slot was still released
    #[error("Task panicked while running")]
    Panicked,
}
