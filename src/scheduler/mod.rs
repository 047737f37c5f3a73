//! Scheduler for task execution
//!
//! Manages async task execution with FIFO queuing, a fixed concurrency
//! limit, and pause/resume/clear flow control in a single component.

mod config;
mod core;
mod error;
mod queue;

pub use config::SchedulerConfig;
pub use core::Scheduler;
pub use error::{SchedulerError, TaskError};
pub use queue::{QueueState, SchedulerStats, TaskHandle};
