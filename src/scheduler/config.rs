//! Scheduler configuration

use serde::{Deserialize, Serialize};

use super::error::SchedulerError;

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Max tasks allowed to be in flight at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_max_concurrent() -> usize {
    1
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { max_concurrent: 1 }
    }
}

impl SchedulerConfig {
    /// Build a config with the given concurrency limit
    pub fn with_limit(max_concurrent: usize) -> Self {
        Self { max_concurrent }
    }

    /// Reject configurations the scheduler cannot run with
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.max_concurrent < 1 {
            return Err(SchedulerError::InvalidConcurrency(self.max_concurrent));
        }
        Ok(())
    }
}
