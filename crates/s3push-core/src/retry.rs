//! Retry policies for failed uploads
//!
//! The default policy retries forever without waiting: a task is only ever
//! dropped by succeeding. [`Bounded`] caps the attempts and adds exponential
//! backoff for callers that prefer failing over stalling.

use std::time::Duration;

/// Decides whether a failed upload is tried again
pub trait RetryPolicy: Send + Sync {
    /// Delay before the next attempt, given how many attempts have failed so
    /// far (starting at 1). `None` gives up on the task.
    fn next_delay(&self, failed_attempts: u32) -> Option<Duration>;
}

/// Retry immediately, forever
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl RetryPolicy for Unbounded {
    fn next_delay(&self, _failed_attempts: u32) -> Option<Duration> {
        Some(Duration::ZERO)
    }
}

/// Retry up to `max_attempts` attempts in total with exponential backoff
#[derive(Debug, Clone, Copy)]
pub struct Bounded {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Bounded {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }
}

impl RetryPolicy for Bounded {
    fn next_delay(&self, failed_attempts: u32) -> Option<Duration> {
        if failed_attempts >= self.max_attempts {
            return None;
        }
        let exp = failed_attempts.saturating_sub(1).min(16);
        Some(self.base_delay.saturating_mul(1 << exp))
    }
}
