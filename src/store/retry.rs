//! Retry policy for transient lock contention

use std::time::Duration;

use super::error::StoreError;

/// How many times a transaction body is attempted and how long to wait between
/// attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one (at least 1)
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Decides whether an error is worth another attempt
    pub retryable: fn(&StoreError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(1),
            retryable: StoreError::is_lock_contention,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max.max(initial);
        self
    }

    /// No waiting between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts).with_backoff(Duration::ZERO, Duration::ZERO)
    }

    pub fn is_retryable(&self, err: &StoreError) -> bool {
        (self.retryable)(err)
    }

    /// Delay before attempt `attempt + 1`, doubling per failed attempt
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }
}
