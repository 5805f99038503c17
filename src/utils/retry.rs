//! Retry policy: bounded exponential backoff owned by the caller.
//!
//! Uses `backon` for exponential backoff with jitter. The policy is built
//! from configuration at startup and passed to whatever needs to retry;
//! no attempt counters live in process-wide state.

use std::time::Duration;

use backon::ExponentialBuilder;

use crate::config::ConnectRetryConfig;

/// Bounded exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Minimum 1.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub min_delay: Duration,
    /// Delay cap.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            min_delay,
            max_delay: max_delay.max(min_delay),
        }
    }

    /// Single attempt, no retries.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Number of retries after the first attempt.
    pub fn retries(&self) -> usize {
        self.max_attempts.saturating_sub(1) as usize
    }

    /// Backoff builder for `backon::Retryable::retry`.
    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.retries())
            .with_jitter()
    }
}

impl From<&ConnectRetryConfig> for RetryPolicy {
    fn from(config: &ConnectRetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.min_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }
}

/// Backoff for best-effort calls to the logger collaborator.
///
/// - Min delay: 50ms
/// - Max delay: 500ms
/// - Max attempts: 3
pub fn notify_backoff() -> ExponentialBuilder {
    RetryPolicy::new(3, Duration::from_millis(50), Duration::from_millis(500)).backoff()
}
