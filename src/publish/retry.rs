//! publish::retry
//!
//! Explicit retry policy for remote operations.
//!
//! A [`RetryPolicy`] is a plain value handed to whoever pushes. It holds
//! the attempt budget, an exponential backoff schedule capped at
//! `max_backoff`, and a predicate deciding which failures are worth another
//! attempt. There is no shared scheduling state between calls.

use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::core::config::PushConfig;
use crate::git::{Diagnostic, GitError};

/// Default number of attempts, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(1000);

/// Default upper bound on any single delay.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_millis(10_000);

/// How often and how patiently to retry a failing operation.
///
/// # Example
///
/// ```
/// use proposer::publish::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(4, Duration::from_millis(100), Duration::from_millis(250));
/// assert_eq!(policy.delay_for(1), Duration::from_millis(100));
/// assert_eq!(policy.delay_for(2), Duration::from_millis(200));
/// assert_eq!(policy.delay_for(3), Duration::from_millis(250));
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first. At least 1.
    pub max_attempts: u32,
    /// Delay after the first failure.
    pub initial_backoff: Duration,
    /// Cap on any single delay.
    pub max_backoff: Duration,
    /// Which failures are retried.
    pub retryable: fn(&GitError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_ATTEMPTS,
            DEFAULT_INITIAL_BACKOFF,
            DEFAULT_MAX_BACKOFF,
        )
    }
}

impl RetryPolicy {
    /// A policy retrying transient network failures.
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff,
            retryable: is_transient,
        }
    }

    /// A policy that tries exactly once.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Replace the retryable-error predicate.
    pub fn with_predicate(mut self, retryable: fn(&GitError) -> bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Build from the `[push]` configuration table.
    pub fn from_config(config: &PushConfig) -> Self {
        Self::new(
            config.max_attempts(),
            Duration::from_millis(config.initial_backoff_ms()),
            Duration::from_millis(config.max_backoff_ms()),
        )
    }

    /// Delay after failed attempt number `attempt` (1-based).
    ///
    /// Doubles from `initial_backoff` and never exceeds `max_backoff`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial_backoff
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent.
    ///
    /// `operation` receives the 1-based attempt number. On failure the
    /// returned pair is the last error and how many attempts were made.
    pub fn run<T>(
        &self,
        mut operation: impl FnMut(u32) -> Result<T, GitError>,
    ) -> Result<T, (GitError, u32)> {
        let mut attempt = 1;
        loop {
            match operation(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && (self.retryable)(&e) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        ?delay,
                        error = %e,
                        "retrying"
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err((e, attempt)),
            }
        }
    }
}

/// Whether `error` looks like a network failure that may succeed later.
pub fn is_transient(error: &GitError) -> bool {
    error
        .stderr()
        .is_some_and(|stderr| Diagnostic::TransientNetwork.matches_message(stderr))
}
