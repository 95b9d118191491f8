//! Bounded retry for connection establishment and registration.
//!
//! Edge processes come up in arbitrary order relative to the broker, so
//! their first calls (consumer registration, producer connection checks)
//! retry on a fixed cadence before giving up. A multiplier above 1.0 turns
//! the fixed cadence into exponential backoff where that is wanted.
//!
//! # Example
//!
//! ```
//! use cyberday_runtime::retry::{retry_with_policy, RetryPolicy};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), String> {
//! let policy = RetryPolicy::fixed(5, Duration::from_secs(3));
//!
//! let value = retry_with_policy(policy, || async {
//!     Ok::<_, String>(42)
//! }).await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;
use tokio::time::sleep;

/// How many attempts to make and how long to wait between them.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. At least 1.
    pub max_attempts: usize,
    /// Delay before each re-attempt.
    pub delay: Duration,
    /// Delay growth factor; 1.0 keeps the cadence fixed.
    pub multiplier: f64,
    /// Upper bound on the grown delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// A fixed-cadence policy: `max_attempts` tries, `delay` apart.
    #[must_use]
    pub const fn fixed(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            multiplier: 1.0,
            max_delay: delay,
        }
    }

    /// An exponential policy starting at `delay` and capped at `max_delay`.
    #[must_use]
    pub const fn exponential(max_attempts: usize, delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            multiplier: 2.0,
            max_delay,
        }
    }

    /// Delay to apply after the given zero-based failed attempt.
    #[must_use]
    pub fn delay_after(&self, attempt: usize) -> Duration {
        if self.multiplier <= 1.0 || attempt == 0 {
            return self.delay;
        }
        let grown = self.delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        Duration::from_millis(grown as u64).min(self.max_delay)
    }
}

/// Run `operation` until it succeeds or the policy's attempts are exhausted.
///
/// # Errors
///
/// Returns the last error once `policy.max_attempts` attempts have failed.
pub async fn retry_with_policy<F, Fut, T, E>(policy: RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0usize;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(attempt, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => {
                attempt += 1;
                if attempt >= attempts {
                    tracing::error!(attempt, error = %err, "operation failed, attempts exhausted");
                    return Err(err);
                }
                let delay = policy.delay_after(attempt - 1);
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis(),
                    error = %err,
                    "operation failed, retrying"
                );
                sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn fixed_policy_keeps_cadence() {
        let policy = RetryPolicy::fixed(5, Duration::from_secs(3));
        assert_eq!(policy.delay_after(0), Duration::from_secs(3));
        assert_eq!(policy.delay_after(4), Duration::from_secs(3));
    }

    #[test]
    fn exponential_policy_grows_and_caps() {
        let policy =
            RetryPolicy::exponential(6, Duration::from_millis(100), Duration::from_secs(1));
        assert_eq!(policy.delay_after(0), Duration::from_millis(100));
        assert_eq!(policy.delay_after(1), Duration::from_millis(200));
        assert_eq!(policy.delay_after(5), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let policy = RetryPolicy::fixed(4, Duration::from_millis(5));
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&counter);

        let result = retry_with_policy(policy, || {
            let seen = Arc::clone(&seen);
            async move {
                if seen.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("not up yet".to_string())
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_attempts() {
        let policy = RetryPolicy::fixed(3, Duration::from_millis(1));
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&counter);

        let result: Result<i32, String> = retry_with_policy(policy, || {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Err("still down".to_string())
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }
}
