//! Bounded retries with a caller-supplied retryable/fatal predicate.
//!
//! Every attempt is awaited in sequence. A retryable failure is logged and
//! followed by an exponential backoff; a fatal failure ends the loop at once.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

/// How many times to try an operation and how long to wait in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one. Zero behaves as one.
    pub max_attempts: usize,
    /// Delay before the second attempt; doubled for every further attempt.
    pub base_delay: Duration,
    /// Upper bound for a single backoff.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Policy with `max_attempts` attempts and no waiting between them.
    ///
    /// ```
    /// use scout_common::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::immediate(3);
    /// assert_eq!(policy.max_attempts, 3);
    /// assert_eq!(policy.backoff(2), Duration::ZERO);
    /// ```
    pub fn immediate(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn with_max_attempts(mut self, n: usize) -> Self {
        self.max_attempts = n;
        self
    }

    /// Backoff to apply after the given (1-based) failed attempt.
    pub fn backoff(&self, failed_attempt: usize) -> Duration {
        let shift = failed_attempt.saturating_sub(1).min(16) as u32;
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }

    fn attempts(&self) -> usize {
        self.max_attempts.max(1)
    }
}

/// Why [`retry_bounded`] gave up.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: usize, last: E },

    /// An attempt failed with an error the predicate marked as fatal.
    #[error("fatal error on attempt {attempt}: {error}")]
    Fatal { attempt: usize, error: E },
}

impl<E> RetryError<E> {
    /// Number of attempts made before giving up.
    pub fn attempts(&self) -> usize {
        match self {
            Self::Exhausted { attempts, .. } => *attempts,
            Self::Fatal { attempt, .. } => *attempt,
        }
    }

    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { last, .. } => last,
            Self::Fatal { error, .. } => error,
        }
    }
}

/// Run `op` until it succeeds, fails fatally, or the attempt budget is spent.
///
/// `op` receives the 1-based attempt number. `is_retryable` decides whether a
/// failure is worth another attempt.
///
/// ```
/// use scout_common::{retry_bounded, RetryError, RetryPolicy};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let out: Result<u32, RetryError<String>> = retry_bounded(
///     &RetryPolicy::immediate(3),
///     "demo",
///     |attempt| async move {
///         if attempt < 3 { Err(format!("boom {attempt}")) } else { Ok(7) }
///     },
///     |_err| true,
/// )
/// .await;
/// assert_eq!(out.unwrap(), 7);
/// # }
/// ```
pub async fn retry_bounded<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
    is_retryable: P,
) -> Result<T, RetryError<E>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let max_attempts = policy.attempts();
    let mut attempt = 0usize;

    loop {
        attempt += 1;
        let err = match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(label, attempt, "retry.recovered");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !is_retryable(&err) {
            tracing::warn!(label, attempt, error = %err, "retry.fatal");
            return Err(RetryError::Fatal {
                attempt,
                error: err,
            });
        }

        if attempt >= max_attempts {
            tracing::warn!(label, attempt, max_attempts, error = %err, "retry.exhausted");
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: err,
            });
        }

        let delay = policy.backoff(attempt);
        tracing::warn!(
            label,
            attempt,
            max_attempts,
            backoff_ms = delay.as_millis() as u64,
            error = %err,
            "Attempt {attempt} failed"
        );
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }
}
