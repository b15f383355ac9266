//! Retry logic with exponential backoff and optional jitter.
//!
//! One [`RetryPolicy`] is injected per call site; the loop itself lives in
//! [`retry_async_if`] and only retries errors the caller marks as transient.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Backoff schedule for a remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one (minimum 1).
    pub max_attempts: u32,

    /// Delay after the first failed attempt.
    pub initial_delay: Duration,

    /// Multiplier for exponential backoff (e.g., 2.0 = double each time).
    pub backoff_multiplier: f64,

    /// Maximum delay between attempts.
    pub max_delay: Duration,

    /// Whether to add up to 25% jitter to delays.
    pub jitter: bool,
}

impl RetryPolicy {
    /// Backlog grooming: 3 attempts, waiting 2s then 4s.
    pub fn groomer() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(64),
            jitter: false,
        }
    }

    /// Feedback clustering: same schedule as grooming.
    pub fn analyst() -> Self {
        Self::groomer()
    }

    /// Roadmap planning: 5 attempts, waiting 4s, 8s, 16s, 32s.
    pub fn strategist() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(4),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(64),
            jitter: false,
        }
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base_delay = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32 - 1);
        let capped_delay = base_delay.min(self.max_delay.as_millis() as f64);

        let final_delay = if self.jitter {
            let jitter_factor = 1.0 + (rand_jitter() * 0.25);
            capped_delay * jitter_factor
        } else {
            capped_delay
        };

        Duration::from_millis(final_delay as u64)
    }

    /// The full list of delays a persistently failing call would wait through.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.attempts()).map(|attempt| self.delay_after(attempt)).collect()
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Simple pseudo-random jitter (0.0 to 1.0) without external deps.
fn rand_jitter() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos % 1000) as f64 / 1000.0
}

/// Result of a retry operation.
#[derive(Debug)]
pub struct RetryResult<T, E> {
    /// The final result (success or last error).
    pub result: Result<T, E>,

    /// Number of attempts made.
    pub attempts: u32,

    /// Total time spent (including delays).
    pub total_time: Duration,

    /// Whether the operation was retried.
    pub was_retried: bool,
}

impl<T, E> RetryResult<T, E> {
    /// Get the result.
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Retry an async operation while `is_retryable` accepts its error.
///
/// Errors the predicate rejects are returned after the attempt that raised
/// them. Delays use `tokio::time::sleep` so concurrent callers keep running.
pub async fn retry_async_if<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    mut operation: F,
    is_retryable: P,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let start = tokio::time::Instant::now();
    let max_attempts = policy.attempts();
    let mut attempts = 0;

    loop {
        attempts += 1;
        let result = operation().await;

        let retry = match &result {
            Ok(_) => false,
            Err(e) => attempts < max_attempts && is_retryable(e),
        };

        if !retry {
            return RetryResult {
                result,
                attempts,
                total_time: start.elapsed(),
                was_retried: attempts > 1,
            };
        }

        let delay = policy.delay_after(attempts);
        if let Err(e) = &result {
            tracing::warn!(
                attempt = attempts,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %e,
                "Transient failure, backing off"
            );
        }
        tokio::time::sleep(delay).await;
    }
}
