//! Bounded retry with exponential backoff around a single strategy call.
//!
//! Only failures classified as retryable (see [`crate::classify`]) are retried.
//! Blocking and fatal failures return immediately without consuming the rest
//! of the budget. Escalating to a different strategy is the orchestrator's job,
//! never this module's.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::error::{ClassifiedError, ExtractError};
use crate::strategy::{Strategy, StrategyMeta, StrategyResult};
use crate::types::Phase;

/// Retry budget for one strategy call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Always at least 1.
    pub max_attempts: u32,
    /// Base of the backoff: the wait after failed attempt `n` (0-based) is
    /// `backoff_base * 2^(n+1)`.
    pub backoff_base: Duration,
    /// Per-attempt deadline. An elapsed deadline is a retryable timeout.
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
            attempt_timeout: None,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
            attempt_timeout: None,
        }
    }

    #[must_use]
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Delay to wait after the failed attempt `attempt` (0-based).
    ///
    /// # Backoff schedule (`backoff_base` = 1s)
    ///
    /// | Failed attempt | Sleep before next attempt |
    /// |---|---|
    /// | 0 | 2 s |
    /// | 1 | 4 s |
    /// | 2 | 8 s |
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32 << (attempt + 1).min(20);
        self.backoff_base.saturating_mul(factor)
    }
}

/// Outcome of [`retry_with_backoff`]: the final result plus how many attempts ran.
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub result: Result<T, ClassifiedError>,
    pub attempts: u32,
}

/// Executes `operation` with exponential backoff retries on retryable failures.
///
/// On success the result is returned immediately. A retryable failure with
/// attempts remaining sleeps for [`RetryPolicy::delay_after`] and tries again.
/// Blocking and fatal failures, or a retryable failure on the last attempt,
/// are returned as-is with their classification.
///
/// `timeout_phase` labels the error produced when the per-attempt deadline
/// elapses.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    timeout_phase: Phase,
    mut operation: F,
) -> RetryOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClassifiedError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        let result = match policy.attempt_timeout {
            Some(deadline) => match tokio::time::timeout(deadline, operation()).await {
                Ok(result) => result,
                Err(_) => Err(ClassifiedError::new(
                    timeout_phase,
                    ExtractError::Timeout {
                        after_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                    },
                )),
            },
            None => operation().await,
        };

        match result {
            Ok(value) => {
                return RetryOutcome {
                    result: Ok(value),
                    attempts: attempt + 1,
                }
            }
            Err(err) => {
                if !err.is_retryable() || attempt + 1 >= max_attempts {
                    return RetryOutcome {
                        result: Err(err),
                        attempts: attempt + 1,
                    };
                }
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_secs = delay.as_secs_f64(),
                    classification = %err.classification,
                    error = %err,
                    "transient extraction error, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Runs one strategy under the retry policy and packages a [`StrategyResult`].
pub async fn run_strategy(
    strategy: &dyn Strategy,
    url: &reqwest::Url,
    policy: &RetryPolicy,
) -> StrategyResult {
    let started = Instant::now();
    let outcome = retry_with_backoff(policy, strategy.entry_phase(), || strategy.attempt(url)).await;
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let retry_count = outcome.attempts.saturating_sub(1);

    match outcome.result {
        Ok(extraction) => StrategyResult {
            meta: StrategyMeta {
                method: Some(extraction.method),
                phase: extraction.phase,
                confidence: extraction.product.confidence,
                duration_ms,
                retry_count,
                notes: extraction.notes,
            },
            outcome: Ok(extraction.product),
        },
        Err(err) => StrategyResult {
            meta: StrategyMeta {
                method: None,
                phase: err.phase,
                confidence: 0,
                duration_ms,
                retry_count,
                notes: Vec::new(),
            },
            outcome: Err(err),
        },
    }
}
