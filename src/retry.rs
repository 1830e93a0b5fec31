//! Retry logic with exponential backoff and jitter.
//!
//! [`Retrier`] knows nothing about AWS. It only asks the error it got back
//! whether it is retryable; what counts as retryable is decided upstream by
//! an [`ErrorClassifier`](crate::sagemaker::errors::ErrorClassifier).

use crate::sagemaker::errors::ClassifiedError;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Immutable retry policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, including the first one. At least 1.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
    /// Growth factor between consecutive delays. Greater than 1.
    pub backoff_multiplier: f64,
    /// Randomize delays to spread out concurrent retries.
    pub jitter: bool,
}

/// The process-wide default policy.
pub static DEFAULT_RETRY_CONFIG: RetryConfig = RetryConfig {
    max_attempts: 3,
    initial_backoff: Duration::from_millis(100),
    max_backoff: Duration::from_secs(5),
    backoff_multiplier: 2.0,
    jitter: true,
};

impl Default for RetryConfig {
    fn default() -> Self {
        DEFAULT_RETRY_CONFIG
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RetryConfigError {
    #[error("max_attempts must be at least 1")]
    NoAttempts,
    #[error("backoff_multiplier must be greater than 1, got {0}")]
    Multiplier(f64),
    #[error("max_backoff ({max:?}) is shorter than initial_backoff ({initial:?})")]
    Bounds { initial: Duration, max: Duration },
}

impl RetryConfig {
    /// Check the policy invariants.
    pub fn validate(&self) -> Result<(), RetryConfigError> {
        if self.max_attempts == 0 {
            return Err(RetryConfigError::NoAttempts);
        }
        if !(self.backoff_multiplier > 1.0) {
            return Err(RetryConfigError::Multiplier(self.backoff_multiplier));
        }
        if self.max_backoff < self.initial_backoff {
            return Err(RetryConfigError::Bounds {
                initial: self.initial_backoff,
                max: self.max_backoff,
            });
        }
        Ok(())
    }

    /// Calculate the delay that follows failed attempt number `attempt` (1-based).
    ///
    /// The delay is `initial_backoff * backoff_multiplier^(attempt-1)`, capped
    /// at `max_backoff`. With jitter the result lands uniformly in
    /// `[delay/2, delay]`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let seconds = self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let capped = if seconds.is_finite() {
            seconds.min(self.max_backoff.as_secs_f64())
        } else {
            self.max_backoff.as_secs_f64()
        };
        let delay = Duration::from_secs_f64(capped.max(0.0));

        if !self.jitter {
            return delay;
        }

        let half_ms = (delay.as_millis() / 2) as u64;
        let spread = fastrand::u64(0..=half_ms);
        Duration::from_millis(delay.as_millis() as u64 - half_ms + spread)
    }
}

/// Runs an idempotent operation under a [`RetryConfig`].
#[derive(Debug, Clone, Copy)]
pub struct Retrier {
    config: RetryConfig,
}

impl Retrier {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute `operation` until it succeeds, fails with a non-retryable
    /// error, or runs out of attempts.
    ///
    /// Both the in-flight call and the backoff sleep race `cancel`; a
    /// cancelled token wins immediately with [`ClassifiedError::Cancelled`].
    /// Running out of attempts wraps the last error in
    /// [`ClassifiedError::RetriesExhausted`].
    pub async fn run<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T, ClassifiedError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ClassifiedError>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClassifiedError::Cancelled),
                outcome = operation() => outcome,
            };

            let err = match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!("Succeeded on attempt {}/{}", attempt, max_attempts);
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !err.is_retryable() {
                tracing::debug!("Attempt {} failed, not retryable: {}", attempt, err);
                return Err(err);
            }

            if attempt >= max_attempts {
                tracing::warn!("Giving up after {} attempts: {}", attempt, err);
                return Err(ClassifiedError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let delay = self.config.delay_for_attempt(attempt);
            tracing::warn!(
                "Attempt {}/{} failed: {}, retrying in {:?}",
                attempt,
                max_attempts,
                err,
                delay
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClassifiedError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
