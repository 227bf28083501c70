use super::error::SynthesisError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Timeout, attempt budget and backoff shape for one provider call
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub timeout: Duration,
    pub backoff_base: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            timeout: Duration::from_secs(45),
            backoff_base: Duration::from_secs(1),
            max_jitter: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// `backoff_base * 2^attempt` plus up to `max_jitter` of random delay
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponential = self.backoff_base.saturating_mul(2u32.saturating_pow(attempt));
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms > 0 {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        } else {
            Duration::ZERO
        };
        exponential + jitter
    }
}

/// Run one provider call with timeout racing and exponential backoff.
///
/// `on_rate_limit` fires every time a rate-limit response is observed, even
/// when the call is retried afterwards. Cancellation wins over everything:
/// it is checked before each attempt, raced against the in-flight call and
/// against the backoff sleep, and always surfaces as `Aborted`.
pub async fn with_retry<T, F, Fut, R>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    on_rate_limit: R,
    mut task: F,
) -> Result<T, SynthesisError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SynthesisError>>,
    R: Fn(),
{
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(SynthesisError::Aborted);
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SynthesisError::Aborted),
            result = tokio::time::timeout(policy.timeout, task()) => {
                result.unwrap_or(Err(SynthesisError::Timeout))
            }
        };

        let error = match outcome {
            Ok(value) => return Ok(value),
            Err(SynthesisError::Aborted) => return Err(SynthesisError::Aborted),
            Err(error) => error,
        };

        if error.is_rate_limit() {
            on_rate_limit();
        }

        attempt += 1;
        if !error.is_retryable() || attempt >= policy.max_attempts {
            tracing::warn!(
                error = %error,
                attempts = attempt,
                retryable = error.is_retryable(),
                "Provider call failed, giving up"
            );
            return Err(error);
        }

        let delay = policy.backoff_delay(attempt - 1);
        tracing::debug!(
            error = %error,
            attempt = attempt,
            delay_ms = delay.as_millis(),
            "Retrying provider call after backoff"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SynthesisError::Aborted),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
