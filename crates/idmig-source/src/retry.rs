//! Resilient-call wrapper with capped exponential backoff.
//!
//! Timeouts and rate limits are retried after sleeping `base^attempt`
//! seconds; every other error is returned on first sight. After
//! `max_attempts` calls the wrapper gives up with
//! [`RemoteError::RetryExhausted`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use idmig_config::RetryConfig;
use idmig_core::RemoteError;

/// Backoff schedule for one logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Base of the exponential schedule, in seconds.
    pub base_secs: u64,
    /// Total calls allowed, the first one included.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_secs: 5,
            max_attempts: 4,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            base_secs: config.base_secs,
            max_attempts: config.max_attempts.max(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry that follows failed attempt `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.base_secs.saturating_pow(attempt))
    }
}

/// Suspension point used between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Run `call` until it succeeds, fails permanently, or runs out of attempts.
///
/// `label` names the request in log events.
///
/// # Errors
///
/// Returns the first non-retryable error unchanged, or
/// [`RemoteError::RetryExhausted`] once `policy.max_attempts` calls have
/// failed with retryable errors.
pub async fn with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    label: &str,
    mut call: F,
) -> Result<T, RemoteError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    let mut attempt: u32 = 1;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() => {
                if attempt >= policy.max_attempts {
                    tracing::error!(label, attempts = attempt, %err, "retries exhausted");
                    return Err(RemoteError::RetryExhausted {
                        attempts: attempt,
                        last: err.to_string(),
                    });
                }
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    label,
                    attempt,
                    delay_secs = delay.as_secs(),
                    %err,
                    "retrying after backoff"
                );
                sleeper.sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
