use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::core::ads::AdsError;

/// Bounded retry settings for quota errors.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one. `2` means "retry once".
    pub max_attempts: u32,
    /// Backoff before each retry; the last entry is reused if there are more
    /// retries than entries.
    pub backoff: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: vec![Duration::from_secs(60)],
        }
    }
}

impl RetryPolicy {
    pub fn once_after(backoff: Duration) -> Self {
        Self {
            max_attempts: 2,
            backoff: vec![backoff],
        }
    }

    /// Backoff before retry number `retry` (1-based).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let index = retry.saturating_sub(1) as usize;
        self.backoff
            .get(index)
            .or_else(|| self.backoff.last())
            .copied()
            .unwrap_or_default()
    }
}

/// Run `call`, retrying only on quota errors, up to `policy.max_attempts`.
///
/// Any other error returns straight away. The error from the final attempt is
/// what the caller sees.
pub async fn with_quota_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut call: F,
) -> Result<T, AdsError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AdsError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retriable() && attempt < max_attempts => {
                let wait = policy.backoff_for(attempt);
                tracing::warn!(
                    operation,
                    attempt,
                    wait_secs = wait.as_secs(),
                    "Quota exceeded, backing off before retry: {}",
                    err
                );
                sleep(wait).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
