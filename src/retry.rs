use std::{future::Future, time::Duration};

use crate::{debug, error::SyncError};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first call
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub base_delay: Duration,
    /// Maximum delay cap
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryConfig {
    /// A config that retries immediately, for tests.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (0-indexed).
    ///
    /// A `Retry-After` hint larger than the exponential delay wins, and both are
    /// capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<u64>) -> Duration {
        let backoff = self
            .base_delay
            .saturating_mul(2_u32.saturating_pow(attempt));
        let hinted = retry_after.map(Duration::from_secs).unwrap_or(Duration::ZERO);
        backoff.max(hinted).min(self.max_delay)
    }
}

/// Executes an async operation, retrying transient errors with exponential backoff.
///
/// Non-transient errors are returned on the first occurrence. When all retries are
/// used up the last transient error is returned; callers decide whether that is a
/// fatal fetch error or a failed batch.
pub async fn retry_with_backoff<T, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, SyncError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SyncError>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) if err.is_transient() && attempt < config.max_retries => {
                let delay = config.delay_for(attempt, err.retry_after());
                debug!(
                    "{} failed ({}). Retry {} of {} in {:?}",
                    operation_name,
                    err,
                    attempt + 1,
                    config.max_retries,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
