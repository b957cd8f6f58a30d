//! One retry-with-backoff helper shared by every adapter, instead of each
//! adapter growing its own loop.

use std::future::Future;
use std::time::Duration;

use super::{ApiError, ApiResult};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Run `operation` until it succeeds, fails non-retryably, or attempts run
/// out. The delay doubles each attempt; a server-supplied Retry-After hint
/// overrides the computed delay for that attempt.
///
/// Sleeps are task-local and never block other tasks.
pub async fn with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    op_name: &str,
    mut operation: F,
) -> ApiResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    let mut delay = policy.base_delay;
    let mut last_err: Option<ApiError> = None;

    for attempt in 1..=policy.max_attempts.max(1) {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.retryable() && attempt < policy.max_attempts => {
                let wait = err.retry_hint().unwrap_or(delay);
                log::warn!(
                    "[{op_name}] attempt {attempt}/{} failed ({err}), retrying in {:?}",
                    policy.max_attempts,
                    wait
                );
                tokio::time::sleep(wait).await;
                delay *= 2;
                last_err = Some(err);
            }
            Err(err) => {
                if err.retryable() {
                    log::warn!("[{op_name}] giving up after {attempt} attempts: {err}");
                } else {
                    log::debug!("[{op_name}] non-retryable failure: {err}");
                }
                return Err(err);
            }
        }
    }

    // Only reachable with max_attempts == 0 clamped to 1 above, but keep the
    // compiler satisfied without panicking.
    Err(last_err.unwrap_or(ApiError::Timeout))
}
