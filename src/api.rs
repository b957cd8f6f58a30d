//! Platform verification adapters.
//!
//! Every platform exposes the same two capabilities through [`PlatformApi`]:
//! resolve a problem identifier to canonical metadata, and check whether a
//! handle has a recent accepted solve for it. The pipeline only ever talks
//! to this trait, so adapters are swappable for test doubles.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::ProblemMetadata;

pub mod alfa;
pub mod cache;
pub mod codeforces;
pub mod fallback;
pub mod gfg;
pub mod leetcode;
pub mod retry;

/// Fault talking to a platform API. Expected negative answers (problem not
/// found, no matching solve) are *not* errors; they are ordinary returns on
/// the capability methods.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(reqwest::Error),

    #[error("unexpected response shape: {0}")]
    Shape(String),
}

impl ApiError {
    /// Whether retrying the same request can plausibly succeed.
    /// 5xx, timeouts, and rate limits are transient; other 4xx mean the
    /// request itself is wrong and retrying cannot help.
    pub fn retryable(&self) -> bool {
        match self {
            ApiError::Status(code) => *code >= 500,
            ApiError::RateLimited { .. } | ApiError::Timeout => true,
            ApiError::Transport(err) => err.is_connect() || err.is_timeout(),
            ApiError::Shape(_) => false,
        }
    }

    /// Server-supplied backoff hint, if any.
    pub fn retry_hint(&self) -> Option<Duration> {
        match self {
            ApiError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

pub(crate) fn classify_transport(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Transport(err)
    }
}

/// Map a non-success HTTP response to the right error class, pulling the
/// Retry-After hint when the server sent one.
pub(crate) fn classify_status(response: &reqwest::Response) -> Option<ApiError> {
    let status = response.status();
    if status.is_success() {
        return None;
    }
    if status.as_u16() == 429 {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);
        return Some(ApiError::RateLimited { retry_after });
    }
    Some(ApiError::Status(status.as_u16()))
}

/// Outcome of a recent-solve check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Platform confirmed an accepted solve inside the window.
    Verified,
    /// Platform answered, but no qualifying solve was found.
    NotVerified(String),
    /// Accepted on trust; no confirmation exists or was reachable.
    Trusted,
}

impl Verification {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verification::Verified | Verification::Trusted)
    }
}

/// The per-platform capability contract.
///
/// `fetch_metadata` returning `Ok(None)` means the identifier does not
/// resolve on the platform; that is a valid outcome, not a fault.
/// Metadata may be served from a cache; verification results never are.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    async fn fetch_metadata(&self, id: &str) -> ApiResult<Option<ProblemMetadata>>;

    async fn verify_recent_solve(
        &self,
        handle: &str,
        id: &str,
        window_minutes: u64,
    ) -> ApiResult<Verification>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        assert!(ApiError::Status(500).retryable());
        assert!(ApiError::Status(503).retryable());
        assert!(ApiError::Timeout.retryable());
        assert!(ApiError::RateLimited { retry_after: None }.retryable());
    }

    #[test]
    fn client_errors_are_not_retryable() {
        assert!(!ApiError::Status(400).retryable());
        assert!(!ApiError::Status(404).retryable());
        assert!(!ApiError::Shape("missing field".into()).retryable());
    }

    #[test]
    fn rate_limit_hint_passes_through() {
        let err = ApiError::RateLimited {
            retry_after: Some(Duration::from_secs(7)),
        };
        assert_eq!(err.retry_hint(), Some(Duration::from_secs(7)));
        assert_eq!(ApiError::Status(502).retry_hint(), None);
    }
}
