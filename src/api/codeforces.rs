//! Codeforces REST adapter.
//!
//! Codeforces wraps every response in a `{"status", "comment", "result"}`
//! envelope; `FAILED` with a comment is a definitive answer (bad handle,
//! bad contest), not an outage. Difficulty is derived from the problem's
//! rating since Codeforces has no Easy/Medium/Hard taxonomy of its own.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::cache::TtlCache;
use super::retry::{self, RetryPolicy};
use super::{ApiError, ApiResult, PlatformApi, Verification, classify_transport};
use crate::models::{Difficulty, ProblemMetadata};
use crate::normalize::{ContestRef, parse_codeforces};

const BASE_URL: &str = "https://codeforces.com/api";
const RECENT_LIMIT: u32 = 20;
const METADATA_TTL: Duration = Duration::from_secs(24 * 3600);

/// Problems with no published rating are treated as this.
const DEFAULT_RATING: u32 = 1000;
const EASY_MAX_RATING: u32 = 1200;
const MEDIUM_MAX_RATING: u32 = 1800;

pub fn difficulty_from_rating(rating: u32) -> Difficulty {
    if rating <= EASY_MAX_RATING {
        Difficulty::Easy
    } else if rating <= MEDIUM_MAX_RATING {
        Difficulty::Medium
    } else {
        Difficulty::Hard
    }
}

#[derive(Deserialize)]
struct Envelope {
    status: String,
    comment: Option<String>,
    result: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContestProblem {
    index: String,
    name: String,
    rating: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Standings {
    problems: Vec<ContestProblem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionProblem {
    contest_id: Option<u32>,
    index: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Submission {
    problem: SubmissionProblem,
    verdict: Option<String>,
    creation_time_seconds: i64,
}

/// Outcome of unwrapping the Codeforces envelope: either a result payload
/// or the API's own explanation of why there is none.
enum Unwrapped {
    Result(Value),
    Failed(String),
}

pub struct CodeforcesApi {
    client: Client,
    base_url: String,
    cache: TtlCache<String, ProblemMetadata>,
    retry: RetryPolicy,
}

impl Default for CodeforcesApi {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeforcesApi {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Point the adapter at a different endpoint root.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        CodeforcesApi {
            client: Client::new(),
            base_url: base_url.into(),
            cache: TtlCache::new(METADATA_TTL),
            retry: RetryPolicy::default(),
        }
    }

    async fn call(&self, url: &str) -> ApiResult<Unwrapped> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_transport)?;
        // Codeforces reports FAILED with a 400; read the envelope before
        // giving up on the status code.
        let status = response.status();
        let envelope: Envelope = match response.json().await {
            Ok(envelope) => envelope,
            // 5xx error pages from the CDN are HTML, not the envelope;
            // classify those by status so the retry loop sees them as
            // transient instead of a malformed response.
            Err(err) => return Err(shape_or_status(status.as_u16(), err.to_string())),
        };

        if envelope.status == "OK" {
            let result = envelope
                .result
                .ok_or_else(|| ApiError::Shape("OK response without result".into()))?;
            return Ok(Unwrapped::Result(result));
        }
        if envelope.status == "FAILED" {
            return Ok(Unwrapped::Failed(
                envelope.comment.unwrap_or_else(|| "request failed".into()),
            ));
        }
        if let Some(err) = classify_status_code(status.as_u16()) {
            return Err(err);
        }
        Err(ApiError::Shape(format!(
            "unexpected envelope status {:?}",
            envelope.status
        )))
    }

    async fn contest_problems(&self, contest: u32) -> ApiResult<Option<Vec<ContestProblem>>> {
        let url = format!(
            "{}/contest.standings?contestId={contest}&from=1&count=1",
            self.base_url
        );
        match retry::with_backoff(self.retry, "codeforces::contest_problems", || self.call(&url))
            .await?
        {
            Unwrapped::Result(value) => {
                let standings: Standings = serde_json::from_value(value)
                    .map_err(|err| ApiError::Shape(err.to_string()))?;
                Ok(Some(standings.problems))
            }
            Unwrapped::Failed(comment) => {
                log::debug!("[codeforces::contest_problems] contest {contest}: {comment}");
                Ok(None)
            }
        }
    }
}

fn classify_status_code(code: u16) -> Option<ApiError> {
    if code == 429 {
        Some(ApiError::RateLimited { retry_after: None })
    } else if code >= 400 {
        Some(ApiError::Status(code))
    } else {
        None
    }
}

/// An unparseable body on an error status is the status's fault; only on a
/// success status is it genuinely a malformed response.
fn shape_or_status(code: u16, detail: String) -> ApiError {
    classify_status_code(code).unwrap_or(ApiError::Shape(detail))
}

/// Whether one scanned submission counts as the claimed solve: verdict OK,
/// same problem, and not older than `max_age_secs`.
fn is_qualifying_solve(
    sub: &Submission,
    contest: u32,
    index: &str,
    now: i64,
    max_age_secs: i64,
) -> bool {
    sub.verdict.as_deref() == Some("OK")
        && sub.problem.contest_id == Some(contest)
        && sub.problem.index == index
        && now - sub.creation_time_seconds <= max_age_secs
}

#[async_trait]
impl PlatformApi for CodeforcesApi {
    async fn fetch_metadata(&self, id: &str) -> ApiResult<Option<ProblemMetadata>> {
        let Some(ContestRef { contest, index }) = parse_codeforces(id) else {
            return Ok(None);
        };

        if let Some(hit) = self.cache.get(&id.to_string()) {
            log::trace!("[codeforces::fetch_metadata] cache hit for {id}");
            return Ok(Some(hit));
        }

        let Some(problems) = self.contest_problems(contest).await? else {
            return Ok(None);
        };
        let Some(problem) = problems.iter().find(|p| p.index == index) else {
            return Ok(None);
        };

        let rating = problem.rating.unwrap_or(DEFAULT_RATING);
        let metadata = ProblemMetadata {
            title: format!("{contest}{index} - {}", problem.name),
            slug: id.to_string(),
            difficulty: difficulty_from_rating(rating),
            url: format!("https://codeforces.com/contest/{contest}/problem/{index}"),
        };
        self.cache.insert(id.to_string(), metadata.clone());
        Ok(Some(metadata))
    }

    async fn verify_recent_solve(
        &self,
        handle: &str,
        id: &str,
        window_minutes: u64,
    ) -> ApiResult<Verification> {
        let Some(ContestRef { contest, index }) = parse_codeforces(id) else {
            return Ok(Verification::NotVerified(format!(
                "`{id}` is not a valid Codeforces problem reference."
            )));
        };

        let url = format!(
            "{}/user.status?handle={handle}&from=1&count={RECENT_LIMIT}",
            self.base_url
        );
        let submissions = match retry::with_backoff(
            self.retry,
            "codeforces::verify_recent_solve",
            || self.call(&url),
        )
        .await?
        {
            Unwrapped::Result(value) => {
                let parsed: Vec<Submission> = serde_json::from_value(value)
                    .map_err(|err| ApiError::Shape(err.to_string()))?;
                parsed
            }
            Unwrapped::Failed(comment) => {
                log::debug!("[codeforces::verify_recent_solve] {handle}: {comment}");
                return Ok(Verification::NotVerified(format!(
                    "Codeforces handle `{handle}` was not found."
                )));
            }
        };

        let now = Utc::now().timestamp();
        let max_age = window_minutes as i64 * 60;
        let found = submissions
            .iter()
            .any(|sub| is_qualifying_solve(sub, contest, &index, now, max_age));

        if found {
            Ok(Verification::Verified)
        } else {
            Ok(Verification::NotVerified(format!(
                "No accepted submission for `{id}` in the last {} hours.",
                window_minutes / 60
            )))
        }
    }
}
