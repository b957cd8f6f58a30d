//! Direct LeetCode GraphQL adapter (the primary metadata/verification source).

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::cache::TtlCache;
use super::retry::{self, RetryPolicy};
use super::{ApiError, ApiResult, PlatformApi, Verification, classify_status, classify_transport};
use crate::models::{Difficulty, ProblemMetadata};

const GRAPHQL_ENDPOINT: &str = "https://leetcode.com/graphql";
const QUESTION_QUERY: &str = include_str!("leetcode/question.graphql");
const RECENT_QUERY: &str = include_str!("leetcode/recent.graphql");

/// How many recent submissions to scan for a match.
const RECENT_LIMIT: u32 = 20;
const METADATA_TTL: Duration = Duration::from_secs(24 * 3600);

#[derive(Serialize)]
struct RequestBody {
    query: String,
    variables: Value,
}

#[derive(Deserialize)]
struct QueryResponse {
    data: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Question {
    title: String,
    title_slug: String,
    difficulty: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecentSubmission {
    title_slug: String,
    timestamp: String,
    status_display: String,
}

/// Whether one scanned submission counts as the claimed solve: Accepted,
/// same slug, and a parseable timestamp no older than `max_age_secs`.
fn is_qualifying_solve(sub: &RecentSubmission, slug: &str, now: i64, max_age_secs: i64) -> bool {
    sub.status_display == "Accepted"
        && sub.title_slug == slug
        && sub
            .timestamp
            .parse::<i64>()
            .map(|ts| now - ts <= max_age_secs)
            .unwrap_or(false)
}

pub struct LeetCodeApi {
    client: Client,
    endpoint: String,
    cache: TtlCache<String, ProblemMetadata>,
    retry: RetryPolicy,
}

impl Default for LeetCodeApi {
    fn default() -> Self {
        Self::new()
    }
}

impl LeetCodeApi {
    pub fn new() -> Self {
        LeetCodeApi {
            client: Client::new(),
            endpoint: GRAPHQL_ENDPOINT.to_string(),
            cache: TtlCache::new(METADATA_TTL),
            retry: RetryPolicy::default(),
        }
    }

    fn headers() -> HeaderMap {
        HeaderMap::from_iter([
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (
                HeaderName::from_static("referer"),
                HeaderValue::from_static("https://leetcode.com"),
            ),
        ])
    }

    /// Run one GraphQL query and unwrap the `data` envelope.
    async fn graphql(&self, query: &str, variables: Value) -> ApiResult<Value> {
        let body = RequestBody {
            query: query.to_string(),
            variables,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .headers(Self::headers())
            .json(&body)
            .send()
            .await
            .map_err(classify_transport)?;

        if let Some(err) = classify_status(&response) {
            return Err(err);
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|err| ApiError::Shape(err.to_string()))?;
        parsed
            .data
            .ok_or_else(|| ApiError::Shape("no data in graphql response".into()))
    }
}

#[async_trait]
impl PlatformApi for LeetCodeApi {
    async fn fetch_metadata(&self, id: &str) -> ApiResult<Option<ProblemMetadata>> {
        if let Some(hit) = self.cache.get(&id.to_string()) {
            log::trace!("[leetcode::fetch_metadata] cache hit for {id}");
            return Ok(Some(hit));
        }

        let slug = id.to_string();
        let data = retry::with_backoff(self.retry, "leetcode::fetch_metadata", || {
            self.graphql(QUESTION_QUERY, serde_json::json!({ "titleSlug": slug }))
        })
        .await?;

        let question = data
            .get("question")
            .ok_or_else(|| ApiError::Shape("missing question field".into()))?;
        if question.is_null() {
            // Valid answer: no such problem.
            return Ok(None);
        }

        let question: Question = serde_json::from_value(question.clone())
            .map_err(|err| ApiError::Shape(err.to_string()))?;
        let difficulty = Difficulty::parse(&question.difficulty).ok_or_else(|| {
            ApiError::Shape(format!("unknown difficulty {:?}", question.difficulty))
        })?;

        let metadata = ProblemMetadata {
            url: format!("https://leetcode.com/problems/{}/", question.title_slug),
            title: question.title,
            slug: question.title_slug,
            difficulty,
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
        let data = retry::with_backoff(self.retry, "leetcode::verify_recent_solve", || {
            self.graphql(
                RECENT_QUERY,
                serde_json::json!({ "username": handle, "limit": RECENT_LIMIT }),
            )
        })
        .await?;

        let list = data
            .get("recentSubmissionList")
            .ok_or_else(|| ApiError::Shape("missing recentSubmissionList".into()))?;
        if list.is_null() {
            return Ok(Verification::NotVerified(format!(
                "LeetCode user `{handle}` not found or has a private profile."
            )));
        }

        let submissions: Vec<RecentSubmission> = serde_json::from_value(list.clone())
            .map_err(|err| ApiError::Shape(err.to_string()))?;

        let now = Utc::now().timestamp();
        let max_age = window_minutes as i64 * 60;
        let found = submissions
            .iter()
            .any(|sub| is_qualifying_solve(sub, id, now, max_age));

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

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(status: &str, slug: &str, timestamp: &str) -> RecentSubmission {
        RecentSubmission {
            title_slug: slug.to_string(),
            timestamp: timestamp.to_string(),
            status_display: status.to_string(),
        }
    }

    #[test]
    fn solve_on_the_window_edge_qualifies() {
        let now = 1_000_000;
        let max_age = 24 * 3600;
        let sub = submission("Accepted", "two-sum", &(now - max_age).to_string());
        assert!(is_qualifying_solve(&sub, "two-sum", now, max_age));
    }

    #[test]
    fn solve_one_second_past_the_window_does_not_qualify() {
        let now = 1_000_000;
        let max_age = 24 * 3600;
        let sub = submission("Accepted", "two-sum", &(now - max_age - 1).to_string());
        assert!(!is_qualifying_solve(&sub, "two-sum", now, max_age));
    }

    #[test]
    fn rejected_runs_and_other_slugs_do_not_qualify() {
        let now = 1_000_000;
        let max_age = 24 * 3600;
        let ts = now.to_string();
        assert!(!is_qualifying_solve(
            &submission("Wrong Answer", "two-sum", &ts),
            "two-sum",
            now,
            max_age
        ));
        assert!(!is_qualifying_solve(
            &submission("Accepted", "three-sum", &ts),
            "two-sum",
            now,
            max_age
        ));
    }

    #[test]
    fn unparseable_timestamp_does_not_qualify() {
        let sub = submission("Accepted", "two-sum", "not-a-number");
        assert!(!is_qualifying_solve(&sub, "two-sum", 1_000_000, 24 * 3600));
    }
}
