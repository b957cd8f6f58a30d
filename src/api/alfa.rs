//! Secondary LeetCode source: the alfa-leetcode-api proxy.
//!
//! Serves the same data as the direct GraphQL endpoint but with REST paths
//! and different field names, so responses are mapped into the shared
//! [`ProblemMetadata`] shape here.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::cache::TtlCache;
use super::retry::{self, RetryPolicy};
use super::{ApiError, ApiResult, PlatformApi, Verification, classify_status, classify_transport};
use crate::models::{Difficulty, ProblemMetadata};

const BASE_URL: &str = "https://alfa-leetcode-api.onrender.com";
const RECENT_LIMIT: u32 = 20;
const METADATA_TTL: Duration = Duration::from_secs(24 * 3600);

#[derive(Deserialize)]
struct SelectResponse {
    // The proxy names the title field differently from the upstream API.
    #[serde(rename = "questionTitle")]
    question_title: Option<String>,
    #[serde(rename = "titleSlug")]
    title_slug: Option<String>,
    difficulty: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AcSubmission {
    title_slug: String,
    timestamp: Option<String>,
}

/// Whether one entry from the accepted-submission list counts as the
/// claimed solve. Entries without a timestamp are assumed recent; the list
/// is already capped small.
fn is_qualifying_solve(sub: &AcSubmission, slug: &str, now: i64, max_age_secs: i64) -> bool {
    sub.title_slug == slug
        && match &sub.timestamp {
            Some(ts) => ts
                .parse::<i64>()
                .map(|t| now - t <= max_age_secs)
                .unwrap_or(false),
            None => true,
        }
}

pub struct AlfaLeetCodeApi {
    client: Client,
    base_url: String,
    cache: TtlCache<String, ProblemMetadata>,
    retry: RetryPolicy,
}

impl Default for AlfaLeetCodeApi {
    fn default() -> Self {
        Self::new()
    }
}

impl AlfaLeetCodeApi {
    pub fn new() -> Self {
        AlfaLeetCodeApi {
            client: Client::new(),
            base_url: BASE_URL.to_string(),
            cache: TtlCache::new(METADATA_TTL),
            retry: RetryPolicy::default(),
        }
    }

    async fn get_json(&self, url: &str) -> ApiResult<Value> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_transport)?;
        if let Some(err) = classify_status(&response) {
            return Err(err);
        }
        response
            .json()
            .await
            .map_err(|err| ApiError::Shape(err.to_string()))
    }
}

#[async_trait]
impl PlatformApi for AlfaLeetCodeApi {
    async fn fetch_metadata(&self, id: &str) -> ApiResult<Option<ProblemMetadata>> {
        if let Some(hit) = self.cache.get(&id.to_string()) {
            log::trace!("[alfa::fetch_metadata] cache hit for {id}");
            return Ok(Some(hit));
        }

        let url = format!("{}/select?titleSlug={id}", self.base_url);
        let value = match retry::with_backoff(self.retry, "alfa::fetch_metadata", || {
            self.get_json(&url)
        })
        .await
        {
            Ok(value) => value,
            // The proxy 404s unknown slugs.
            Err(ApiError::Status(404)) => return Ok(None),
            Err(err) => return Err(err),
        };

        let parsed: SelectResponse = serde_json::from_value(value)
            .map_err(|err| ApiError::Shape(err.to_string()))?;
        let (Some(title), Some(slug), Some(difficulty)) =
            (parsed.question_title, parsed.title_slug, parsed.difficulty)
        else {
            return Ok(None);
        };
        let difficulty = Difficulty::parse(&difficulty)
            .ok_or_else(|| ApiError::Shape(format!("unknown difficulty {difficulty:?}")))?;

        let metadata = ProblemMetadata {
            url: format!("https://leetcode.com/problems/{slug}/"),
            title,
            slug,
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
        let url = format!("{}/{handle}/acSubmission?limit={RECENT_LIMIT}", self.base_url);
        let value = match retry::with_backoff(self.retry, "alfa::verify_recent_solve", || {
            self.get_json(&url)
        })
        .await
        {
            Ok(value) => value,
            Err(ApiError::Status(404)) => {
                return Ok(Verification::NotVerified(
                    "Invalid or private LeetCode profile.".into(),
                ));
            }
            Err(err) => return Err(err),
        };

        // The proxy wraps the list in `{"submission": [...]}` on some
        // versions and returns a bare array on others.
        let list = match &value {
            Value::Object(map) => map.get("submission").cloned().unwrap_or(Value::Null),
            Value::Array(_) => value.clone(),
            _ => Value::Null,
        };
        let submissions: Vec<AcSubmission> = match list {
            Value::Null => Vec::new(),
            other => serde_json::from_value(other)
                .map_err(|err| ApiError::Shape(err.to_string()))?,
        };

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
