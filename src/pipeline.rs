//! The submission engine: one entry point that takes "user X claims to have
//! solved problem Y on platform Z" through normalization, verification,
//! duplicate rejection, scoring, and persistence.
//!
//! Concurrency: submissions for the same user are serialized behind a
//! per-user async lock, so two racing claims cannot both read the
//! pre-update streak state. Different users proceed in parallel; the
//! UNIQUE constraint in storage backstops any race the locks miss.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::api::codeforces::CodeforcesApi;
use crate::api::fallback::{FallbackChain, Tier};
use crate::api::gfg::GfgApi;
use crate::api::{PlatformApi, Verification};
use crate::db::Store;
use crate::models::{
    DEFAULT_VERIFY_WINDOW_MINUTES, Platform, Problem, ProblemMetadata, SubmissionRecord, UserId,
    VerificationKind,
};
use crate::normalize;
use crate::scoring::{ScoreBreakdown, ScoreInput, score};
use crate::streak;

/// Per-user gap between submission attempts, successful or not.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

/// Year label for users and auto-provisioned problems with no known cohort.
pub const UNKNOWN_YEAR: &str = "Unknown";

/// Topic assigned to problems first seen through a submission rather than
/// curated ahead of time.
pub const DEFAULT_TOPIC: &str = "General";

/// What the user is told after a submission attempt. Every refusal reason
/// is a distinct variant so the chat layer can phrase each one; none of
/// them is an `Err` because none of them is a fault in this system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted(SubmitReport),
    /// No handle linked for this platform; we cannot attribute solves.
    NotLinked(Platform),
    /// Identifier cannot name a problem on this platform (pre-network check).
    MalformedIdentifier(String),
    /// Platform says no such problem exists.
    NotFound { platform: Platform, id: String },
    /// Platform answered but found no qualifying recent solve.
    VerificationFailed(String),
    /// Already credited for this problem on this platform.
    Duplicate,
    /// Platform unreachable after retries and no trust path applies.
    UpstreamUnavailable,
    /// Attempted again too soon.
    Cooldown { remaining: Duration },
    /// Something on our side broke; details are in the logs, not the reply.
    Internal,
}

/// Receipt for an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReport {
    pub title: String,
    pub url: String,
    pub slug: String,
    pub platform: Platform,
    pub verification: VerificationKind,
    pub breakdown: ScoreBreakdown,
    pub total_points: u64,
    pub daily_streak: u32,
    pub weekly_streak: u32,
}

impl SubmitOutcome {
    /// User-facing phrasing for each outcome.
    pub fn message(&self) -> String {
        match self {
            SubmitOutcome::Accepted(report) => {
                let mut msg = format!(
                    "Credited **{}** ({}): +{} points ({} base",
                    report.title,
                    report.platform,
                    report.breakdown.total(),
                    report.breakdown.base,
                );
                if report.breakdown.potd_bonus > 0 {
                    msg += &format!(", +{} POTD bonus", report.breakdown.potd_bonus);
                }
                if report.breakdown.daily_bonus > 0 {
                    msg += &format!(", +{} daily streak", report.breakdown.daily_bonus);
                }
                if report.breakdown.weekly_bonus > 0 {
                    msg += &format!(", +{} weekly streak", report.breakdown.weekly_bonus);
                }
                msg += &format!(
                    "). Total: {} | daily streak {} | weekly streak {}",
                    report.total_points, report.daily_streak, report.weekly_streak
                );
                msg
            }
            SubmitOutcome::NotLinked(platform) => format!(
                "No {platform} handle linked. Link one first so solves can be verified."
            ),
            SubmitOutcome::MalformedIdentifier(id) => {
                format!("`{id}` doesn't look like a valid problem reference.")
            }
            SubmitOutcome::NotFound { platform, id } => {
                format!("Couldn't find `{id}` on {platform}.")
            }
            SubmitOutcome::VerificationFailed(reason) => reason.clone(),
            SubmitOutcome::Duplicate => {
                "You've already been credited for this problem.".to_string()
            }
            SubmitOutcome::UpstreamUnavailable => {
                "The platform API is unavailable right now; please try again later.".to_string()
            }
            SubmitOutcome::Cooldown { remaining } => format!(
                "Slow down! Try again in {} seconds.",
                remaining.as_secs().max(1)
            ),
            SubmitOutcome::Internal => "Oops, internal error.".to_string(),
        }
    }
}

pub struct Engine {
    store: Arc<dyn Store>,
    leetcode: FallbackChain,
    codeforces: Box<dyn PlatformApi>,
    gfg: Box<dyn PlatformApi>,

    cooldown: Duration,
    window_minutes: u64,

    last_attempt: Mutex<HashMap<UserId, Instant>>,
    user_locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl Engine {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_sources(
            store,
            FallbackChain::leetcode(),
            Box::new(CodeforcesApi::new()),
            Box::new(GfgApi::new()),
        )
    }

    /// Build with explicit platform sources; the seam tests use.
    pub fn with_sources(
        store: Arc<dyn Store>,
        leetcode: FallbackChain,
        codeforces: Box<dyn PlatformApi>,
        gfg: Box<dyn PlatformApi>,
    ) -> Self {
        Engine {
            store,
            leetcode,
            codeforces,
            gfg,
            cooldown: DEFAULT_COOLDOWN,
            window_minutes: DEFAULT_VERIFY_WINDOW_MINUTES,
            last_attempt: Mutex::new(HashMap::new()),
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn verify_window_minutes(mut self, minutes: u64) -> Self {
        self.window_minutes = minutes;
        self
    }

    /// Process one submission claim end to end. Refusals come back as
    /// [`SubmitOutcome`] variants; `Internal` covers genuine faults, which
    /// are logged here rather than surfaced to the user.
    pub async fn submit(&self, user: UserId, platform: Platform, raw_id: &str) -> SubmitOutcome {
        match self.run(user, platform, raw_id).await {
            Ok(outcome) => outcome,
            Err(err) => {
                log::error!("[submit] internal error for user {user} on {platform}: {err:#}");
                SubmitOutcome::Internal
            }
        }
    }

    /// Links `handle` as `user`'s identity on `platform`. Returns `false`
    /// if the handle is already claimed by someone else.
    pub async fn link(&self, user: UserId, platform: Platform, handle: &str) -> Result<bool> {
        let handle = handle.trim();
        if handle.is_empty() {
            anyhow::bail!("a {platform} handle cannot be empty");
        }
        // GeeksforGeeks display handles legitimately contain spaces; the
        // other platforms never allow them.
        if platform != Platform::GeeksforGeeks && handle.contains(char::is_whitespace) {
            anyhow::bail!("a {platform} handle cannot contain spaces");
        }
        self.store.ensure_user(user, UNKNOWN_YEAR).await?;
        let linked = self.store.link_handle(user, platform, handle).await?;
        if linked {
            log::info!("[link] user {user} linked {platform} handle");
        } else {
            log::info!("[link] user {user} tried to claim an already-linked {platform} handle");
        }
        Ok(linked)
    }

    pub async fn leaderboard(&self, limit: u32) -> Result<Vec<crate::models::User>> {
        self.store.leaderboard(limit).await
    }

    /// A user's most recent credited submissions, newest first.
    pub async fn history(&self, user: UserId, limit: u32) -> Result<Vec<SubmissionRecord>> {
        self.store.recent_submissions(user, limit).await
    }

    /// Admin: wipe a user's submissions, points, and streaks. Takes the
    /// same per-user lock as submissions so an in-flight credit cannot
    /// land after the wipe and resurrect the old totals.
    pub async fn reset_user(&self, user: UserId) -> Result<()> {
        let lock = self.user_lock(user).await;
        let _guard = lock.lock().await;
        self.store.reset_user(user).await
    }

    async fn run(&self, user: UserId, platform: Platform, raw_id: &str) -> Result<SubmitOutcome> {
        if let Some(remaining) = self.check_cooldown(user).await {
            return Ok(SubmitOutcome::Cooldown { remaining });
        }

        // Serialize per user so streak/points read-modify-write is atomic.
        let lock = self.user_lock(user).await;
        let _guard = lock.lock().await;

        let user_row = self.store.ensure_user(user, UNKNOWN_YEAR).await?;
        let Some(handle) = user_row.handle_for(platform) else {
            return Ok(SubmitOutcome::NotLinked(platform));
        };
        let handle = handle.to_string();

        // Reject un-normalizable identifiers before any network traffic.
        let Some(slug) = normalize::normalize(platform, raw_id) else {
            return Ok(SubmitOutcome::MalformedIdentifier(raw_id.to_string()));
        };

        let metadata = match self.resolve_metadata(platform, &slug).await? {
            Ok(metadata) => metadata,
            Err(outcome) => return Ok(outcome),
        };

        let verification = match self.verify(platform, &handle, &slug).await? {
            Ok(kind) => kind,
            Err(outcome) => return Ok(outcome),
        };

        // Duplicate check sits after verification on purpose: a wasted API
        // call is acceptable, a double credit is not. The UNIQUE constraint
        // at insert time remains the authoritative guard.
        if self.store.has_submission(user, &slug, platform).await? {
            log::info!("[submit] user {user} already credited for {slug} ({platform})");
            return Ok(SubmitOutcome::Duplicate);
        }

        let today = Utc::now().date_naive();
        let known = self.store.get_problem(&slug, platform).await?;
        let is_potd = known.as_ref().is_some_and(|p| p.is_potd_on(today));
        let potd_solved_today = if is_potd {
            self.store.potd_count_on(user, platform, today).await?
        } else {
            0
        };

        let streaks = streak::advance(
            user_row.last_submission_date,
            user_row.last_week_submitted.as_deref(),
            user_row.daily_streak,
            user_row.weekly_streak,
            today,
        );

        let breakdown = score(&ScoreInput {
            difficulty: metadata.difficulty,
            flat_rate: platform == Platform::GeeksforGeeks,
            is_potd,
            potd_solved_today,
            streaks: streaks.clone(),
        });

        if known.is_none() {
            // First sighting of this problem; provision it from metadata.
            self.store
                .insert_problem(&Problem {
                    slug: metadata.slug.clone(),
                    platform,
                    title: metadata.title.clone(),
                    difficulty: metadata.difficulty,
                    topic: DEFAULT_TOPIC.to_string(),
                    student_year: user_row.student_year.clone(),
                    is_potd: false,
                    potd_date: None,
                })
                .await?;
        }

        // Submission row, points, and streaks commit together; a cancelled
        // or crashed attempt persists either everything or nothing.
        let total_points = user_row.total_points + breakdown.total();
        let recorded = self
            .store
            .record_submission(
                &SubmissionRecord {
                    user,
                    slug: slug.clone(),
                    platform,
                    submitted_at: Utc::now(),
                    points_awarded: breakdown.total(),
                    verification,
                },
                total_points,
                streaks.daily,
                streaks.weekly,
                today,
                &streak::week_label(today),
            )
            .await?;
        if !recorded {
            log::info!("[submit] duplicate insert raced for user {user} on {slug} ({platform})");
            return Ok(SubmitOutcome::Duplicate);
        }

        log::info!(
            "[submit] user {user} credited {} points for {slug} ({platform})",
            breakdown.total()
        );

        Ok(SubmitOutcome::Accepted(SubmitReport {
            title: metadata.title,
            url: metadata.url,
            slug,
            platform,
            verification,
            breakdown,
            total_points,
            daily_streak: streaks.daily,
            weekly_streak: streaks.weekly,
        }))
    }

    /// Resolve metadata for the slug. The inner `Result` carries a refusal
    /// outcome; the outer one is for storage faults only.
    async fn resolve_metadata(
        &self,
        platform: Platform,
        slug: &str,
    ) -> Result<Result<ProblemMetadata, SubmitOutcome>> {
        let metadata = match platform {
            Platform::LeetCode => {
                let (metadata, tier) = self.leetcode.fetch_metadata(slug, None).await;
                if tier == Tier::Trusted {
                    log::warn!("[resolve_metadata] serving {slug} from the trust tier");
                }
                metadata
            }
            Platform::Codeforces => match self.codeforces.fetch_metadata(slug).await {
                Ok(metadata) => metadata,
                Err(err) => {
                    log::error!("[resolve_metadata] codeforces unavailable for {slug}: {err}");
                    return Ok(Err(SubmitOutcome::UpstreamUnavailable));
                }
            },
            Platform::GeeksforGeeks => match self.gfg.fetch_metadata(slug).await {
                Ok(metadata) => metadata,
                Err(err) => {
                    log::error!("[resolve_metadata] gfg unavailable for {slug}: {err}");
                    return Ok(Err(SubmitOutcome::UpstreamUnavailable));
                }
            },
        };

        Ok(match metadata {
            Some(metadata) => Ok(metadata),
            None => Err(SubmitOutcome::NotFound {
                platform,
                id: slug.to_string(),
            }),
        })
    }

    async fn verify(
        &self,
        platform: Platform,
        handle: &str,
        slug: &str,
    ) -> Result<Result<VerificationKind, SubmitOutcome>> {
        let verification = match platform {
            Platform::LeetCode => {
                let (verification, tier) = self
                    .leetcode
                    .verify_recent_solve(handle, slug, self.window_minutes)
                    .await;
                if tier == Tier::Trusted {
                    log::warn!("[verify] trusting {handle}'s claim on {slug}");
                }
                verification
            }
            Platform::Codeforces => {
                match self
                    .codeforces
                    .verify_recent_solve(handle, slug, self.window_minutes)
                    .await
                {
                    Ok(verification) => verification,
                    Err(err) => {
                        log::error!("[verify] codeforces unavailable for {handle}: {err}");
                        return Ok(Err(SubmitOutcome::UpstreamUnavailable));
                    }
                }
            }
            Platform::GeeksforGeeks => {
                match self
                    .gfg
                    .verify_recent_solve(handle, slug, self.window_minutes)
                    .await
                {
                    Ok(verification) => verification,
                    Err(err) => {
                        log::error!("[verify] gfg unavailable for {handle}: {err}");
                        return Ok(Err(SubmitOutcome::UpstreamUnavailable));
                    }
                }
            }
        };

        Ok(match verification {
            Verification::Verified => Ok(VerificationKind::Verified),
            Verification::Trusted => Ok(VerificationKind::Trusted),
            Verification::NotVerified(reason) => Err(SubmitOutcome::VerificationFailed(reason)),
        })
    }

    /// Returns the remaining wait if the user is still cooling down;
    /// otherwise stamps this attempt.
    async fn check_cooldown(&self, user: UserId) -> Option<Duration> {
        let mut attempts = self.last_attempt.lock().await;
        let now = Instant::now();
        if let Some(last) = attempts.get(&user) {
            let elapsed = now.duration_since(*last);
            if elapsed < self.cooldown {
                return Some(self.cooldown - elapsed);
            }
        }
        // Expired stamps can never refuse anyone again; drop them so the
        // map only tracks users still cooling down.
        attempts.retain(|_, stamp| now.duration_since(*stamp) < self.cooldown);
        attempts.insert(user, now);
        None
    }

    async fn user_lock(&self, user: UserId) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        // A strong count of one means the map holds the only reference:
        // no submission or reset is using that lock, so it can go.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(user)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;

    fn engine(cooldown: Duration) -> Engine {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        Engine::new(store).cooldown(cooldown)
    }

    #[tokio::test]
    async fn expired_cooldown_stamps_are_evicted() {
        let engine = engine(Duration::ZERO);
        for user in 0..5 {
            assert!(engine.check_cooldown(user).await.is_none());
        }
        // With a zero cooldown every earlier stamp is stale, so only the
        // latest attempt may remain tracked.
        assert_eq!(engine.last_attempt.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn idle_user_locks_are_swept() {
        let engine = engine(DEFAULT_COOLDOWN);
        {
            let lock = engine.user_lock(1).await;
            let _guard = lock.lock().await;
            assert_eq!(engine.user_locks.lock().await.len(), 1);
        }
        let _held = engine.user_lock(2).await;
        let locks = engine.user_locks.lock().await;
        assert_eq!(locks.len(), 1);
        assert!(locks.contains_key(&2));
    }

    #[tokio::test]
    async fn reset_waits_for_the_user_lock() {
        let engine = engine(DEFAULT_COOLDOWN);
        let lock = engine.user_lock(1).await;
        let guard = lock.lock().await;

        let blocked =
            tokio::time::timeout(Duration::from_millis(20), engine.reset_user(1)).await;
        assert!(blocked.is_err());

        drop(guard);
        engine.reset_user(1).await.unwrap();
    }
}
