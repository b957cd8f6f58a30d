//! SQLite persistence layer.
//!
//! The UNIQUE constraint on `Submissions(discord_id, problem_slug, platform)`
//! is the duplicate-credit guard of record; everything above it treats a
//! constraint violation on insert as "already counted", not an error.

pub mod problems;
pub mod schema;
pub mod submissions;
pub mod users;

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::models::{Platform, Problem, SubmissionRecord, User, UserId};

pub type DBResult<T> = rusqlite::Result<T>;

/// Converts a UNIQUE-constraint failure into `Ok(false)` so idempotent
/// inserts can report "was already there" without call sites matching on
/// error strings. Any other error passes through.
pub(crate) fn swallow_constraint_violation(err: rusqlite::Error) -> DBResult<bool> {
    match err {
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Ok(false)
        }
        other => Err(other),
    }
}

pub(crate) fn column_error(column: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        format!("unrecognized {column}: {value:?}").into(),
    )
}

pub(crate) fn parse_date(column: &str, value: Option<String>) -> DBResult<Option<NaiveDate>> {
    value
        .map(|raw| raw.parse().map_err(|_| column_error(column, &raw)))
        .transpose()
}

/// Everything the submission engine needs from storage. One implementation
/// ships; the trait exists so tests can run against a fresh in-memory store
/// and so a future backend swap stays behind one seam.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// Fetch the user, creating a fresh row first if they are unknown.
    async fn ensure_user(&self, id: UserId, student_year: &str) -> Result<User>;

    /// Links `handle` as `id`'s identity on `platform`. Returns false if
    /// another user already claimed that handle.
    async fn link_handle(&self, id: UserId, platform: Platform, handle: &str) -> Result<bool>;

    async fn update_points(&self, id: UserId, total_points: u64) -> Result<()>;

    async fn update_streaks(
        &self,
        id: UserId,
        daily: u32,
        weekly: u32,
        last_date: NaiveDate,
        last_week: &str,
    ) -> Result<()>;

    async fn get_problem(&self, slug: &str, platform: Platform) -> Result<Option<Problem>>;

    /// Inserts the problem if it is not already known. Returns `true` if it
    /// was newly added; an existing row is left untouched.
    async fn insert_problem(&self, problem: &Problem) -> Result<bool>;

    /// Marks an existing problem as the featured daily challenge for `date`.
    async fn set_potd(&self, slug: &str, platform: Platform, date: NaiveDate) -> Result<bool>;

    async fn has_submission(&self, user: UserId, slug: &str, platform: Platform) -> Result<bool>;

    /// Records a credited submission. Returns `false` if this user was
    /// already credited for this problem on this platform.
    async fn insert_submission(&self, record: &SubmissionRecord) -> Result<bool>;

    /// Commits one accepted submission atomically: the submission row, the
    /// new points total, and the updated streak state land together or not
    /// at all. Returns `false` (committing nothing) on a duplicate.
    async fn record_submission(
        &self,
        record: &SubmissionRecord,
        total_points: u64,
        daily: u32,
        weekly: u32,
        last_date: NaiveDate,
        last_week: &str,
    ) -> Result<bool>;

    /// How many featured-daily-challenge problems `user` has already been
    /// credited for on `platform` on `date`.
    async fn potd_count_on(
        &self,
        user: UserId,
        platform: Platform,
        date: NaiveDate,
    ) -> Result<u32>;

    /// A user's most recent credited submissions, newest first.
    async fn recent_submissions(&self, user: UserId, limit: u32)
    -> Result<Vec<SubmissionRecord>>;

    /// Top users by total points, descending.
    async fn leaderboard(&self, limit: u32) -> Result<Vec<User>>;

    /// Wipes a user's submissions, points, and streaks. Linked handles stay.
    async fn reset_user(&self, id: UserId) -> Result<()>;
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("could not open database at {}", path.display()))?;
        Self::initialize(&conn)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("could not open in-memory database")?;
        Self::initialize(&conn)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    fn initialize(conn: &Connection) -> Result<()> {
        log::debug!("[SqliteStore::initialize] creating tables...");
        conn.execute(schema::USERS_SCHEMA, [])?;
        conn.execute(schema::PROBLEMS_SCHEMA, [])?;
        conn.execute(schema::SUBMISSIONS_SCHEMA, [])?;
        Ok(())
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let conn = self.conn.lock().await;
        Ok(users::query_user(&conn, id)?)
    }

    async fn ensure_user(&self, id: UserId, student_year: &str) -> Result<User> {
        let conn = self.conn.lock().await;
        if users::insert_user(&conn, id, student_year)? {
            log::info!("[ensure_user] registered new user {id}");
        }
        users::query_user(&conn, id)?
            .with_context(|| format!("user {id} missing immediately after insert"))
    }

    async fn link_handle(&self, id: UserId, platform: Platform, handle: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        Ok(users::link_handle(&conn, id, platform, handle)?)
    }

    async fn update_points(&self, id: UserId, total_points: u64) -> Result<()> {
        let conn = self.conn.lock().await;
        Ok(users::update_points(&conn, id, total_points)?)
    }

    async fn update_streaks(
        &self,
        id: UserId,
        daily: u32,
        weekly: u32,
        last_date: NaiveDate,
        last_week: &str,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        Ok(users::update_streaks(
            &conn, id, daily, weekly, last_date, last_week,
        )?)
    }

    async fn get_problem(&self, slug: &str, platform: Platform) -> Result<Option<Problem>> {
        let conn = self.conn.lock().await;
        Ok(problems::query_problem(&conn, slug, platform)?)
    }

    async fn insert_problem(&self, problem: &Problem) -> Result<bool> {
        let conn = self.conn.lock().await;
        Ok(problems::insert_problem(&conn, problem)?)
    }

    async fn set_potd(&self, slug: &str, platform: Platform, date: NaiveDate) -> Result<bool> {
        let conn = self.conn.lock().await;
        Ok(problems::set_potd(&conn, slug, platform, date)?)
    }

    async fn has_submission(&self, user: UserId, slug: &str, platform: Platform) -> Result<bool> {
        let conn = self.conn.lock().await;
        Ok(submissions::submission_exists(&conn, user, slug, platform)?)
    }

    async fn insert_submission(&self, record: &SubmissionRecord) -> Result<bool> {
        let conn = self.conn.lock().await;
        Ok(submissions::insert_submission(&conn, record)?)
    }

    async fn record_submission(
        &self,
        record: &SubmissionRecord,
        total_points: u64,
        daily: u32,
        weekly: u32,
        last_date: NaiveDate,
        last_week: &str,
    ) -> Result<bool> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        if !submissions::insert_submission(&tx, record)? {
            return Ok(false);
        }
        users::update_points(&tx, record.user, total_points)?;
        users::update_streaks(&tx, record.user, daily, weekly, last_date, last_week)?;
        tx.commit()?;
        Ok(true)
    }

    async fn potd_count_on(
        &self,
        user: UserId,
        platform: Platform,
        date: NaiveDate,
    ) -> Result<u32> {
        let conn = self.conn.lock().await;
        Ok(submissions::potd_count_on(&conn, user, platform, date)?)
    }

    async fn recent_submissions(
        &self,
        user: UserId,
        limit: u32,
    ) -> Result<Vec<SubmissionRecord>> {
        let conn = self.conn.lock().await;
        Ok(submissions::recent_submissions(&conn, user, limit)?)
    }

    async fn leaderboard(&self, limit: u32) -> Result<Vec<User>> {
        let conn = self.conn.lock().await;
        Ok(users::query_leaderboard(&conn, limit)?)
    }

    async fn reset_user(&self, id: UserId) -> Result<()> {
        let conn = self.conn.lock().await;
        submissions::delete_submissions(&conn, id)?;
        users::reset_progress(&conn, id)?;
        log::info!("[reset_user] cleared progress for user {id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, VerificationKind};
    use chrono::Utc;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn problem(slug: &str, platform: Platform) -> Problem {
        Problem {
            slug: slug.to_string(),
            platform,
            title: "Two Sum".to_string(),
            difficulty: Difficulty::Easy,
            topic: "General".to_string(),
            student_year: "Unknown".to_string(),
            is_potd: false,
            potd_date: None,
        }
    }

    fn record(user: UserId, slug: &str, platform: Platform) -> SubmissionRecord {
        SubmissionRecord {
            user,
            slug: slug.to_string(),
            platform,
            submitted_at: Utc::now(),
            points_awarded: 5,
            verification: VerificationKind::Verified,
        }
    }

    #[tokio::test]
    async fn ensure_user_is_idempotent() {
        let store = store();
        let first = store.ensure_user(1, "Junior").await.unwrap();
        assert_eq!(first.total_points, 0);
        assert_eq!(first.student_year, "Junior");

        store.update_points(1, 25).await.unwrap();
        let again = store.ensure_user(1, "Senior").await.unwrap();
        assert_eq!(again.total_points, 25);
        // Existing row wins; the second call must not reset anything.
        assert_eq!(again.student_year, "Junior");
    }

    #[tokio::test]
    async fn linked_handles_are_globally_unique() {
        let store = store();
        store.ensure_user(1, "Unknown").await.unwrap();
        store.ensure_user(2, "Unknown").await.unwrap();

        assert!(store.link_handle(1, Platform::LeetCode, "alice").await.unwrap());
        assert!(!store.link_handle(2, Platform::LeetCode, "alice").await.unwrap());

        // Same handle on a different platform is a different namespace.
        assert!(store.link_handle(2, Platform::Codeforces, "alice").await.unwrap());

        let user = store.get_user(2).await.unwrap().unwrap();
        assert_eq!(user.leetcode_username, None);
        assert_eq!(user.codeforces_handle.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn same_slug_on_two_platforms_is_two_problems() {
        let store = store();
        assert!(store.insert_problem(&problem("two-sum", Platform::LeetCode)).await.unwrap());
        assert!(store.insert_problem(&problem("two-sum", Platform::GeeksforGeeks)).await.unwrap());
        assert!(!store.insert_problem(&problem("two-sum", Platform::LeetCode)).await.unwrap());

        assert!(store.get_problem("two-sum", Platform::Codeforces).await.unwrap().is_none());
        let found = store.get_problem("two-sum", Platform::LeetCode).await.unwrap().unwrap();
        assert_eq!(found.platform, Platform::LeetCode);
    }

    #[tokio::test]
    async fn duplicate_submission_is_rejected_not_errored() {
        let store = store();
        store.ensure_user(1, "Unknown").await.unwrap();
        store.insert_problem(&problem("two-sum", Platform::LeetCode)).await.unwrap();

        assert!(store.insert_submission(&record(1, "two-sum", Platform::LeetCode)).await.unwrap());
        assert!(store.has_submission(1, "two-sum", Platform::LeetCode).await.unwrap());
        assert!(!store.insert_submission(&record(1, "two-sum", Platform::LeetCode)).await.unwrap());

        // A different platform's problem with the same slug is fresh credit.
        store.insert_problem(&problem("two-sum", Platform::GeeksforGeeks)).await.unwrap();
        assert!(
            store
                .insert_submission(&record(1, "two-sum", Platform::GeeksforGeeks))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn potd_count_joins_on_flag_and_date() {
        let store = store();
        store.ensure_user(1, "Unknown").await.unwrap();
        let today = Utc::now().date_naive();

        store.insert_problem(&problem("daily-one", Platform::LeetCode)).await.unwrap();
        store.insert_problem(&problem("plain", Platform::LeetCode)).await.unwrap();
        assert!(store.set_potd("daily-one", Platform::LeetCode, today).await.unwrap());
        assert!(!store.set_potd("missing", Platform::LeetCode, today).await.unwrap());

        store.insert_submission(&record(1, "daily-one", Platform::LeetCode)).await.unwrap();
        store.insert_submission(&record(1, "plain", Platform::LeetCode)).await.unwrap();

        assert_eq!(store.potd_count_on(1, Platform::LeetCode, today).await.unwrap(), 1);
        // Ordinals are tracked per platform.
        assert_eq!(store.potd_count_on(1, Platform::Codeforces, today).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn recent_submissions_round_trip_newest_first() {
        let store = store();
        store.ensure_user(1, "Unknown").await.unwrap();
        for (slug, platform) in [
            ("two-sum", Platform::LeetCode),
            ("1872A", Platform::Codeforces),
        ] {
            store.insert_problem(&problem(slug, platform)).await.unwrap();
            let mut rec = record(1, slug, platform);
            rec.verification = VerificationKind::Trusted;
            store.insert_submission(&rec).await.unwrap();
        }

        let history = store.recent_submissions(1, 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|r| r.user == 1));
        assert!(history.iter().all(|r| r.verification == VerificationKind::Trusted));
        assert!(
            history
                .iter()
                .any(|r| r.slug == "1872A" && r.platform == Platform::Codeforces)
        );

        assert_eq!(store.recent_submissions(1, 1).await.unwrap().len(), 1);
        assert!(store.recent_submissions(2, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn record_submission_commits_everything_or_nothing() {
        let store = store();
        store.ensure_user(1, "Unknown").await.unwrap();
        store.insert_problem(&problem("two-sum", Platform::LeetCode)).await.unwrap();
        let date = Utc::now().date_naive();

        let committed = store
            .record_submission(&record(1, "two-sum", Platform::LeetCode), 5, 1, 1, date, "2025-W35")
            .await
            .unwrap();
        assert!(committed);

        let user = store.get_user(1).await.unwrap().unwrap();
        assert_eq!(user.total_points, 5);
        assert_eq!(user.daily_streak, 1);

        // Duplicate: nothing changes, including the points total.
        let committed = store
            .record_submission(&record(1, "two-sum", Platform::LeetCode), 99, 9, 9, date, "2025-W35")
            .await
            .unwrap();
        assert!(!committed);
        let user = store.get_user(1).await.unwrap().unwrap();
        assert_eq!(user.total_points, 5);
        assert_eq!(user.daily_streak, 1);
    }

    #[tokio::test]
    async fn leaderboard_orders_by_points() {
        let store = store();
        for (id, points) in [(1, 10), (2, 30), (3, 20)] {
            store.ensure_user(id, "Unknown").await.unwrap();
            store.update_points(id, points).await.unwrap();
        }

        let top = store.leaderboard(2).await.unwrap();
        let ids: Vec<UserId> = top.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn reset_clears_progress_but_keeps_handles() {
        let store = store();
        store.ensure_user(1, "Unknown").await.unwrap();
        store.link_handle(1, Platform::LeetCode, "alice").await.unwrap();
        store.insert_problem(&problem("two-sum", Platform::LeetCode)).await.unwrap();
        store.insert_submission(&record(1, "two-sum", Platform::LeetCode)).await.unwrap();
        store.update_points(1, 50).await.unwrap();

        store.reset_user(1).await.unwrap();

        let user = store.get_user(1).await.unwrap().unwrap();
        assert_eq!(user.total_points, 0);
        assert_eq!(user.daily_streak, 0);
        assert_eq!(user.leetcode_username.as_deref(), Some("alice"));
        assert!(!store.has_submission(1, "two-sum", Platform::LeetCode).await.unwrap());
    }

    #[tokio::test]
    async fn streak_columns_round_trip() {
        let store = store();
        store.ensure_user(1, "Unknown").await.unwrap();
        let date = Utc::now().date_naive();
        store.update_streaks(1, 4, 2, date, "2025-W35").await.unwrap();

        let user = store.get_user(1).await.unwrap().unwrap();
        assert_eq!(user.daily_streak, 4);
        assert_eq!(user.weekly_streak, 2);
        assert_eq!(user.last_submission_date, Some(date));
        assert_eq!(user.last_week_submitted.as_deref(), Some("2025-W35"));
    }
}
