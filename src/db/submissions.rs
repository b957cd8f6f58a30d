use chrono::{DateTime, NaiveDate};
use rusqlite::Connection;

use crate::db::{self, DBResult};
use crate::models::{Platform, SubmissionRecord, UserId, VerificationKind};

impl<'a> TryFrom<&'a rusqlite::Row<'a>> for SubmissionRecord {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        let platform: String = row.get("platform")?;
        let verification: String = row.get("verification")?;
        let submitted_at: i64 = row.get("submitted_at")?;

        Ok(Self {
            user: row.get("discord_id")?,
            slug: row.get("problem_slug")?,
            platform: Platform::parse(&platform)
                .ok_or_else(|| db::column_error("platform", &platform))?,
            submitted_at: DateTime::from_timestamp(submitted_at, 0)
                .ok_or_else(|| db::column_error("submitted_at", &submitted_at.to_string()))?,
            points_awarded: row.get("points_awarded")?,
            verification: VerificationKind::parse(&verification)
                .ok_or_else(|| db::column_error("verification", &verification))?,
        })
    }
}

/// Whether `user` has already been credited for this problem on this
/// platform. The UNIQUE constraint enforces this on insert; the read exists
/// so the pipeline can refuse early without burning platform API calls.
pub fn submission_exists(
    conn: &Connection,
    user: UserId,
    slug: &str,
    platform: Platform,
) -> DBResult<bool> {
    conn.prepare(
        "SELECT 1 FROM Submissions
         WHERE discord_id = :id AND problem_slug = :slug AND platform = :platform",
    )?
    .exists(rusqlite::named_params! {
        ":id":       user,
        ":slug":     slug,
        ":platform": platform.as_str(),
    })
}

/// Inserts a credited submission.
/// Returns `true` if it was newly added, `false` on a duplicate.
pub fn insert_submission(conn: &Connection, record: &SubmissionRecord) -> DBResult<bool> {
    log::trace!(
        "[insert_submission] Inserting submission by {} for {} into Submissions...",
        record.user,
        record.slug
    );

    let query_params = rusqlite::named_params! {
        ":discord_id":     record.user,
        ":problem_slug":   record.slug,
        ":platform":       record.platform.as_str(),
        ":submitted_at":   record.submitted_at.timestamp(),
        ":points_awarded": record.points_awarded,
        ":verification":   record.verification.as_str(),
    };

    conn.prepare(
        "INSERT INTO Submissions
            ( discord_id,  problem_slug,  platform,  submitted_at,  points_awarded,  verification)
         VALUES
            (:discord_id, :problem_slug, :platform, :submitted_at, :points_awarded, :verification)",
    )?
    .execute(query_params)
    .map_or_else(db::swallow_constraint_violation, |_| Ok(true))
}

/// How many featured-daily-challenge problems `user` was credited for on
/// `platform` on `date`. Feeds the escalating daily-challenge bonus.
pub fn potd_count_on(
    conn: &Connection,
    user: UserId,
    platform: Platform,
    date: NaiveDate,
) -> DBResult<u32> {
    let query_params = rusqlite::named_params! {
        ":id":       user,
        ":platform": platform.as_str(),
        ":date":     date.to_string(),
    };

    conn.prepare(
        "SELECT COUNT(*) FROM Submissions s
         JOIN Problems p ON p.slug = s.problem_slug AND p.platform = s.platform
         WHERE s.discord_id = :id
           AND s.platform = :platform
           AND p.is_potd = 1
           AND p.potd_date = :date
           AND date(s.submitted_at, 'unixepoch') = :date",
    )?
    .query_row(query_params, |row| row.get(0))
}

/// A user's most recent credited submissions, newest first.
pub fn recent_submissions(
    conn: &Connection,
    user: UserId,
    limit: u32,
) -> DBResult<Vec<SubmissionRecord>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM Submissions
         WHERE discord_id = :id
         ORDER BY submitted_at DESC
         LIMIT :limit",
    )?;

    let records = stmt
        .query_map(rusqlite::named_params! { ":id": user, ":limit": limit }, |row| {
            SubmissionRecord::try_from(row)
        })?
        .collect::<DBResult<Vec<SubmissionRecord>>>()?;

    Ok(records)
}

pub fn delete_submissions(conn: &Connection, user: UserId) -> DBResult<()> {
    conn.prepare("DELETE FROM Submissions WHERE discord_id = :id")?
        .execute(rusqlite::named_params! { ":id": user })?;
    Ok(())
}
