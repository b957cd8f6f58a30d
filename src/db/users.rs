use rusqlite::Connection;

use crate::db::{self, DBResult};
use crate::models::{Platform, User, UserId};

impl<'a> TryFrom<&'a rusqlite::Row<'a>> for User {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("discord_id")?,
            total_points: row.get("total_points")?,
            daily_streak: row.get("daily_streak")?,
            weekly_streak: row.get("weekly_streak")?,
            last_submission_date: db::parse_date(
                "last_submission_date",
                row.get("last_submission_date")?,
            )?,
            last_week_submitted: row.get("last_week_submitted")?,
            leetcode_username: row.get("leetcode_username")?,
            codeforces_handle: row.get("codeforces_handle")?,
            gfg_handle: row.get("gfg_handle")?,
            student_year: row.get("student_year")?,
        })
    }
}

fn handle_column(platform: Platform) -> &'static str {
    match platform {
        Platform::LeetCode => "leetcode_username",
        Platform::Codeforces => "codeforces_handle",
        Platform::GeeksforGeeks => "gfg_handle",
    }
}

/// Returns the user with id `id`, if they exist.
pub fn query_user(conn: &Connection, id: UserId) -> DBResult<Option<User>> {
    conn.prepare("SELECT * FROM Users WHERE discord_id = :id")?
        .query(rusqlite::named_params! { ":id": id })?
        .next()?
        .map(|row| row.try_into())
        .transpose()
}

/// Inserts a fresh user row, doing nothing if they already exist.
/// Returns `true` if the row was newly added.
pub fn insert_user(conn: &Connection, id: UserId, student_year: &str) -> DBResult<bool> {
    log::trace!("[insert_user] Inserting user {id} into Users...");

    conn.prepare(
        "INSERT INTO Users ( discord_id,  student_year)
         VALUES            (:discord_id, :student_year)",
    )?
    .execute(rusqlite::named_params! {
        ":discord_id":   id,
        ":student_year": student_year,
    })
    .map_or_else(db::swallow_constraint_violation, |_| Ok(true))
}

/// Claims `handle` as `id`'s identity on `platform`.
///
/// Handles are globally unique per platform; returns `false` if another
/// user already holds this one.
pub fn link_handle(
    conn: &Connection,
    id: UserId,
    platform: Platform,
    handle: &str,
) -> DBResult<bool> {
    log::trace!("[link_handle] Linking {} handle for user {id}...", platform);

    let column = handle_column(platform);
    conn.prepare(&format!(
        "UPDATE Users SET {column} = :handle WHERE discord_id = :id"
    ))?
    .execute(rusqlite::named_params! { ":handle": handle, ":id": id })
    .map_or_else(db::swallow_constraint_violation, |changed| Ok(changed > 0))
}

pub fn update_points(conn: &Connection, id: UserId, total_points: u64) -> DBResult<()> {
    conn.prepare("UPDATE Users SET total_points = :points WHERE discord_id = :id")?
        .execute(rusqlite::named_params! { ":points": total_points, ":id": id })?;
    Ok(())
}

pub fn update_streaks(
    conn: &Connection,
    id: UserId,
    daily: u32,
    weekly: u32,
    last_date: chrono::NaiveDate,
    last_week: &str,
) -> DBResult<()> {
    let query_params = rusqlite::named_params! {
        ":id":        id,
        ":daily":     daily,
        ":weekly":    weekly,
        ":last_date": last_date.to_string(),
        ":last_week": last_week,
    };

    conn.prepare(
        "UPDATE Users SET
            daily_streak = :daily,
            weekly_streak = :weekly,
            last_submission_date = :last_date,
            last_week_submitted = :last_week
         WHERE discord_id = :id",
    )?
    .execute(query_params)?;

    Ok(())
}

/// Top users by total points, descending; ties broken by id for stable output.
pub fn query_leaderboard(conn: &Connection, limit: u32) -> DBResult<Vec<User>> {
    log::trace!("[query_leaderboard] Querying top {limit} users.");

    let mut stmt = conn.prepare(
        "SELECT * FROM Users
         ORDER BY total_points DESC, discord_id ASC
         LIMIT :limit",
    )?;

    let users = stmt
        .query_map(rusqlite::named_params! { ":limit": limit }, |row| {
            User::try_from(row)
        })?
        .collect::<DBResult<Vec<User>>>()?;

    Ok(users)
}

/// Zeroes points and streaks, leaving linked handles in place.
pub fn reset_progress(conn: &Connection, id: UserId) -> DBResult<()> {
    conn.prepare(
        "UPDATE Users SET
            total_points = 0,
            daily_streak = 0,
            weekly_streak = 0,
            last_submission_date = NULL,
            last_week_submitted = NULL
         WHERE discord_id = :id",
    )?
    .execute(rusqlite::named_params! { ":id": id })?;

    Ok(())
}
