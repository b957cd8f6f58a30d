use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::{self, DBResult};
use crate::models::{Difficulty, Platform, Problem};

impl<'a> TryFrom<&'a rusqlite::Row<'a>> for Problem {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        let platform: String = row.get("platform")?;
        let difficulty: String = row.get("difficulty")?;

        Ok(Self {
            slug: row.get("slug")?,
            platform: Platform::parse(&platform)
                .ok_or_else(|| db::column_error("platform", &platform))?,
            title: row.get("title")?,
            difficulty: Difficulty::parse(&difficulty)
                .ok_or_else(|| db::column_error("difficulty", &difficulty))?,
            topic: row.get("topic")?,
            student_year: row.get("student_year")?,
            is_potd: row.get("is_potd")?,
            potd_date: db::parse_date("potd_date", row.get("potd_date")?)?,
        })
    }
}

pub fn query_problem(
    conn: &Connection,
    slug: &str,
    platform: Platform,
) -> DBResult<Option<Problem>> {
    conn.prepare("SELECT * FROM Problems WHERE slug = :slug AND platform = :platform")?
        .query(rusqlite::named_params! {
            ":slug":     slug,
            ":platform": platform.as_str(),
        })?
        .next()?
        .map(|row| row.try_into())
        .transpose()
}

/// Inserts the problem into Problems, or does nothing if it already is there.
/// Returns `true` if it was newly added.
pub fn insert_problem(conn: &Connection, problem: &Problem) -> DBResult<bool> {
    log::trace!(
        "[insert_problem] Inserting problem {} ({}) into Problems...",
        problem.slug,
        problem.platform
    );

    let query_params = rusqlite::named_params! {
        ":slug":         problem.slug,
        ":platform":     problem.platform.as_str(),
        ":title":        problem.title,
        ":difficulty":   problem.difficulty.as_str(),
        ":topic":        problem.topic,
        ":student_year": problem.student_year,
        ":is_potd":      problem.is_potd,
        ":potd_date":    problem.potd_date.map(|d| d.to_string()),
    };

    conn.prepare(
        "INSERT INTO Problems ( slug,  platform,  title,  difficulty,  topic,
                                student_year,  is_potd,  potd_date)
         VALUES               (:slug, :platform, :title, :difficulty, :topic,
                               :student_year, :is_potd, :potd_date)",
    )?
    .execute(query_params)
    .map_or_else(db::swallow_constraint_violation, |_| Ok(true))
}

/// Flags an existing problem as the featured daily challenge for `date`.
/// Returns `false` if no such problem is known.
pub fn set_potd(
    conn: &Connection,
    slug: &str,
    platform: Platform,
    date: NaiveDate,
) -> DBResult<bool> {
    log::trace!("[set_potd] Marking {slug} ({platform}) as POTD for {date}...");

    let changed = conn
        .prepare(
            "UPDATE Problems SET is_potd = 1, potd_date = :date
             WHERE slug = :slug AND platform = :platform",
        )?
        .execute(rusqlite::named_params! {
            ":date":     date.to_string(),
            ":slug":     slug,
            ":platform": platform.as_str(),
        })?;

    Ok(changed > 0)
}
