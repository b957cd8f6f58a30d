//! Daily and weekly streak advancement.
//!
//! Pure functions of (last submission date, last ISO-week label, today);
//! no I/O and no clock reads, so every boundary case is unit-testable.
//! Weeks follow ISO-8601 numbering (Monday start, ISO year-boundary rules).

use chrono::{Datelike, NaiveDate};

/// Result of advancing a user's streak state for one new submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakUpdate {
    pub daily: u32,
    pub weekly: u32,
    /// A submission already happened today; streaks unchanged, no bonus
    /// eligibility.
    pub maintained_today: bool,
    /// This submission is the first in a new ISO week.
    pub new_week: bool,
}

/// The ISO week label for a date, e.g. `2024-W52`.
///
/// Uses the ISO week-numbering year, which differs from the calendar year
/// around January 1st.
pub fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

fn parse_week_label(label: &str) -> Option<(i32, u32)> {
    let (year, week) = label.split_once("-W")?;
    Some((year.parse().ok()?, week.parse().ok()?))
}

/// Advance streak counters for a submission happening on `today`.
///
/// Daily: increments on an exactly-1-day gap, holds on a same-day repeat,
/// resets to 1 otherwise (including the first submission ever).
/// Weekly: increments on a consecutive ISO week (including the 52/53-week
/// December-to-January rollover), holds within the same week, resets to 1
/// on any other change.
pub fn advance(
    last_date: Option<NaiveDate>,
    last_week: Option<&str>,
    prior_daily: u32,
    prior_weekly: u32,
    today: NaiveDate,
) -> StreakUpdate {
    let mut maintained_today = false;

    let daily = match last_date {
        None => 1,
        Some(last) => match (today - last).num_days() {
            0 => {
                maintained_today = true;
                prior_daily.max(1)
            }
            1 => prior_daily + 1,
            _ => 1,
        },
    };

    let current_label = week_label(today);
    let (weekly, new_week) = match last_week {
        None => (1, true),
        Some(last) if last == current_label => (prior_weekly.max(1), false),
        Some(last) => match (parse_week_label(last), parse_week_label(&current_label)) {
            (Some((ly, lw)), Some((cy, cw))) => {
                let consecutive =
                    (cy == ly && cw == lw + 1) || (cy == ly + 1 && cw == 1 && lw >= 52);
                if consecutive {
                    (prior_weekly + 1, true)
                } else {
                    (1, true)
                }
            }
            // Unparseable stored label; start over rather than guess.
            _ => (1, true),
        },
    };

    StreakUpdate {
        daily,
        weekly,
        maintained_today,
        new_week,
    }
}
