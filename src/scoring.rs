//! Points computation: difficulty base, POTD ordinal bonuses, streak bonuses.
//!
//! The engine is pure; everything time- or store-dependent (is this the
//! POTD, how many POTD solves today, the streak update) arrives as input.

use crate::models::Difficulty;
use crate::streak::StreakUpdate;

pub const EASY_POINTS: u64 = 5;
pub const MEDIUM_POINTS: u64 = 10;
pub const HARD_POINTS: u64 = 15;

/// POTD pays the top tier; it is the premium daily incentive.
pub const POTD_POINTS: u64 = HARD_POINTS;
/// Bonus for the second POTD solve of the day on a platform.
pub const POTD_SECOND_BONUS: u64 = 5;
/// Bonus for the third. Further solves earn no extra.
pub const POTD_THIRD_BONUS: u64 = 10;

/// Flat rate for platforms with no native difficulty signal (GFG).
pub const FLAT_RATE_POINTS: u64 = MEDIUM_POINTS;

pub const DAILY_STREAK_BONUS: u64 = 5;
pub const WEEKLY_STREAK_BONUS: u64 = 20;

pub fn base_points(difficulty: Difficulty) -> u64 {
    match difficulty {
        Difficulty::Easy => EASY_POINTS,
        Difficulty::Medium => MEDIUM_POINTS,
        Difficulty::Hard => HARD_POINTS,
    }
}

/// Everything the engine needs to price one accepted submission.
#[derive(Debug, Clone)]
pub struct ScoreInput {
    pub difficulty: Difficulty,
    /// Platform reports no real difficulty; score at the flat rate instead
    /// of the difficulty table.
    pub flat_rate: bool,
    /// The problem is today's POTD on this platform.
    pub is_potd: bool,
    /// POTD solves already credited to this user on this platform today.
    pub potd_solved_today: u32,
    pub streaks: StreakUpdate,
}

/// Itemized result; `total()` is what gets awarded and every part is
/// non-negative by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub base: u64,
    pub base_label: &'static str,
    pub potd_bonus: u64,
    pub daily_bonus: u64,
    pub weekly_bonus: u64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u64 {
        self.base + self.potd_bonus + self.daily_bonus + self.weekly_bonus
    }

    pub fn bonus_total(&self) -> u64 {
        self.potd_bonus + self.daily_bonus + self.weekly_bonus
    }
}

/// Compute the score for a verified, non-duplicate submission.
///
/// Duplicates are rejected upstream and never reach this function.
pub fn score(input: &ScoreInput) -> ScoreBreakdown {
    let (base, base_label) = if input.is_potd {
        (POTD_POINTS, "POTD")
    } else if input.flat_rate {
        (FLAT_RATE_POINTS, "Flat")
    } else {
        (base_points(input.difficulty), input.difficulty.as_str())
    };

    // Ordinal of this solve among today's POTD solves: count existing + 1.
    let potd_bonus = if input.is_potd {
        match input.potd_solved_today + 1 {
            2 => POTD_SECOND_BONUS,
            3 => POTD_THIRD_BONUS,
            _ => 0,
        }
    } else {
        0
    };

    // Streak bonuses only on the first submission of the day, so repeated
    // submissions cannot farm them.
    let (daily_bonus, weekly_bonus) = if input.streaks.maintained_today {
        (0, 0)
    } else {
        (
            if input.streaks.daily > 1 { DAILY_STREAK_BONUS } else { 0 },
            if input.streaks.new_week && input.streaks.weekly > 1 {
                WEEKLY_STREAK_BONUS
            } else {
                0
            },
        )
    };

    ScoreBreakdown {
        base,
        base_label,
        potd_bonus,
        daily_bonus,
        weekly_bonus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_streaks() -> StreakUpdate {
        StreakUpdate {
            daily: 1,
            weekly: 1,
            maintained_today: false,
            new_week: true,
        }
    }

    fn input(difficulty: Difficulty) -> ScoreInput {
        ScoreInput {
            difficulty,
            flat_rate: false,
            is_potd: false,
            potd_solved_today: 0,
            streaks: fresh_streaks(),
        }
    }

    #[test]
    fn difficulty_table() {
        assert_eq!(score(&input(Difficulty::Easy)).total(), EASY_POINTS);
        assert_eq!(score(&input(Difficulty::Medium)).total(), MEDIUM_POINTS);
        assert_eq!(score(&input(Difficulty::Hard)).total(), HARD_POINTS);
    }

    #[test]
    fn flat_rate_overrides_difficulty() {
        let mut i = input(Difficulty::Easy);
        i.flat_rate = true;
        let breakdown = score(&i);
        assert_eq!(breakdown.base, FLAT_RATE_POINTS);
        assert_eq!(breakdown.base_label, "Flat");
    }

    #[test]
    fn potd_ordinal_bonuses() {
        let mut i = input(Difficulty::Easy);
        i.is_potd = true;
        // Streaks already counted today so only POTD components show up.
        i.streaks.maintained_today = true;

        i.potd_solved_today = 0;
        assert_eq!(score(&i).total(), POTD_POINTS);

        i.potd_solved_today = 1;
        assert_eq!(score(&i).total(), POTD_POINTS + POTD_SECOND_BONUS);

        i.potd_solved_today = 2;
        assert_eq!(score(&i).total(), POTD_POINTS + POTD_THIRD_BONUS);

        // Fourth and beyond: base only, same as the first.
        i.potd_solved_today = 3;
        assert_eq!(score(&i).total(), POTD_POINTS);
        i.potd_solved_today = 7;
        assert_eq!(score(&i).total(), POTD_POINTS);
    }

    #[test]
    fn potd_base_ignores_reported_difficulty() {
        let mut i = input(Difficulty::Easy);
        i.is_potd = true;
        assert_eq!(score(&i).base, POTD_POINTS);
        assert_eq!(score(&i).base_label, "POTD");
    }

    #[test]
    fn daily_bonus_requires_continuing_streak() {
        let mut i = input(Difficulty::Medium);
        // Fresh start: streak of 1 earns no bonus.
        assert_eq!(score(&i).daily_bonus, 0);

        i.streaks.daily = 2;
        assert_eq!(score(&i).daily_bonus, DAILY_STREAK_BONUS);
    }

    #[test]
    fn weekly_bonus_requires_new_week_and_continuation() {
        let mut i = input(Difficulty::Medium);
        i.streaks.weekly = 3;
        i.streaks.new_week = false;
        assert_eq!(score(&i).weekly_bonus, 0);

        i.streaks.new_week = true;
        assert_eq!(score(&i).weekly_bonus, WEEKLY_STREAK_BONUS);

        i.streaks.weekly = 1;
        assert_eq!(score(&i).weekly_bonus, 0);
    }

    #[test]
    fn no_streak_bonuses_on_repeat_submission_same_day() {
        let mut i = input(Difficulty::Hard);
        i.streaks = StreakUpdate {
            daily: 9,
            weekly: 4,
            maintained_today: true,
            new_week: false,
        };
        let breakdown = score(&i);
        assert_eq!(breakdown.daily_bonus, 0);
        assert_eq!(breakdown.weekly_bonus, 0);
        assert_eq!(breakdown.total(), HARD_POINTS);
    }

    #[test]
    fn totals_are_sums_of_parts() {
        let mut i = input(Difficulty::Easy);
        i.is_potd = true;
        i.potd_solved_today = 1;
        i.streaks = StreakUpdate {
            daily: 3,
            weekly: 2,
            maintained_today: false,
            new_week: true,
        };
        let breakdown = score(&i);
        assert_eq!(
            breakdown.total(),
            POTD_POINTS + POTD_SECOND_BONUS + DAILY_STREAK_BONUS + WEEKLY_STREAK_BONUS
        );
        assert_eq!(breakdown.bonus_total(), breakdown.total() - breakdown.base);
    }
}
