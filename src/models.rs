use chrono::{DateTime, NaiveDate, Utc};

/// Opaque platform-agnostic user identity (a chat-platform snowflake in practice).
pub type UserId = i64;

/// Default trailing window within which a platform-reported solve still counts.
/// 24 hours tolerates once-a-day submitters and clock skew around the POTD
/// rotation at midnight.
pub const DEFAULT_VERIFY_WINDOW_MINUTES: u64 = 1440;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    LeetCode,
    Codeforces,
    GeeksforGeeks,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::LeetCode => "LeetCode",
            Platform::Codeforces => "Codeforces",
            Platform::GeeksforGeeks => "GeeksforGeeks",
        }
    }

    pub fn parse(s: &str) -> Option<Platform> {
        match s {
            "LeetCode" => Some(Platform::LeetCode),
            "Codeforces" => Some(Platform::Codeforces),
            "GeeksforGeeks" => Some(Platform::GeeksforGeeks),
            _ => None,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn parse(s: &str) -> Option<Difficulty> {
        match s {
            "Easy" => Some(Difficulty::Easy),
            "Medium" => Some(Difficulty::Medium),
            "Hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical problem metadata as reported by (or synthesized for) a platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemMetadata {
    pub title: String,
    pub slug: String,
    pub difficulty: Difficulty,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,

    pub total_points: u64,
    pub daily_streak: u32,
    pub weekly_streak: u32,
    pub last_submission_date: Option<NaiveDate>,
    pub last_week_submitted: Option<String>,

    pub leetcode_username: Option<String>,
    pub codeforces_handle: Option<String>,
    pub gfg_handle: Option<String>,

    pub student_year: String,
}

impl User {
    /// The externally-linked handle for `platform`, if the user set one.
    pub fn handle_for(&self, platform: Platform) -> Option<&str> {
        match platform {
            Platform::LeetCode => self.leetcode_username.as_deref(),
            Platform::Codeforces => self.codeforces_handle.as_deref(),
            Platform::GeeksforGeeks => self.gfg_handle.as_deref(),
        }
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "**User Stats:**\n\
             \tTotal Points: {}\n\
             \tDaily Streak: {}\n\
             \tWeekly Streak: {}",
            self.total_points, self.daily_streak, self.weekly_streak
        )
    }
}

/// A problem row. Keyed by (slug, platform); the same slug on two platforms
/// is two distinct problems.
#[derive(Debug, Clone)]
pub struct Problem {
    pub slug: String,
    pub platform: Platform,

    pub title: String,
    pub difficulty: Difficulty,
    pub topic: String,
    pub student_year: String,

    pub is_potd: bool,
    pub potd_date: Option<NaiveDate>,
}

impl Problem {
    /// Is this problem today's featured challenge on its platform?
    pub fn is_potd_on(&self, date: NaiveDate) -> bool {
        self.is_potd && self.potd_date == Some(date)
    }
}

/// How a submission was confirmed, recorded for the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationKind {
    /// Platform confirmed a recent accepted solve.
    Verified,
    /// Accepted without confirmation (no verification API, or all sources down).
    Trusted,
}

impl VerificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationKind::Verified => "verified",
            VerificationKind::Trusted => "trusted",
        }
    }

    pub fn parse(s: &str) -> Option<VerificationKind> {
        match s {
            "verified" => Some(VerificationKind::Verified),
            "trusted" => Some(VerificationKind::Trusted),
            _ => None,
        }
    }
}

/// An accepted-and-credited submission. Immutable once created.
#[derive(Debug, Clone)]
pub struct SubmissionRecord {
    pub user: UserId,
    pub slug: String,
    pub platform: Platform,

    pub submitted_at: DateTime<Utc>,
    pub points_awarded: u64,
    pub verification: VerificationKind,
}
