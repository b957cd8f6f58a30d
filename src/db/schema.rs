pub const USERS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS Users (
        discord_id            INTEGER     PRIMARY KEY,

        total_points          INTEGER     NOT NULL    DEFAULT 0,
        daily_streak          INTEGER     NOT NULL    DEFAULT 0,
        weekly_streak         INTEGER     NOT NULL    DEFAULT 0,
        last_submission_date  TEXT,
        last_week_submitted   TEXT,

        leetcode_username     TEXT        UNIQUE,
        codeforces_handle     TEXT        UNIQUE,
        gfg_handle            TEXT        UNIQUE,

        student_year          TEXT        NOT NULL    DEFAULT 'Unknown'
    )";

pub const PROBLEMS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS Problems (
        slug           TEXT        NOT NULL,
        platform       TEXT        NOT NULL,

        title          TEXT        NOT NULL,
        difficulty     TEXT        NOT NULL,
        topic          TEXT        NOT NULL,
        student_year   TEXT        NOT NULL,

        is_potd        BOOLEAN     NOT NULL    DEFAULT 0,
        potd_date      TEXT,

        UNIQUE (slug, platform)
    )";

pub const SUBMISSIONS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS Submissions (
        discord_id     INTEGER     NOT NULL    REFERENCES Users(discord_id),
        problem_slug   TEXT        NOT NULL,
        platform       TEXT        NOT NULL,

        submitted_at   TIMESTAMP   NOT NULL,
        points_awarded INTEGER     NOT NULL,
        verification   TEXT        NOT NULL,

        UNIQUE (discord_id, problem_slug, platform)
    )";
