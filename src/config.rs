//! Runtime configuration, loaded from the environment (a `.env` in the
//! project root works via dotenv). Everything has a sensible default so a
//! bare `grindbot` invocation just runs.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::models::DEFAULT_VERIFY_WINDOW_MINUTES;
use crate::pipeline::DEFAULT_COOLDOWN;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub cooldown: Duration,
    pub verify_window_minutes: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let db_path = env::var("GRINDBOT_DB").unwrap_or_else(|_| "grindbot.db".to_string());

        let cooldown = match env::var("GRINDBOT_COOLDOWN_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.parse()
                    .context("GRINDBOT_COOLDOWN_SECS must be a whole number of seconds")?,
            ),
            Err(_) => DEFAULT_COOLDOWN,
        };

        let verify_window_minutes = match env::var("GRINDBOT_VERIFY_WINDOW_MINUTES") {
            Ok(raw) => raw
                .parse()
                .context("GRINDBOT_VERIFY_WINDOW_MINUTES must be a whole number of minutes")?,
            Err(_) => DEFAULT_VERIFY_WINDOW_MINUTES,
        };

        Ok(Config {
            db_path,
            cooldown,
            verify_window_minutes,
        })
    }
}
