use std::env;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use dotenv::dotenv;

use grindbot::config::Config;
use grindbot::db::SqliteStore;
use grindbot::models::Platform;
use grindbot::pipeline::Engine;

fn parse_platform(raw: &str) -> Result<Platform> {
    match raw.to_lowercase().as_str() {
        "leetcode" | "lc" => Ok(Platform::LeetCode),
        "codeforces" | "cf" => Ok(Platform::Codeforces),
        "gfg" | "geeksforgeeks" => Ok(Platform::GeeksforGeeks),
        other => Err(anyhow!("unknown platform: {other} (try leetcode, codeforces, or gfg)")),
    }
}

fn usage() -> String {
    String::from(
        "\
Usage:
  grindbot link   <user-id> <platform> <handle>
  grindbot submit <user-id> <platform> <problem>
  grindbot top    [n]
  grindbot history <user-id> [n]
  grindbot potd   <platform> <slug>
  grindbot reset  <user-id>

Platforms: leetcode (lc), codeforces (cf), gfg",
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    dotenv().ok();

    let config = Config::from_env()?;
    let store = Arc::new(SqliteStore::open(&config.db_path)?);
    let engine = Engine::new(store.clone())
        .cooldown(config.cooldown)
        .verify_window_minutes(config.verify_window_minutes);

    let args: Vec<String> = env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        println!("{}", usage());
        return Ok(());
    };

    match (command.as_str(), rest) {
        ("link", [user, platform, handle]) => {
            let user = user.parse().context("user-id must be numeric")?;
            let platform = parse_platform(platform)?;
            if engine.link(user, platform, handle).await? {
                println!("Linked {platform} handle `{handle}` for user {user}.");
            } else {
                println!("That {platform} handle is already linked to another user.");
            }
        }
        ("submit", [user, platform, problem @ ..]) if !problem.is_empty() => {
            let user = user.parse().context("user-id must be numeric")?;
            let platform = parse_platform(platform)?;
            let outcome = engine.submit(user, platform, &problem.join(" ")).await;
            println!("{}", outcome.message());
        }
        ("top", rest) => {
            let limit = match rest {
                [] => 10,
                [n] => n.parse().context("n must be numeric")?,
                _ => bail!(usage()),
            };
            for (rank, user) in engine.leaderboard(limit).await?.iter().enumerate() {
                println!("{}. user {} — {} points", rank + 1, user.id, user.total_points);
            }
        }
        ("history", [user, rest @ ..]) => {
            let user = user.parse().context("user-id must be numeric")?;
            let limit = match rest {
                [] => 10,
                [n] => n.parse().context("n must be numeric")?,
                _ => bail!(usage()),
            };
            for record in engine.history(user, limit).await? {
                println!(
                    "{}  {} ({})  +{} [{}]",
                    record.submitted_at.format("%Y-%m-%d %H:%M"),
                    record.slug,
                    record.platform,
                    record.points_awarded,
                    record.verification.as_str(),
                );
            }
        }
        ("potd", [platform, slug]) => {
            use grindbot::db::Store;
            let platform = parse_platform(platform)?;
            let today = chrono::Utc::now().date_naive();
            if store.set_potd(slug, platform, today).await? {
                println!("Marked `{slug}` as today's {platform} POTD.");
            } else {
                println!("No known problem `{slug}` on {platform}.");
            }
        }
        ("reset", [user]) => {
            let user = user.parse().context("user-id must be numeric")?;
            engine.reset_user(user).await?;
            println!("Cleared progress for user {user}.");
        }
        _ => bail!(usage()),
    }

    Ok(())
}
