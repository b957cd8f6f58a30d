//! Canonicalizes raw user input into platform-comparable problem keys.
//!
//! Pure string work, no I/O. Each platform gets its own rule:
//! slugs for LeetCode, slug-or-URL for GeeksforGeeks, and a fixed
//! `<contest><index>` format for Codeforces.

use itertools::Itertools;

use crate::models::Platform;

/// A parsed Codeforces problem reference, e.g. `1872A` or `1872A1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContestRef {
    pub contest: u32,
    pub index: String,
}

impl std::fmt::Display for ContestRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.contest, self.index)
    }
}

/// Normalize a problem name to slug form: lowercase, spaces to hyphens,
/// repeated hyphens collapsed, leading/trailing hyphens trimmed.
///
/// `"Two Sum"` becomes `"two-sum"`.
pub fn slugify(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .coalesce(|a, b| {
            if a == '-' && b == '-' {
                Ok('-')
            } else {
                Err((a, b))
            }
        })
        .collect::<String>()
        .trim_matches('-')
        .to_string()
}

/// Extract the slug from a GeeksforGeeks problem URL, or fall back to
/// treating the input as a raw slug.
///
/// `"https://www.geeksforgeeks.org/problems/detect-cycle/1"` becomes
/// `"detect-cycle"`.
pub fn gfg_slug(raw: &str) -> String {
    let url_pattern = regex::Regex::new(r"geeksforgeeks\.org/problems/([A-Za-z0-9_-]+)").unwrap();
    if let Some(caps) = url_pattern.captures(raw.trim()) {
        return slugify(&caps[1]);
    }
    slugify(raw)
}

/// Parse a Codeforces identifier: one or more digits (contest id) followed
/// by one letter and an optional single digit (problem index).
///
/// Returns `None` for anything that doesn't match; malformed input is a
/// normal outcome here, not an error.
pub fn parse_codeforces(raw: &str) -> Option<ContestRef> {
    let pattern = regex::Regex::new(r"^(\d+)([A-Z]\d?)$").unwrap();
    let cleaned = raw.trim().to_uppercase();
    let caps = pattern.captures(&cleaned)?;
    let contest = caps[1].parse::<u32>().ok()?;
    Some(ContestRef {
        contest,
        index: caps[2].to_string(),
    })
}

/// Canonicalize `raw` into the comparable key for `platform`.
///
/// `None` means the input cannot name a problem on that platform
/// (currently only possible for Codeforces).
pub fn normalize(platform: Platform, raw: &str) -> Option<String> {
    match platform {
        Platform::LeetCode => {
            let slug = slugify(raw);
            (!slug.is_empty()).then_some(slug)
        }
        Platform::GeeksforGeeks => {
            let slug = gfg_slug(raw);
            (!slug.is_empty()).then_some(slug)
        }
        Platform::Codeforces => parse_codeforces(raw).map(|r| r.to_string()),
    }
}

/// Turn a slug back into a display title: `"two-sum"` becomes `"Two Sum"`.
///
/// Used when a trust-based path has nothing better than the slug itself.
pub fn humanize(slug: &str) -> String {
    slug.split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .join(" ")
}
