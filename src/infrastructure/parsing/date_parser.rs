//! Sold-date phrase resolution.
//!
//! The site displays sale dates as relative phrases ("3 days ago") or short
//! absolute dates ("Sold Mar 4" / "Sold Mar 4, 2024"). Resolution is always
//! relative to an explicit `now` so filtering decisions are reproducible
//! under a fixed clock.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Dates older than this are rejected outright, independent of the caller's
/// requested window. The site itself does not surface sales beyond 90 days,
/// so anything older is a mis-parse.
const STALENESS_GUARD_DAYS: i64 = 90;

static SOLD_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)sold\s*").unwrap());
static ENDED_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)ended\s*").unwrap());
static TODAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)today|just now").unwrap());
static RELATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*(day|days|hour|hours|minute|minutes)\s*ago").unwrap()
});
static MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+(\d{1,2})(?:\s+(\d{4}))?$",
    )
    .unwrap()
});
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const MONTH_NAMES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Resolve a free-text sold phrase to an absolute timestamp.
///
/// Returns `None` for empty, unparseable, or stale (> 90 days old) input.
/// Callers must treat `None` as "keep, age unknown", not as an exclusion.
pub fn parse_sold_date(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let cleaned = SOLD_PREFIX.replace(text, "");
    let cleaned = ENDED_PREFIX.replace(&cleaned, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    if TODAY.is_match(cleaned) {
        return Some(now);
    }

    if let Some(caps) = RELATIVE.captures(cleaned) {
        let amount: i64 = caps[1].parse().ok()?;
        let unit = caps[2].to_lowercase();
        let offset = if unit.starts_with("day") {
            Duration::days(amount)
        } else if unit.starts_with("hour") {
            Duration::hours(amount)
        } else {
            Duration::minutes(amount)
        };
        return Some(now - offset);
    }

    // Absolute dates: normalize separators, then match "Month Day [Year]".
    let normalized = cleaned.replace(['-', ','], " ");
    let normalized = WHITESPACE.replace_all(normalized.trim(), " ");
    let caps = MONTH_DAY.captures(&normalized)?;

    let month = month_number(&caps[1])?;
    let day: u32 = caps[2].parse().ok()?;
    let mut year: i32 = match caps.get(3) {
        Some(explicit) => explicit.as_str().parse().ok()?,
        None => now.year(),
    };

    let mut resolved = Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single()?;
    // A date in the future means the sale happened late last year and the
    // site omitted the year (common around January).
    if resolved > now {
        year -= 1;
        resolved = Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single()?;
    }

    if resolved < now - Duration::days(STALENESS_GUARD_DAYS) {
        return None;
    }
    Some(resolved)
}

fn month_number(name: &str) -> Option<u32> {
    let prefix = name.to_lowercase();
    let prefix = prefix.get(..3)?;
    MONTH_NAMES
        .iter()
        .position(|m| *m == prefix)
        .map(|index| index as u32 + 1)
}
