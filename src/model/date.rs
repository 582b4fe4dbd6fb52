//! Timestamp parsing and formatting for the `created` field.
//!
//! The wire format is ISO 8601 with a numeric offset and whole seconds,
//! e.g. `2004-02-12T15:19:21+00:00`.

use chrono::{
    DateTime, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone,
};
use tracing::warn;

/// Render a timestamp the way the server expects it.
pub fn format_created(dt: &DateTime<FixedOffset>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// The current local time, truncated to whole seconds.
pub fn now() -> DateTime<FixedOffset> {
    let now = Local::now().fixed_offset();
    from_epoch_in(now.timestamp(), now.offset()).unwrap_or(now)
}

/// Convert a Unix timestamp into local time.
pub fn from_epoch(secs: i64) -> Option<DateTime<FixedOffset>> {
    match Local.timestamp_opt(secs, 0) {
        LocalResult::Single(dt) => Some(dt.fixed_offset()),
        LocalResult::Ambiguous(dt, _) => Some(dt.fixed_offset()),
        LocalResult::None => None,
    }
}

fn from_epoch_in(secs: i64, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    offset.timestamp_opt(secs, 0).single()
}

/// Parse a free-form date string.
///
/// Supports ISO 8601 / RFC 3339, RFC 2822, bare Unix timestamps, and a set
/// of common layouts. Strings without an offset are taken as local time.
pub fn parse_date(date_str: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(secs) = trimmed.parse::<i64>() {
        return from_epoch(secs);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt);
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt);
    }

    let no_dow = strip_day_of_week(trimmed);

    let with_offset = [
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S%z",
        "%d %b %Y %H:%M:%S %z",
        "%d %B %Y %H:%M:%S %z",
    ];
    let local = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
        "%d %b %Y %H:%M:%S",
        "%d %b %Y %H:%M",
        "%b %d %Y %H:%M:%S",
        "%B %d %Y %H:%M",
    ];
    let date_only = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %b %Y", "%B %d, %Y", "%b %d, %Y"];

    let candidates = [no_dow.clone(), replace_named_tz(&no_dow)];
    for candidate in &candidates {
        for fmt in &with_offset {
            if let Ok(dt) = DateTime::parse_from_str(candidate, fmt) {
                return Some(dt);
            }
        }
    }

    for fmt in &local {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(&no_dow, fmt) {
            return local_from_naive(&ndt);
        }
    }

    for fmt in &date_only {
        if let Ok(date) = NaiveDate::parse_from_str(&no_dow, fmt) {
            return date.and_hms_opt(0, 0, 0).and_then(|ndt| local_from_naive(&ndt));
        }
    }

    warn!(date = trimmed, "Could not parse date");
    None
}

fn local_from_naive(ndt: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    match Local.from_local_datetime(ndt) {
        LocalResult::Single(dt) => Some(dt.fixed_offset()),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.fixed_offset()),
        LocalResult::None => None,
    }
}

/// Strip a leading day-of-week prefix (e.g. "Thu, " or "Thu ").
fn strip_day_of_week(s: &str) -> String {
    let days = [
        "Mon,", "Tue,", "Wed,", "Thu,", "Fri,", "Sat,", "Sun,", "Mon ", "Tue ", "Wed ", "Thu ",
        "Fri ", "Sat ", "Sun ",
    ];
    for day in &days {
        if let Some(rest) = s.strip_prefix(day) {
            return rest.trim().to_string();
        }
    }
    s.to_string()
}

/// Replace well-known timezone abbreviations with numeric offsets.
fn replace_named_tz(s: &str) -> String {
    let tzs = [
        ("EST", "-0500"),
        ("EDT", "-0400"),
        ("CST", "-0600"),
        ("CDT", "-0500"),
        ("MST", "-0700"),
        ("MDT", "-0600"),
        ("PST", "-0800"),
        ("PDT", "-0700"),
        ("GMT", "+0000"),
        ("UTC", "+0000"),
        ("CET", "+0100"),
        ("CEST", "+0200"),
    ];
    // Only a whole trailing token counts: "CEST" must not match "EST".
    let Some((head, zone)) = s.rsplit_once(' ') else {
        return s.to_string();
    };
    match tzs.iter().find(|(name, _)| *name == zone) {
        Some((_, offset)) => format!("{head} {offset}"),
        None => s.to_string(),
    }
}
