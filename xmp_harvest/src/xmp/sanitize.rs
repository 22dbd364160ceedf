//! Cleans up raw property text before it reaches a record.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Trims a value and strips control characters.
///
/// Newlines and tabs survive, since descriptions use them.
pub fn sanitize_text(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t'))
        .collect::<String>()
        .trim()
        .to_owned()
}

/// Date-time layouts without a UTC offset. These are read as UTC.
///
/// Note: `%.f` also matches when there's no fractional part.
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y:%m:%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Date-time layouts with an offset that RFC 3339 doesn't cover.
const OFFSET_LAYOUTS: &[&str] = &["%Y-%m-%dT%H:%M%#z", "%Y:%m:%d %H:%M:%S%#z"];

/// Parses an XMP date into a UTC timestamp.
///
/// XMP dates are ISO 8601 subsets, but plenty of tools write Exif-style
/// dates (`2021:06:21 19:45:00`) instead, so we take those too.
///
/// Returns `None` for blank, zeroed (`0000:00:00 ...`), and unreadable dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let text: String = sanitize_text(raw);
    if text.is_empty() || text.starts_with("0000") {
        return None;
    }

    if let Ok(t) = DateTime::parse_from_rfc3339(&text) {
        return Some(t.with_timezone(&Utc));
    }

    if let Some(t) = OFFSET_LAYOUTS
        .iter()
        .find_map(|layout| DateTime::parse_from_str(&text, layout).ok())
    {
        return Some(t.with_timezone(&Utc));
    }

    if let Some(t) = NAIVE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(&text, layout).ok())
    {
        return Some(t.and_utc());
    }

    if let Some(t) = NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Some(t.and_utc());
    }

    log::warn!("Couldn't read XMP date: `{text}`");
    None
}
