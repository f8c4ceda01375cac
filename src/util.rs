// Utility helpers for parsing and calendar arithmetic.
//
// This module centralizes the "dirty" date/timestamp handling so the rest of
// the code can assume clean, typed values.
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Parse a `YYYY-MM-DD` date while being forgiving about whitespace and
/// missing values.
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Trims whitespace.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Parse a timestamp in any of the shapes the backend emits.
///
/// The query endpoint returns full ISO-8601 with a UTC offset; the check-in
/// kiosks occasionally round-trip values without seconds. All of these are
/// accepted, with the offset stripped (timestamps are already local time):
/// - `2024-01-01T08:00:00+07:00`
/// - `2024-01-01T08:00:00`
/// - `2024-01-01T08:00`
pub fn parse_ts_safe(s: Option<&str>) -> Option<NaiveDateTime> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    None
}

/// First day of the month after `d`.
pub fn next_month(d: NaiveDate) -> NaiveDate {
    let (y, m) = if d.month() == 12 {
        (d.year() + 1, 1)
    } else {
        (d.year(), d.month() + 1)
    };
    // The 1st of a valid year/month always exists.
    NaiveDate::from_ymd_opt(y, m, 1).unwrap_or(d)
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for integer-like values. This is used
    // for counts in console messages (e.g., `9,855 records fetched`).
    n.to_formatted_string(&Locale::en)
}
