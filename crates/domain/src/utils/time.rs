//! Time parsing helpers shared by the CRUD façade and the sync engine.
//!
//! User input may be RFC 3339 or a naive `YYYY-MM-DD HH:MM[:SS]` timestamp,
//! the latter interpreted in the display timezone. Remote input is either an
//! all-day `YYYY-MM-DD` date or an RFC 3339 timestamp.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::{AlmanacError, Result};

const NAIVE_FORMATS: [&str; 4] =
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"];

/// Parse a user-supplied timestamp.
///
/// # Errors
/// Returns `AlmanacError::InvalidInput` when the value matches none of the
/// accepted formats or names a local time that does not exist in `tz`.
pub fn parse_user_time(value: &str, tz: Tz, field: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AlmanacError::InvalidInput(format!("{field} time is empty")));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| {
                    AlmanacError::InvalidInput(format!(
                        "{field} time '{value}' does not exist in timezone {tz}"
                    ))
                });
        }
    }

    Err(AlmanacError::InvalidInput(format!("invalid {field} time '{value}'")))
}

/// Parse a remote all-day date (`YYYY-MM-DD`) as midnight UTC.
pub fn parse_remote_date(value: &str, field: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        AlmanacError::InvalidInput(format!("invalid all-day {field} date '{value}': {e}"))
    })?;

    let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(|| {
        AlmanacError::InvalidInput(format!(
            "invalid all-day {field} date '{value}': could not derive midnight"
        ))
    })?;

    Ok(midnight.and_utc())
}

/// Parse a remote RFC 3339 timestamp; a missing offset is read as UTC.
pub fn parse_remote_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    let has_explicit_timezone = trimmed.ends_with('Z')
        || trimmed
            .rfind('T')
            .is_some_and(|idx| trimmed[idx + 1..].chars().any(|c| matches!(c, '+' | '-')));

    let candidate = if has_explicit_timezone { trimmed.to_string() } else { format!("{trimmed}Z") };

    DateTime::parse_from_rfc3339(&candidate)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AlmanacError::InvalidInput(format!("invalid {field} timestamp '{value}': {e}")))
}

/// UTC bounds `[start, end)` of a calendar day in `tz`.
pub fn day_bounds(date: NaiveDate, tz: Tz) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = local_midnight(date, tz)?;
    let next = date
        .succ_opt()
        .ok_or_else(|| AlmanacError::InvalidInput(format!("date {date} is out of range")))?;
    let end = local_midnight(next, tz)?;
    Ok((start, end))
}

fn local_midnight(date: NaiveDate, tz: Tz) -> Result<DateTime<Utc>> {
    let naive = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| AlmanacError::InvalidInput(format!("date {date} has no midnight")))?;

    // DST transitions at midnight: fall back to the first valid instant.
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + chrono::Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| AlmanacError::InvalidInput(format!("date {date} has no midnight in {tz}")))
}
