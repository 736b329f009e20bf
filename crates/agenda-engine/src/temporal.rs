//! Deterministic temporal helpers for the agenda.
//!
//! Every instant in the agenda is a wall-clock [`NaiveDateTime`] in a single
//! configured zone. The zone is consulted only when the caller asks for
//! "today" relative to a UTC clock reading; everything else is plain calendar
//! arithmetic on naive values, so these functions never touch the system clock.
//!
//! # Functions
//!
//! - [`week_bounds`] — Monday 00:00:00 through Sunday 23:59:59 around an anchor date
//! - [`local_today`] — The calendar date of a UTC instant in a timezone
//! - [`parse_local_datetime`] / [`format_local_datetime`] — The `YYYY-MM-DD HH:MM[:SS]` wire form
//! - [`format_duration_label`] — `"{H}h {M}m"` duration labels

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::AgendaError;

/// Zone used when no configuration overrides it.
pub const DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";

const DATETIME_SECONDS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATETIME_MINUTES_FORMAT: &str = "%Y-%m-%d %H:%M";

// ── Week boundaries ─────────────────────────────────────────────────────────

/// Compute the Monday-start week containing `anchor`.
///
/// Returns the instants Monday 00:00:00 and Sunday 23:59:59 of that week.
///
/// # Errors
///
/// Returns [`AgendaError::InvalidDatetime`] when the week runs past the
/// representable calendar.
///
/// # Examples
///
/// ```
/// use agenda_engine::temporal::week_bounds;
/// use chrono::NaiveDate;
///
/// // Wednesday March 6, 2024
/// let (start, end) = week_bounds(NaiveDate::from_ymd_opt(2024, 3, 6).unwrap()).unwrap();
/// assert_eq!(start.to_string(), "2024-03-04 00:00:00");
/// assert_eq!(end.to_string(), "2024-03-10 23:59:59");
/// ```
pub fn week_bounds(anchor: NaiveDate) -> Result<(NaiveDateTime, NaiveDateTime), AgendaError> {
    let out_of_range =
        || AgendaError::InvalidDatetime(format!("week of {anchor} is out of range"));
    let monday = anchor
        .checked_sub_signed(Duration::days(anchor.weekday().num_days_from_monday() as i64))
        .ok_or_else(out_of_range)?;
    let sunday = monday
        .checked_add_signed(Duration::days(6))
        .ok_or_else(out_of_range)?;
    Ok((start_of_day(monday), end_of_day(sunday)))
}

/// 00:00:00 on `date`.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// 23:59:59 on `date`.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    // 23:59:59 is always a valid wall-clock time.
    date.and_hms_opt(23, 59, 59).unwrap_or_else(|| start_of_day(date))
}

// ── Zone resolution ─────────────────────────────────────────────────────────

/// Parse an IANA timezone name.
///
/// # Errors
///
/// Returns [`AgendaError::InvalidTimezone`] if the name is not a known IANA zone.
pub fn parse_timezone(s: &str) -> Result<Tz, AgendaError> {
    s.parse::<Tz>()
        .map_err(|_| AgendaError::InvalidTimezone(s.to_string()))
}

/// The calendar date of `now` as observed in `tz`.
pub fn local_today(now: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    now.with_timezone(tz).date_naive()
}

// ── Wire format ─────────────────────────────────────────────────────────────

/// Parse `"YYYY-MM-DD HH:MM"` or `"YYYY-MM-DD HH:MM:SS"`.
///
/// An ISO `T` separator is accepted as well.
///
/// # Errors
///
/// Returns [`AgendaError::InvalidDatetime`] if neither form matches.
pub fn parse_local_datetime(s: &str) -> Result<NaiveDateTime, AgendaError> {
    let normalized = s.trim().replacen('T', " ", 1);
    NaiveDateTime::parse_from_str(&normalized, DATETIME_SECONDS_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(&normalized, DATETIME_MINUTES_FORMAT))
        .map_err(|e| AgendaError::InvalidDatetime(format!("{s}: {e}")))
}

/// Format an instant in the wire form, dropping seconds when they are zero.
pub fn format_local_datetime(dt: &NaiveDateTime) -> String {
    if dt.second() == 0 {
        dt.format(DATETIME_MINUTES_FORMAT).to_string()
    } else {
        dt.format(DATETIME_SECONDS_FORMAT).to_string()
    }
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`AgendaError::InvalidDatetime`] on malformed input.
pub fn parse_date(s: &str) -> Result<NaiveDate, AgendaError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| AgendaError::InvalidDatetime(format!("{s}: {e}")))
}

/// Parse an `HH:MM` or `HH:MM:SS` time of day.
///
/// # Errors
///
/// Returns [`AgendaError::InvalidDatetime`] on malformed input.
pub fn parse_time(s: &str) -> Result<NaiveTime, AgendaError> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|e| AgendaError::InvalidDatetime(format!("{s}: {e}")))
}

/// Format a duration as `"{H}h {M}m"`, truncating leftover seconds.
///
/// Hours are not wrapped at 24 and negative durations clamp to zero.
pub fn format_duration_label(duration: Duration) -> String {
    let total_minutes = duration.num_minutes().max(0);
    format!("{}h {}m", total_minutes / 60, total_minutes % 60)
}

/// Serde adapter for the `YYYY-MM-DD HH:MM[:SS]` wire form.
pub mod local_datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_local_datetime(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_local_datetime(&raw).map_err(serde::de::Error::custom)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
