//! Follow-up date arithmetic for examination schedules.
//!
//! All functions are pure. Timestamps are clinic wall-clock times
//! (`NaiveDateTime`); inputs carrying an offset are normalized to UTC first.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Timelike};

const MILLIS_PER_DAY: i64 = 86_400_000;

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse an exam/follow-up date as sent by clients.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM[:SS[.fff]]` (`T` or space separator)
/// and plain `YYYY-MM-DD`, which is read as midnight.
pub fn parse_date_input(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_utc());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse a day count sent as text. Anything but a whole number is invalid.
pub fn parse_day_count(input: &str) -> Option<i64> {
    input.trim().parse::<i64>().ok()
}

/// Drop seconds and sub-second precision.
pub fn truncate_to_minute(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(dt)
}

/// `exam_date + num_days`, truncated to the minute.
///
/// `None` when the day count is negative or the exam date does not parse.
pub fn calculate_follow_up_date(exam_date: &str, num_days: i64) -> Option<NaiveDateTime> {
    if num_days < 0 {
        return None;
    }
    let exam = parse_date_input(exam_date)?;
    follow_up_from(exam, num_days)
}

pub fn follow_up_from(exam: NaiveDateTime, num_days: i64) -> Option<NaiveDateTime> {
    if num_days < 0 {
        return None;
    }
    let delta = TimeDelta::try_days(num_days)?;
    exam.checked_add_signed(delta).map(truncate_to_minute)
}

/// Whole days from exam to follow-up, rounded up.
///
/// `None` when either date does not parse or the follow-up precedes the exam.
pub fn calculate_days_difference(exam_date: &str, follow_up_date: &str) -> Option<i64> {
    let exam = parse_date_input(exam_date)?;
    let follow_up = parse_date_input(follow_up_date)?;
    days_between(exam, follow_up)
}

pub fn days_between(exam: NaiveDateTime, follow_up: NaiveDateTime) -> Option<i64> {
    let millis = (follow_up - exam).num_milliseconds();
    if millis < 0 {
        return None;
    }
    Some((millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY)
}
