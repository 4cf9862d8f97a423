//! Calendar-day date policy.
//!
//! Due dates are compared at day granularity in the server's local zone:
//! a task due "today" is never past, regardless of the hour. Two forms are
//! accepted: full RFC 3339 timestamps (converted to the local calendar day)
//! and bare `YYYY-MM-DD` dates (taken as-is, no zone math).
//!
//! Every predicate returns false for input it cannot parse. Rejecting a
//! task over a malformed date the model produced would be worse than
//! letting the user fix it in review.

use chrono::{DateTime, Local, NaiveDate, Utc};

/// Parses a date string to the calendar day it refers to.
///
/// RFC 3339 timestamps resolve to their local calendar day; bare dates
/// resolve to exactly the day written.
pub fn parse_calendar_day(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Local).date_naive());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// True when the date falls on a calendar day before today.
pub fn is_past_date(value: &str) -> bool {
    is_past_date_on(value, Local::now().date_naive())
}

/// [`is_past_date`] against an explicit "today".
pub fn is_past_date_on(value: &str, today: NaiveDate) -> bool {
    match parse_calendar_day(value) {
        Some(day) => day < today,
        None => false,
    }
}

/// True when the date falls on today or a later calendar day.
pub fn is_today_or_future(value: &str) -> bool {
    is_today_or_future_on(value, Local::now().date_naive())
}

/// [`is_today_or_future`] against an explicit "today".
pub fn is_today_or_future_on(value: &str, today: NaiveDate) -> bool {
    match parse_calendar_day(value) {
        Some(day) => day >= today,
        None => false,
    }
}

/// Local calendar day of an already-parsed timestamp.
pub fn local_day(ts: &DateTime<Utc>) -> NaiveDate {
    ts.with_timezone(&Local).date_naive()
}

/// True when the timestamp's local calendar day is before today.
pub fn timestamp_is_past(ts: &DateTime<Utc>) -> bool {
    local_day(ts) < Local::now().date_naive()
}
