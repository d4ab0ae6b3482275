//! Day buckets for activity dates
//!
//! Activity rows store their date as a "YYYY-MM-DD" day bucket in UTC. The
//! helpers here convert between those strings and `NaiveDate`.

use chrono::{Days, NaiveDate, Utc};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// Format a date as its day bucket
pub fn day_bucket(date: NaiveDate) -> String {
    date.format(DAY_FORMAT).to_string()
}

/// Today's date in UTC
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parse a day bucket.
///
/// Full timestamps ("2024-03-01 12:30:00") are accepted and truncated to
/// their day.
pub fn parse_day_bucket(bucket: &str) -> Option<NaiveDate> {
    let day = bucket.get(..10)?;
    NaiveDate::parse_from_str(day, DAY_FORMAT).ok()
}

/// First day bucket inside a window of `days` days ending with `today`
pub fn window_start(today: NaiveDate, days: u32) -> String {
    days_before(today, days.saturating_sub(1))
}

/// Day bucket `days` days before `today`
pub fn days_before(today: NaiveDate, days: u32) -> String {
    let back = Days::new(u64::from(days));
    day_bucket(today.checked_sub_days(back).unwrap_or(NaiveDate::MIN))
}
