//! Date helpers for grouping and filtering
//!
//! Pure functions over `NaiveDate`; all formatting is zero-padded
//! `YYYY-MM-DD`. Weeks start on Monday.

use chrono::naive::NaiveDate;
use chrono::Datelike;
use chrono::Days;
use chrono::Local;

/// Format a date as `YYYY-MM-DD`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` string back into a calendar date
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// The Monday of the week the given date falls in
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    let days_from_monday = u64::from(date.weekday().num_days_from_monday());

    date.checked_sub_days(Days::new(days_from_monday))
        .expect("week start is a representable date")
}

/// The Sunday of the week the given date falls in
#[allow(dead_code)] // calendar-view support
pub fn end_of_week(date: NaiveDate) -> NaiveDate {
    start_of_week(date)
        .checked_add_days(Days::new(6))
        .expect("week end is a representable date")
}

/// The first day of the month the given date falls in
pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).expect("every month has a first day")
}

/// The last day of the month the given date falls in
#[allow(dead_code)] // calendar-view support
pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    let next_month = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };

    next_month
        .and_then(|first| first.pred_opt())
        .expect("every month has a last day")
}

/// All dates between two dates, inclusive on both ends
#[allow(dead_code)] // calendar-view support
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = start;

    while current <= end {
        dates.push(current);

        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }

    dates
}

/// ISO week number of the given date
#[allow(dead_code)] // calendar-view support
pub fn week_number(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

/// Today on the local calendar
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Does the date fall on today?
pub fn is_today(date: NaiveDate) -> bool {
    date == today()
}

/// Does the date fall on yesterday?
pub fn is_yesterday(date: NaiveDate) -> bool {
    today()
        .pred_opt()
        .is_some_and(|yesterday| date == yesterday)
}
