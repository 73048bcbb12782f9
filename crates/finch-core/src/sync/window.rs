use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;

/// Inclusive fetch window for a transaction sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Computes the fetch window for a transaction sync: the end date defaults
/// to today, and the start date is the end date moved back `months_back`
/// calendar months with day clamping, so `(6, 2024-12-31)` starts at
/// `2024-06-30`.
pub fn calculate_date_range(months_back: u32, end_date: Option<NaiveDate>) -> DateRange {
    let end = end_date.unwrap_or_else(today_utc);
    let offset = i32::try_from(months_back).unwrap_or(i32::MAX);
    DateRange {
        start: add_months_clamped(end, -offset),
        end,
    }
}

pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Epoch-second window `[start-of-start-day, start-of-day-after-end)` for
/// providers that filter by UNIX timestamps.
pub fn epoch_window(range: &DateRange) -> (i64, i64) {
    (
        day_start_epoch(range.start),
        day_start_epoch(range.end.succ_opt().unwrap_or(range.end)),
    )
}

/// Epoch-second bounds of a calendar month: `[start-of-month,
/// start-of-next-month)`. Consecutive months are contiguous.
pub fn month_bounds(year: i32, month: u32) -> Option<(i64, i64)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = add_months_clamped(start, 1);
    Some((day_start_epoch(start), day_start_epoch(next)))
}

pub fn add_months_clamped(date: NaiveDate, months: i32) -> NaiveDate {
    let current_month = i32::try_from(date.month()).unwrap_or(1);
    let mut raw_month = current_month + months;
    let mut year = date.year();

    while raw_month > 12 {
        raw_month -= 12;
        year += 1;
    }
    while raw_month < 1 {
        raw_month += 12;
        year -= 1;
    }

    let month_u32 = u32::try_from(raw_month).unwrap_or(1);
    let day = date.day().min(days_in_month(year, month_u32));
    if let Some(result) = NaiveDate::from_ymd_opt(year, month_u32, day) {
        return result;
    }
    date
}

fn day_start_epoch(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|instant| instant.and_utc().timestamp())
        .unwrap_or_default()
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 31,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
