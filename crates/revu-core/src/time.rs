//! Review clock: Unix-second timestamps, due dates and their UTC rendering.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::SECONDS_PER_DAY;

/// The Gregorian calendar repeats every 400 years.
const DAYS_PER_400_YEARS: u64 = 146_097;

const MONTH_LENGTHS: [u64; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Current UTC time as Unix seconds.
pub fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Due time for a review answered at `reviewed_at` with an interval of `interval_days`.
pub fn due_at(reviewed_at: u64, interval_days: u32) -> u64 {
    reviewed_at.saturating_add(u64::from(interval_days).saturating_mul(SECONDS_PER_DAY))
}

/// Whole days until `due`, zero once it has passed.
pub fn days_until(due: u64, now: u64) -> u64 {
    due.saturating_sub(now).div_ceil(SECONDS_PER_DAY)
}

/// Render a due time as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn unix_to_iso8601(secs: u64) -> String {
    let (year, month, day) = calendar_date(secs / SECONDS_PER_DAY);
    let clock = secs % SECONDS_PER_DAY;
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}Z",
        clock / 3600,
        clock % 3600 / 60,
        clock % 60
    )
}

fn is_leap_year(year: u64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn year_length(year: u64) -> u64 {
    if is_leap_year(year) { 366 } else { 365 }
}

/// (year, month, day) of the day `days_since_epoch` days after 1970-01-01.
fn calendar_date(days_since_epoch: u64) -> (u64, u64, u64) {
    let mut year = 1970 + 400 * (days_since_epoch / DAYS_PER_400_YEARS);
    let mut remaining = days_since_epoch % DAYS_PER_400_YEARS;

    while remaining >= year_length(year) {
        remaining -= year_length(year);
        year += 1;
    }

    let mut month = 1;
    for (i, &base) in MONTH_LENGTHS.iter().enumerate() {
        let length = if i == 1 && is_leap_year(year) { base + 1 } else { base };
        if remaining < length {
            break;
        }
        remaining -= length;
        month += 1;
    }

    (year, month, remaining + 1)
}
