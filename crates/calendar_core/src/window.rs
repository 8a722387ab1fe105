//! Time-window math shared by every event store backend.
//!
//! # Responsibility
//! - Turn day/week/month/upcoming queries into half-open millisecond ranges.
//! - Keep instant normalization in one place so backends agree exactly.
//!
//! # Invariants
//! - All windows are UTC and half-open: `start_ms <= t < end_ms`.
//! - Weeks start on Monday 00:00 (ISO 8601).

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;
const DAYS_PER_WEEK: i64 = 7;
// 1970-01-01 was a Thursday, three days after a Monday.
const EPOCH_DAYS_FROM_MONDAY: i64 = 3;

/// Half-open `[start_ms, end_ms)` range over epoch milliseconds.
///
/// `end_ms = None` means the window is unbounded on the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_ms: i64,
    pub end_ms: Option<i64>,
}

impl TimeWindow {
    /// Returns whether an epoch-millisecond instant falls inside the window.
    pub fn contains_ms(&self, ms: i64) -> bool {
        ms >= self.start_ms && self.end_ms.map_or(true, |end| ms < end)
    }

    /// Returns whether an instant falls inside the window.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.contains_ms(epoch_ms(instant))
    }
}

/// Converts an instant to epoch milliseconds, flooring sub-millisecond parts.
pub fn epoch_ms(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_millis()
}

/// Converts epoch milliseconds back to an instant.
///
/// Returns `None` outside chrono's representable range.
pub fn from_epoch_ms(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

/// Drops sub-millisecond precision from an instant.
pub fn truncate_to_millis(instant: DateTime<Utc>) -> DateTime<Utc> {
    from_epoch_ms(epoch_ms(instant)).unwrap_or(instant)
}

/// Window of every instant at or after `from`.
pub fn upcoming_from(from: DateTime<Utc>) -> TimeWindow {
    TimeWindow {
        start_ms: epoch_ms(from),
        end_ms: None,
    }
}

/// Window `[midnight(date), midnight(date) + 24h)` in UTC.
pub fn day_containing(date: DateTime<Utc>) -> TimeWindow {
    let day = epoch_ms(date).div_euclid(MS_PER_DAY);
    TimeWindow {
        start_ms: day * MS_PER_DAY,
        end_ms: Some((day + 1) * MS_PER_DAY),
    }
}

/// Window from the Monday 00:00 of the ISO week containing `date` to the
/// following Monday 00:00.
pub fn iso_week_containing(date: DateTime<Utc>) -> TimeWindow {
    let day = epoch_ms(date).div_euclid(MS_PER_DAY);
    let monday = day - (day + EPOCH_DAYS_FROM_MONDAY).rem_euclid(DAYS_PER_WEEK);
    TimeWindow {
        start_ms: monday * MS_PER_DAY,
        end_ms: Some((monday + DAYS_PER_WEEK) * MS_PER_DAY),
    }
}

/// Window covering the calendar month (UTC) containing `date`.
///
/// Returns `None` only when the next month falls outside chrono's range.
pub fn month_containing(date: DateTime<Utc>) -> Option<TimeWindow> {
    let (year, month) = (date.year(), date.month());
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };

    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    Some(TimeWindow {
        start_ms: epoch_ms(first.and_time(NaiveTime::MIN).and_utc()),
        end_ms: Some(epoch_ms(next_first.and_time(NaiveTime::MIN).and_utc())),
    })
}

#[cfg(test)]
mod tests {
    use super::{day_containing, iso_week_containing, month_containing, upcoming_from};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn day_window_excludes_neighbouring_seconds() {
        let window = day_containing(at(2025, 6, 13, 15, 30, 0));
        assert!(window.contains(at(2025, 6, 13, 0, 0, 0)));
        assert!(window.contains(at(2025, 6, 13, 23, 59, 59)));
        assert!(!window.contains(at(2025, 6, 12, 23, 59, 59)));
        assert!(!window.contains(at(2025, 6, 14, 0, 0, 0)));
    }

    #[test]
    fn day_window_handles_pre_epoch_dates() {
        let window = day_containing(at(1969, 12, 31, 12, 0, 0));
        assert!(window.contains(at(1969, 12, 31, 0, 0, 0)));
        assert!(!window.contains(at(1970, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn week_window_starts_on_monday() {
        // 2025-06-13 is a Friday; its ISO week runs Mon 06-09 .. Mon 06-16.
        let window = iso_week_containing(at(2025, 6, 13, 8, 0, 0));
        assert!(window.contains(at(2025, 6, 9, 0, 0, 0)));
        assert!(window.contains(at(2025, 6, 15, 23, 59, 59)));
        assert!(!window.contains(at(2025, 6, 8, 23, 59, 59)));
        assert!(!window.contains(at(2025, 6, 16, 0, 0, 0)));
    }

    #[test]
    fn week_window_for_sunday_and_monday_inputs() {
        let sunday = iso_week_containing(at(2025, 6, 15, 23, 0, 0));
        let monday = iso_week_containing(at(2025, 6, 9, 0, 0, 0));
        assert_eq!(sunday, monday);
    }

    #[test]
    fn month_window_rolls_over_december() {
        let window = month_containing(at(2024, 12, 31, 23, 0, 0)).unwrap();
        assert!(window.contains(at(2024, 12, 1, 0, 0, 0)));
        assert!(!window.contains(at(2025, 1, 1, 0, 0, 0)));
        assert!(!window.contains(at(2024, 11, 30, 23, 59, 59)));
    }

    #[test]
    fn month_window_covers_leap_day() {
        let window = month_containing(at(2024, 2, 10, 0, 0, 0)).unwrap();
        assert!(window.contains(at(2024, 2, 29, 12, 0, 0)));
        assert!(!window.contains(at(2024, 3, 1, 0, 0, 0)));
    }

    #[test]
    fn upcoming_window_is_inclusive_at_from() {
        let from = at(2025, 6, 13, 10, 0, 0);
        let window = upcoming_from(from);
        assert!(window.contains(from));
        assert!(window.contains(from + Duration::days(3650)));
        assert!(!window.contains(from - Duration::milliseconds(1)));
    }
}
