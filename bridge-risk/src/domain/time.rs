//! Time bucketing and cyclical time encodings.
//!
//! All timestamps are local civil time of the city (`NaiveDateTime`), since
//! bridge schedules and rush hours follow the local clock.
//!
//! Two kinds of bucket are used:
//! - `TimeBucket`: a 5-minute slot of the day plus a weekday/weekend flag,
//!   which is how historical opening rates are keyed.
//! - an absolute 5-minute bucket index (`absolute_bucket`), which identifies
//!   one concrete 5-minute window and keys the feature cache.

use std::f64::consts::TAU;

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// Bucket width in minutes.
pub const BUCKET_MINUTES: u32 = 5;

/// Bucket width in seconds.
pub const BUCKET_SECONDS: i64 = 300;

/// Number of 5-minute slots in a day.
pub const SLOTS_PER_DAY: u16 = 288;

const MINUTES_PER_DAY: f64 = 1440.0;
const DAYS_PER_WEEK: f64 = 7.0;

/// A 5-minute slot of the day, distinguishing weekdays from weekends.
///
/// # Examples
///
/// ```
/// use bridge_risk::domain::TimeBucket;
/// use chrono::NaiveDate;
///
/// // Friday 10:04 falls in slot 120 (10:00-10:05) on a weekday
/// let t = NaiveDate::from_ymd_opt(2025, 1, 24).unwrap().and_hms_opt(10, 4, 0).unwrap();
/// let bucket = TimeBucket::from_datetime(t);
/// assert_eq!(bucket.slot, 120);
/// assert!(!bucket.weekend);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeBucket {
    /// Minutes from midnight divided by 5 (0..288)
    pub slot: u16,
    /// Saturday or Sunday
    pub weekend: bool,
}

impl TimeBucket {
    /// Create a bucket, wrapping the slot into the day.
    pub fn new(slot: u16, weekend: bool) -> Self {
        Self {
            slot: slot % SLOTS_PER_DAY,
            weekend,
        }
    }

    /// Bucket containing the given time.
    pub fn from_datetime(t: NaiveDateTime) -> Self {
        let slot = (minute_of_day(t) / BUCKET_MINUTES) as u16;
        Self {
            slot,
            weekend: is_weekend(t),
        }
    }

    /// The bucket `n` slots earlier on the same kind of day.
    ///
    /// Wraps around midnight without changing the weekend flag, since
    /// opening rates are pooled per day kind.
    pub fn back(self, n: u16) -> Self {
        let slot = (self.slot as i32 - n as i32).rem_euclid(SLOTS_PER_DAY as i32) as u16;
        Self { slot, ..self }
    }

    /// Minute of day at which the slot starts.
    pub fn start_minute(self) -> u32 {
        self.slot as u32 * BUCKET_MINUTES
    }
}

/// Index of the absolute 5-minute window containing `t`.
///
/// Consecutive windows have consecutive indices; the index is stable across
/// process restarts.
pub fn absolute_bucket(t: NaiveDateTime) -> i64 {
    t.and_utc().timestamp().div_euclid(BUCKET_SECONDS)
}

/// Start time of an absolute 5-minute window.
pub fn bucket_start(bucket: i64) -> NaiveDateTime {
    chrono::DateTime::from_timestamp(bucket * BUCKET_SECONDS, 0)
        .map(|dt| dt.naive_utc())
        .unwrap_or_default()
}

/// Minutes since midnight (0..1440).
pub fn minute_of_day(t: NaiveDateTime) -> u32 {
    t.hour() * 60 + t.minute()
}

/// Day of week, Monday = 1 through Sunday = 7.
pub fn day_of_week(t: NaiveDateTime) -> u32 {
    t.weekday().number_from_monday()
}

/// Returns true on Saturday and Sunday.
pub fn is_weekend(t: NaiveDateTime) -> bool {
    matches!(t.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Encode a periodic value as `(sin, cos)` of its phase.
///
/// Values at the start and end of the period land next to each other,
/// which a linear model cannot otherwise see.
pub fn cyclical(x: f64, period: f64) -> (f64, f64) {
    let angle = TAU * x / period;
    (angle.sin(), angle.cos())
}

/// `(sin, cos)` of minute-of-day over a 1440-minute period.
pub fn minute_of_day_encoding(t: NaiveDateTime) -> (f64, f64) {
    cyclical(minute_of_day(t) as f64, MINUTES_PER_DAY)
}

/// `(sin, cos)` of day-of-week (Monday = 1) over a 7-day period.
pub fn day_of_week_encoding(t: NaiveDateTime) -> (f64, f64) {
    cyclical(day_of_week(t) as f64, DAYS_PER_WEEK)
}

/// Weekday morning (07:00-09:00) and evening (16:00-18:30) peaks.
pub fn is_rush_hour(t: NaiveDateTime) -> bool {
    if is_weekend(t) {
        return false;
    }
    let m = minute_of_day(t);
    (7 * 60..9 * 60).contains(&m) || (16 * 60..18 * 60 + 30).contains(&m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn bucket_slots() {
        // Monday 2025-01-27
        assert_eq!(TimeBucket::from_datetime(at(2025, 1, 27, 0, 0)).slot, 0);
        assert_eq!(TimeBucket::from_datetime(at(2025, 1, 27, 10, 4)).slot, 120);
        assert_eq!(TimeBucket::from_datetime(at(2025, 1, 27, 10, 5)).slot, 121);
        assert_eq!(TimeBucket::from_datetime(at(2025, 1, 27, 23, 59)).slot, 287);
    }

    #[test]
    fn weekend_flag() {
        assert!(!TimeBucket::from_datetime(at(2025, 1, 24, 12, 0)).weekend); // Friday
        assert!(TimeBucket::from_datetime(at(2025, 1, 25, 12, 0)).weekend); // Saturday
        assert!(TimeBucket::from_datetime(at(2025, 1, 26, 12, 0)).weekend); // Sunday
    }

    #[test]
    fn back_wraps_midnight() {
        let b = TimeBucket::new(1, true);
        assert_eq!(b.back(1), TimeBucket::new(0, true));
        assert_eq!(b.back(3), TimeBucket::new(286, true));
    }

    #[test]
    fn absolute_bucket_is_consecutive() {
        let a = absolute_bucket(at(2025, 1, 27, 8, 0));
        let b = absolute_bucket(at(2025, 1, 27, 8, 4));
        let c = absolute_bucket(at(2025, 1, 27, 8, 5));
        assert_eq!(a, b);
        assert_eq!(c, a + 1);
        assert_eq!(bucket_start(a), at(2025, 1, 27, 8, 0));
    }

    #[test]
    fn day_of_week_is_monday_based() {
        assert_eq!(day_of_week(at(2025, 1, 27, 8, 0)), 1);
        assert_eq!(day_of_week(at(2025, 2, 2, 8, 0)), 7);
    }

    #[test]
    fn cyclical_encoding_wraps() {
        let (s0, c0) = cyclical(0.0, 1440.0);
        let (s1, c1) = cyclical(1440.0, 1440.0);
        assert!((s0 - s1).abs() < 1e-12);
        assert!((c0 - c1).abs() < 1e-12);

        let (s, c) = minute_of_day_encoding(at(2025, 1, 27, 6, 0));
        assert!((s - 1.0).abs() < 1e-12);
        assert!(c.abs() < 1e-12);
    }

    #[test]
    fn rush_hour_windows() {
        assert!(is_rush_hour(at(2025, 1, 27, 7, 0)));
        assert!(is_rush_hour(at(2025, 1, 27, 8, 59)));
        assert!(!is_rush_hour(at(2025, 1, 27, 9, 0)));
        assert!(is_rush_hour(at(2025, 1, 27, 18, 29)));
        assert!(!is_rush_hour(at(2025, 1, 27, 18, 30)));
        // Saturday morning
        assert!(!is_rush_hour(at(2025, 2, 1, 8, 0)));
    }
}
