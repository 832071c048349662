//! Day resolution: which challenge day is "today".
//!
//! Pure functions over a start date and an instant. The instant carries
//! its own UTC offset, so the calendar date is always taken in the zone
//! the clock reported at that call.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use super::record::CHALLENGE_DAYS;

/// Result of resolving a start date against "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Unclamped day number; may be `<= 0` or `> CHALLENGE_DAYS`.
    pub raw_day: i64,
    /// `raw_day` clamped into `1..=CHALLENGE_DAYS`.
    pub day: u32,
}

impl Resolution {
    /// The calendar has moved beyond the last challenge day.
    pub fn is_past_end(&self) -> bool {
        self.raw_day > i64::from(CHALLENGE_DAYS)
    }

    /// "Now" falls before the start date (clock set backward).
    pub fn is_before_start(&self) -> bool {
        self.raw_day < 1
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DayResolver;

impl DayResolver {
    /// Whole calendar days from `start_date` to the local date of `now`.
    pub fn days_since_start(start_date: NaiveDate, now: DateTime<FixedOffset>) -> i64 {
        now.date_naive()
            .signed_duration_since(start_date)
            .num_days()
    }

    pub fn resolve(start_date: NaiveDate, now: DateTime<FixedOffset>) -> Resolution {
        let raw_day = Self::days_since_start(start_date, now).saturating_add(1);
        Resolution {
            raw_day,
            day: clamp_day(raw_day),
        }
    }
}

/// Clamp any day number into `1..=CHALLENGE_DAYS`.
pub fn clamp_day(raw_day: i64) -> u32 {
    raw_day.clamp(1, i64::from(CHALLENGE_DAYS)) as u32
}

pub fn day_has_advanced(last_known_day: u32, candidate_day: u32) -> bool {
    candidate_day != last_known_day
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(offset_hours: i32, y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(offset_hours * 3600)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
    }

    #[test]
    fn start_day_is_day_one_at_any_hour() {
        let start = date(2025, 2, 13);
        assert_eq!(DayResolver::resolve(start, at(0, 2025, 2, 13, 0, 0)).day, 1);
        assert_eq!(DayResolver::resolve(start, at(0, 2025, 2, 13, 23, 59)).day, 1);
        assert_eq!(DayResolver::resolve(start, at(0, 2025, 2, 14, 0, 0)).day, 2);
    }

    #[test]
    fn crosses_month_and_year_boundaries() {
        let start = date(2024, 12, 30);
        let r = DayResolver::resolve(start, at(0, 2025, 1, 2, 9, 0));
        assert_eq!(r.raw_day, 4);
        assert_eq!(r.day, 4);
    }

    #[test]
    fn clock_before_start_clamps_to_one() {
        let start = date(2025, 2, 13);
        let r = DayResolver::resolve(start, at(0, 2025, 2, 10, 12, 0));
        assert_eq!(r.raw_day, -2);
        assert_eq!(r.day, 1);
        assert!(r.is_before_start());
    }

    #[test]
    fn beyond_fifty_clamps_and_reports_past_end() {
        let start = date(2025, 1, 1);
        // 1 Jan + 50 days = 20 Feb, which is raw day 51.
        let r = DayResolver::resolve(start, at(0, 2025, 2, 20, 8, 0));
        assert_eq!(r.raw_day, 51);
        assert_eq!(r.day, 50);
        assert!(r.is_past_end());

        let r = DayResolver::resolve(start, at(0, 2025, 2, 19, 8, 0));
        assert_eq!(r.day, 50);
        assert!(!r.is_past_end());
    }

    #[test]
    fn zone_of_now_decides_the_date() {
        let start = date(2025, 2, 13);
        // Same instant: 22:00 UTC on the 13th is 06:00 on the 14th in UTC+8.
        let utc = at(0, 2025, 2, 13, 22, 0);
        let east = utc.with_timezone(&FixedOffset::east_opt(8 * 3600).unwrap());
        assert_eq!(DayResolver::resolve(start, utc).day, 1);
        assert_eq!(DayResolver::resolve(start, east).day, 2);
    }

    #[test]
    fn advanced_means_different() {
        assert!(!day_has_advanced(3, 3));
        assert!(day_has_advanced(3, 4));
        assert!(day_has_advanced(3, 1));
    }
}
