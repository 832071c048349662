//! Wall-clock sources.
//!
//! The day resolver never reads the system time directly. It asks a
//! [`Clock`], which returns the current instant together with the UTC
//! offset in force *at that moment*. [`SystemClock`] re-queries the local
//! time zone on every call, so a zone change between two calls is seen by
//! the second one.

use std::sync::Mutex;

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, TimeZone, Utc};

/// Source of "now" in the user's current calendar.
pub trait Clock: Send + Sync {
    /// Current instant, expressed in the local offset in force right now.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Calendar date of `now()` in the local zone.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Hand-driven clock for tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl ManualClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// A UTC clock at noon on `date`.
    pub fn at_noon(date: NaiveDate) -> Self {
        let noon = date.and_hms_opt(12, 0, 0).unwrap_or_default();
        Self::new(Utc.from_utc_datetime(&noon).fixed_offset())
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.lock();
        *now += by;
    }

    /// Move to another time zone without changing the instant.
    pub fn set_offset(&self, offset: FixedOffset) {
        let mut now = self.lock();
        *now = now.with_timezone(&offset);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<FixedOffset>> {
        // A poisoned clock still holds a valid instant.
        self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.lock()
    }
}
