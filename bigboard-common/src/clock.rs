//! Display clock
//!
//! A board day starts in the evening of the previous calendar day: from the
//! rollover hour (19:00 by default) onward the board shows tomorrow.

use chrono::{Days, Local, NaiveDate, NaiveDateTime, Timelike};

/// Default rollover hour (7 PM local time)
pub const DEFAULT_ROLLOVER_HOUR: u32 = 19;

/// Source of local wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The process's local clock
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at one instant, for tests and replays
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Maps wall-clock time to the board's display date
#[derive(Debug, Clone, Copy)]
pub struct DisplayClock {
    rollover_hour: u32,
}

impl DisplayClock {
    /// `rollover_hour` of 24 disables the evening rollover
    pub fn new(rollover_hour: u32) -> Self {
        Self { rollover_hour }
    }

    /// The calendar date the board should present as "today"
    pub fn display_date(&self, now: NaiveDateTime) -> NaiveDate {
        let today = now.date();
        if now.hour() >= self.rollover_hour {
            today.checked_add_days(Days::new(1)).unwrap_or(today)
        } else {
            today
        }
    }

    /// True when the display date is ahead of the calendar date
    pub fn is_tomorrow(&self, now: NaiveDateTime) -> bool {
        self.display_date(now) != now.date()
    }
}

impl Default for DisplayClock {
    fn default() -> Self {
        Self::new(DEFAULT_ROLLOVER_HOUR)
    }
}

/// Display date under the default 19:00 rollover
pub fn current_display_date(now: NaiveDateTime) -> NaiveDate {
    DisplayClock::default().display_date(now)
}
