//! Daily open/close schedule.
//!
//! A fixed `(month, day) → (open h:m, close h:m)` table.  Times are compared
//! as *day minutes* (`hour * 60 + minute`), so a day splits into three
//! half-open windows:
//!
//! ```text
//!  00:00                openMin               closeMin             24:00
//!    ├────── closed ───────┼──────── open ─────────┼────── closed ───────┤
//!         [0, openMin)          [openMin, closeMin)      [closeMin, 1440)
//! ```
//!
//! The built-in table is evaluated at compile time from mid-month anchors
//! (central-European standard time, no DST), interpolating linearly towards
//! the neighbouring months.  Every day of every month has an entry; the
//! unused slots (Feb 30, Apr 31, ...) are filled like any other day.

use chrono::{Datelike, NaiveDateTime, Timelike};

/// Minutes in one day.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Convert an hour/minute pair to minutes since midnight.
pub const fn day_minutes(hour: u8, minute: u8) -> u16 {
    hour as u16 * 60 + minute as u16
}

/// Minutes since midnight for a wall-clock timestamp.
pub fn day_minutes_of(now: &NaiveDateTime) -> u16 {
    day_minutes(now.hour() as u8, now.minute() as u8)
}

// ───────────────────────────────────────────────────────────────
// Day entry
// ───────────────────────────────────────────────────────────────

/// Open and close times for a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySchedule {
    pub open_hour: u8,
    pub open_minute: u8,
    pub close_hour: u8,
    pub close_minute: u8,
}

impl DaySchedule {
    pub const fn new(open_hour: u8, open_minute: u8, close_hour: u8, close_minute: u8) -> Self {
        Self {
            open_hour,
            open_minute,
            close_hour,
            close_minute,
        }
    }

    const fn from_minutes(open: u16, close: u16) -> Self {
        Self::new(
            (open / 60) as u8,
            (open % 60) as u8,
            (close / 60) as u8,
            (close % 60) as u8,
        )
    }

    pub const fn open_minutes(&self) -> u16 {
        day_minutes(self.open_hour, self.open_minute)
    }

    pub const fn close_minutes(&self) -> u16 {
        day_minutes(self.close_hour, self.close_minute)
    }
}

/// Where a moment of the day falls relative to the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayWindow {
    /// Before today's opening time; the door stays closed.
    BeforeOpen,
    /// Between opening and closing time; the door should be open.
    Open,
    /// At or after closing time; the door stays closed.
    AfterClose,
}

impl DayWindow {
    /// Whether the door belongs closed in this window.
    pub fn wants_closed(self) -> bool {
        !matches!(self, Self::Open)
    }
}

// ───────────────────────────────────────────────────────────────
// Resolved targets for one day
// ───────────────────────────────────────────────────────────────

/// Today's schedule resolved into day minutes.  Recomputed on INIT and on
/// every day-of-month change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayTargets {
    /// Day of month (1-31) these targets were computed for.
    pub day_of_month: u32,
    pub open_min: u16,
    pub close_min: u16,
}

impl DayTargets {
    /// Classify `minutes` into exactly one window.  Boundaries are
    /// half-open: `open_min` itself is open, `close_min` itself is closed.
    pub fn window(&self, minutes: u16) -> DayWindow {
        if minutes < self.open_min {
            DayWindow::BeforeOpen
        } else if minutes < self.close_min {
            DayWindow::Open
        } else {
            DayWindow::AfterClose
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Table
// ───────────────────────────────────────────────────────────────

/// Mid-month anchor: open and close times on the 15th.
#[derive(Debug, Clone, Copy)]
pub struct MonthAnchor {
    pub open: u16,
    pub close: u16,
}

/// Sunrise + 30 min / sunset + 30 min at ~48.8° N, standard time.
pub const MONTHLY_ANCHORS: [MonthAnchor; 12] = [
    MonthAnchor { open: day_minutes(8, 40), close: day_minutes(17, 20) }, // Jan
    MonthAnchor { open: day_minutes(8, 5), close: day_minutes(18, 10) },  // Feb
    MonthAnchor { open: day_minutes(7, 10), close: day_minutes(18, 55) }, // Mar
    MonthAnchor { open: day_minutes(6, 5), close: day_minutes(19, 40) },  // Apr
    MonthAnchor { open: day_minutes(5, 15), close: day_minutes(20, 20) }, // May
    MonthAnchor { open: day_minutes(4, 50), close: day_minutes(20, 55) }, // Jun
    MonthAnchor { open: day_minutes(5, 5), close: day_minutes(20, 50) },  // Jul
    MonthAnchor { open: day_minutes(5, 45), close: day_minutes(20, 10) }, // Aug
    MonthAnchor { open: day_minutes(6, 30), close: day_minutes(19, 5) },  // Sep
    MonthAnchor { open: day_minutes(7, 20), close: day_minutes(18, 0) },  // Oct
    MonthAnchor { open: day_minutes(8, 10), close: day_minutes(17, 10) }, // Nov
    MonthAnchor { open: day_minutes(8, 45), close: day_minutes(16, 55) }, // Dec
];

/// Built-in schedule, generated at compile time.
pub static DEFAULT_SCHEDULE: ScheduleTable = ScheduleTable::interpolated(&MONTHLY_ANCHORS);

/// Errors from [`ScheduleTable::set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    /// Month outside 1-12 or day outside 1-31.
    InvalidDate,
    /// Hour or minute out of range, or closing not after opening.
    InvalidTimes,
}

impl core::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidDate => write!(f, "invalid month/day"),
            Self::InvalidTimes => write!(f, "open must precede close within one day"),
        }
    }
}

/// Twelve months of 31 days each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleTable {
    days: [[DaySchedule; 31]; 12],
}

impl ScheduleTable {
    /// Same open/close times on every day of the year.
    pub const fn uniform(day: DaySchedule) -> Self {
        Self {
            days: [[day; 31]; 12],
        }
    }

    /// Build the table by linear interpolation between mid-month anchors.
    pub const fn interpolated(anchors: &[MonthAnchor; 12]) -> Self {
        let mut days = [[DaySchedule::new(0, 0, 0, 0); 31]; 12];
        let mut m = 0;
        while m < 12 {
            let cur = anchors[m];
            let prev = anchors[(m + 11) % 12];
            let next = anchors[(m + 1) % 12];
            let mut d = 0;
            while d < 31 {
                // Offset from the 15th (index 14), in days.
                let offset = d as i32 - 14;
                let (from, to, span) = if offset >= 0 {
                    (cur, next, offset)
                } else {
                    (prev, cur, 30 + offset)
                };
                let open = lerp(from.open, to.open, span);
                let close = lerp(from.close, to.close, span);
                days[m][d] = DaySchedule::from_minutes(open, close);
                d += 1;
            }
            m += 1;
        }
        Self { days }
    }

    /// Look up the entry for `month` (1-12) and `day` (1-31).
    pub fn lookup(&self, month: u32, day: u32) -> Option<DaySchedule> {
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return None;
        }
        Some(self.days[month as usize - 1][day as usize - 1])
    }

    /// Replace a single entry.
    pub fn set(&mut self, month: u32, day: u32, entry: DaySchedule) -> Result<(), ScheduleError> {
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(ScheduleError::InvalidDate);
        }
        if entry.open_hour > 23
            || entry.close_hour > 23
            || entry.open_minute > 59
            || entry.close_minute > 59
            || entry.open_minutes() >= entry.close_minutes()
        {
            return Err(ScheduleError::InvalidTimes);
        }
        self.days[month as usize - 1][day as usize - 1] = entry;
        Ok(())
    }

    /// Resolve the targets for the calendar day of `now`.
    pub fn targets_for(&self, now: &NaiveDateTime) -> DayTargets {
        // chrono guarantees month 1-12 and day 1-31.
        let entry = self.days[now.month0() as usize][now.day0() as usize];
        DayTargets {
            day_of_month: now.day(),
            open_min: entry.open_minutes(),
            close_min: entry.close_minutes(),
        }
    }
}

impl Default for ScheduleTable {
    fn default() -> Self {
        DEFAULT_SCHEDULE.clone()
    }
}

/// `from + (to - from) * step / 30`, in signed minutes.
const fn lerp(from: u16, to: u16, step: i32) -> u16 {
    let from = from as i32;
    let to = to as i32;
    (from + (to - from) * step / 30) as u16
}
