//! Workday calendar arithmetic.
//!
//! All date math in the crate goes through a [`WorkdayCalendar`], so callers can
//! swap a weekend-only calendar for one that also skips public holidays without
//! touching the projection code.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::collections::BTreeSet;

/// Decides whether a calendar day counts as a working day.
///
/// Implementations must return `true` for at least one day in any run of
/// consecutive days a caller will scan, otherwise `add_workdays` does not
/// terminate before reaching `NaiveDate::MAX`.
pub trait WorkdayCalendar {
    fn is_workday(&self, date: NaiveDate) -> bool;
}

impl<F> WorkdayCalendar for F
where
    F: Fn(NaiveDate) -> bool,
{
    fn is_workday(&self, date: NaiveDate) -> bool {
        self(date)
    }
}

/// Monday to Friday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeekendCalendar;

impl WorkdayCalendar for WeekendCalendar {
    fn is_workday(&self, date: NaiveDate) -> bool {
        !is_weekend(date)
    }
}

/// Weekends plus an explicit set of non-working dates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.holidays.insert(date);
    }
}

impl WorkdayCalendar for HolidayCalendar {
    fn is_workday(&self, date: NaiveDate) -> bool {
        !is_weekend(date) && !self.holidays.contains(&date)
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn next_day(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(1))
}

/// Advance `days` working days past `start`.
///
/// `start` itself is never counted: `add_workdays(d, 0) == d` and for `days > 0`
/// the result is always a working day strictly after `start`. Saturates at
/// `NaiveDate::MAX`.
pub fn add_workdays<C: WorkdayCalendar + ?Sized>(start: NaiveDate, days: u32, cal: &C) -> NaiveDate {
    let mut current = start;
    let mut counted = 0u32;

    while counted < days {
        match next_day(current) {
            Some(next) => current = next,
            None => break,
        }
        if cal.is_workday(current) {
            counted += 1;
        }
    }

    current
}

/// Signed working-day distance from `from` to `to`.
///
/// For `to > from` this counts working days in `(from, to]`, which makes it the
/// inverse of [`add_workdays`]. Swapping the arguments negates the result.
pub fn workdays_between<C: WorkdayCalendar + ?Sized>(from: NaiveDate, to: NaiveDate, cal: &C) -> i64 {
    if to == from {
        return 0;
    }
    if to < from {
        return -workdays_between(to, from, cal);
    }

    let mut count = 0i64;
    let mut current = from;
    while current < to {
        match next_day(current) {
            Some(next) => current = next,
            None => break,
        }
        if cal.is_workday(current) {
            count += 1;
        }
    }
    count
}

/// Working days in the inclusive range `[from, to]`. Zero when `to < from`.
pub fn workdays_in_range<C: WorkdayCalendar + ?Sized>(from: NaiveDate, to: NaiveDate, cal: &C) -> u32 {
    if to < from {
        return 0;
    }
    let first = u32::from(cal.is_workday(from));
    // (from, to] plus `from` itself
    first + workdays_between(from, to, cal) as u32
}
