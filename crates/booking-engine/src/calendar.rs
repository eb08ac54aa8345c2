//! Month handles and the week-by-week calendar grid.
//!
//! Weeks start on Sunday. A grid row always has seven cells; cells outside the
//! month are blank (`None`).

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Serialize;

use crate::error::ValidationError;
use crate::model::CivilDate;

/// A validated calendar month.
///
/// Month indices are zero-based (`0` = January) at the API boundary, matching
/// how calendar front ends address months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthRef {
    first: NaiveDate,
}

impl MonthRef {
    /// Build a month handle from a year and zero-based month index.
    ///
    /// # Errors
    /// `ValidationError::MonthIndex` when `month_index > 11`,
    /// `ValidationError::Year` when the year is outside chrono's range.
    pub fn new(year: i32, month_index: u32) -> Result<Self, ValidationError> {
        if month_index > 11 {
            return Err(ValidationError::MonthIndex(month_index));
        }
        NaiveDate::from_ymd_opt(year, month_index + 1, 1)
            .map(|first| Self { first })
            .ok_or(ValidationError::Year(year))
    }

    /// The month containing `date`.
    pub fn of(date: CivilDate) -> Self {
        let first = date.with_day(1).unwrap_or(date);
        Self { first }
    }

    pub fn year(self) -> i32 {
        self.first.year()
    }

    /// Zero-based month index.
    pub fn month_index(self) -> u32 {
        self.first.month0()
    }

    /// One-based month number.
    pub fn month(self) -> u32 {
        self.first.month()
    }

    pub const fn first_day(self) -> CivilDate {
        self.first
    }

    pub fn days_in_month(self) -> u32 {
        match self.month() {
            2 if NaiveDate::from_ymd_opt(self.year(), 2, 29).is_some() => 29,
            2 => 28,
            4 | 6 | 9 | 11 => 30,
            _ => 31,
        }
    }

    pub fn last_day(self) -> CivilDate {
        self.first
            .checked_add_days(Days::new(u64::from(self.days_in_month() - 1)))
            .unwrap_or(self.first)
    }

    /// The date with the given day-of-month, if this month has it.
    pub fn day(self, day: u32) -> Option<CivilDate> {
        self.first.with_day(day)
    }

    pub fn contains(self, date: CivilDate) -> bool {
        Self::of(date) == self
    }

    /// Every date of the month in order.
    pub fn dates(self) -> impl Iterator<Item = CivilDate> {
        let first = self.first;
        (0..self.days_in_month())
            .filter_map(move |offset| first.checked_add_days(Days::new(u64::from(offset))))
    }

    /// The month `count` months later, if representable.
    pub fn plus_months(self, count: u32) -> Option<Self> {
        self.first
            .checked_add_months(chrono::Months::new(count))
            .map(|first| Self { first })
    }
}

/// One grid row: seven cells, Sunday first.
pub type Week = [Option<u32>; 7];

/// The week-by-week layout of a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month_index: u32,
    pub weeks: Vec<Week>,
}

impl MonthGrid {
    /// Non-blank day numbers in reading order.
    pub fn days(&self) -> impl Iterator<Item = u32> + '_ {
        self.weeks.iter().flatten().filter_map(|cell| *cell)
    }
}

/// Lay out a month as rows of seven cells.
///
/// The first row is left-padded with blanks up to the weekday of the 1st and
/// the last row is right-padded up to Saturday.
pub fn build_month_grid(month: MonthRef) -> MonthGrid {
    let lead = month.first_day().weekday().num_days_from_sunday() as usize;
    let days = month.days_in_month();

    let mut weeks = Vec::with_capacity(6);
    let mut week: Week = [None; 7];
    let mut column = lead;

    for day in 1..=days {
        week[column] = Some(day);
        column += 1;
        if column == 7 {
            weeks.push(week);
            week = [None; 7];
            column = 0;
        }
    }
    if column > 0 {
        weeks.push(week);
    }

    MonthGrid {
        year: month.year(),
        month_index: month.month_index(),
        weeks,
    }
}

/// Saturdays and Sundays.
pub fn is_weekend(date: CivilDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
