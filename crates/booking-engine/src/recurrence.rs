//! Recurrence expansion -- turns an anchored rule into concrete candidate dates.
//!
//! Each [`RecurrenceSpec`] is compiled to an RFC 5545 RRULE and expanded with the
//! `rrule` crate. The backend's output is then checked against the rule itself,
//! deduplicated, and sorted, so callers always get an ordered, finite list of
//! calendar-correct dates.
//!
//! Availability is deliberately ignored here: weekends, holidays, and blocked
//! days are still emitted. Filtering those is the classifier's job.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, Month, Utc, Weekday};
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::MonthRef;
use crate::error::{EngineError, Result, ValidationError};
use crate::model::CivilDate;

/// Hard ceiling for `repeat_count`, independent of configuration.
pub const MAX_REPEAT_COUNT: u32 = 500;

/// Upper bound for open-ended series, in months.
pub const MAX_MONTH_LIMIT: u32 = 120;

/// Upper bound for the weekly step.
pub const MAX_INTERVAL_WEEKS: u32 = 52;

/// How a monthly or yearly rule picks its day within a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthlyMode {
    /// Same day-of-month as the anchor; months without that day are skipped.
    ByDayOfMonth,
    /// Same ordinal weekday as the anchor ("2nd Tuesday", or "last Wednesday"
    /// when the anchor is the last such weekday of its month).
    ByOrdinalWeekday,
}

/// A recurrence rule. The anchor date is supplied separately at expansion time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecurrenceSpec {
    /// `repeat_count` counts emitted dates across all selected weekdays.
    Weekly {
        interval_weeks: u32,
        weekdays: Vec<Weekday>,
        repeat_count: u32,
    },
    /// `repeat_count` counts scanned months, starting at the anchor's month.
    Monthly { mode: MonthlyMode, repeat_count: u32 },
    /// `repeat_count` counts scanned years, starting at the anchor's year.
    Yearly {
        mode: MonthlyMode,
        months: Vec<Month>,
        repeat_count: u32,
    },
    /// Monthly on the anchor's day-of-month for `month_limit` consecutive months.
    Indefinite { month_limit: u32 },
}

impl RecurrenceSpec {
    /// Check the rule's structural invariants.
    ///
    /// # Errors
    /// Returns the first violated [`ValidationError`].
    pub fn validate(&self, max_repeat_count: u32) -> std::result::Result<(), ValidationError> {
        let check_count = |got: u32| {
            if got == 0 || got > max_repeat_count {
                Err(ValidationError::RepeatCount {
                    got,
                    max: max_repeat_count,
                })
            } else {
                Ok(())
            }
        };

        match self {
            Self::Weekly {
                interval_weeks,
                weekdays,
                repeat_count,
            } => {
                if weekdays.is_empty() {
                    return Err(ValidationError::EmptyWeekdaySet);
                }
                if !(1..=MAX_INTERVAL_WEEKS).contains(interval_weeks) {
                    return Err(ValidationError::IntervalWeeks(*interval_weeks));
                }
                check_count(*repeat_count)
            }
            Self::Monthly { repeat_count, .. } => check_count(*repeat_count),
            Self::Yearly {
                months,
                repeat_count,
                ..
            } => {
                if months.is_empty() {
                    return Err(ValidationError::EmptyMonthSet);
                }
                check_count(*repeat_count)
            }
            Self::Indefinite { month_limit } => {
                if (1..=MAX_MONTH_LIMIT).contains(month_limit) {
                    Ok(())
                } else {
                    Err(ValidationError::MonthLimit(*month_limit))
                }
            }
        }
    }
}

/// Position of the anchor among its month's occurrences of its weekday.
///
/// Computed once from the anchor and reused for every target month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ordinal {
    Nth(u32),
    Last,
}

impl Ordinal {
    fn of(anchor: CivilDate) -> Self {
        let next_week = anchor.checked_add_days(Days::new(7));
        let is_last = next_week.is_none_or(|d| d.month() != anchor.month());
        if is_last {
            Self::Last
        } else {
            Self::Nth(anchor.day0() / 7 + 1)
        }
    }

    const fn setpos(self) -> i32 {
        match self {
            Self::Nth(n) => n as i32,
            Self::Last => -1,
        }
    }

    fn matches(self, weekday: Weekday, date: CivilDate) -> bool {
        date.weekday() == weekday
            && match self {
                Self::Nth(n) => date.day0() / 7 + 1 == n,
                Self::Last => Self::of(date) == Self::Last,
            }
    }
}

/// Rule compiled for the backend, plus everything needed to check its output.
struct CompiledRule {
    body: String,
    until: Option<CivilDate>,
    limit: u32,
    keep: Box<dyn Fn(CivilDate) -> bool>,
    truncate: Option<usize>,
}

/// Expand `spec` anchored at `anchor` into ordered, deduplicated candidate dates.
///
/// Monthly, yearly, and open-ended rules scan a fixed number of months and skip
/// months that lack the anchor's day, so they can yield fewer dates than
/// scanned months. Weekly rules emit exactly `repeat_count` dates.
///
/// # Errors
/// `EngineError::Validation` when the rule breaks its invariants,
/// `EngineError::RecurrenceCompute` when the backend rejects the compiled rule.
pub fn expand_recurrence(anchor: CivilDate, spec: &RecurrenceSpec) -> Result<Vec<CivilDate>> {
    spec.validate(MAX_REPEAT_COUNT)?;

    let compiled = compile(anchor, spec);

    let mut text = format!(
        "DTSTART;TZID=UTC:{}T000000\nRRULE:{}",
        anchor.format("%Y%m%d"),
        compiled.body
    );
    if let Some(until) = compiled.until {
        text.push_str(&format!(";UNTIL={}T235959Z", until.format("%Y%m%d")));
    }

    let rule_set: RRuleSet = text
        .parse()
        .map_err(|e| EngineError::RecurrenceCompute(format!("{e}")))?;

    let limit = u16::try_from(compiled.limit).unwrap_or(u16::MAX);
    let instances = rule_set.all(limit);

    let unique: BTreeSet<CivilDate> = instances
        .dates
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .filter(|date| *date >= anchor && (compiled.keep)(*date))
        .collect();

    let mut dates: Vec<CivilDate> = unique.into_iter().collect();
    if let Some(n) = compiled.truncate {
        dates.truncate(n);
    }

    debug!(
        rule = %compiled.body,
        %anchor,
        produced = dates.len(),
        "expanded recurrence"
    );

    Ok(dates)
}

fn compile(anchor: CivilDate, spec: &RecurrenceSpec) -> CompiledRule {
    match spec {
        RecurrenceSpec::Weekly {
            interval_weeks,
            weekdays,
            repeat_count,
        } => {
            let mut days: Vec<Weekday> = weekdays.clone();
            days.sort_by_key(Weekday::num_days_from_sunday);
            days.dedup();
            let byday: Vec<&str> = days.iter().map(|d| ical_weekday(*d)).collect();
            let selected = days.clone();
            CompiledRule {
                body: format!(
                    "FREQ=WEEKLY;INTERVAL={interval_weeks};BYDAY={};WKST=SU",
                    byday.join(",")
                ),
                until: None,
                // One extra instance in case the backend also reports DTSTART.
                limit: repeat_count + 1,
                keep: Box::new(move |date| selected.contains(&date.weekday())),
                truncate: Some(*repeat_count as usize),
            }
        }
        RecurrenceSpec::Monthly { mode, repeat_count } => {
            let last = MonthRef::of(anchor).plus_months(repeat_count - 1);
            monthly(anchor, *mode, None, last, *repeat_count)
        }
        RecurrenceSpec::Yearly {
            mode,
            months,
            repeat_count,
        } => {
            let mut numbers: Vec<u32> = months.iter().map(Month::number_from_month).collect();
            numbers.sort_unstable();
            numbers.dedup();
            let per_year = numbers.len() as u32;
            // The window closes with the December of the last scanned year.
            let last_year = i32::try_from(*repeat_count - 1)
                .ok()
                .and_then(|years| anchor.year().checked_add(years));
            let last = last_year.and_then(|year| MonthRef::new(year, 11).ok());
            monthly(anchor, *mode, Some(numbers), last, repeat_count * per_year)
        }
        RecurrenceSpec::Indefinite { month_limit } => {
            let last = MonthRef::of(anchor).plus_months(month_limit - 1);
            monthly(anchor, MonthlyMode::ByDayOfMonth, None, last, *month_limit)
        }
    }
}

/// Monthly expansion from the anchor's month through `last`, optionally
/// restricted to the given one-based month numbers.
fn monthly(
    anchor: CivilDate,
    mode: MonthlyMode,
    months: Option<Vec<u32>>,
    last: Option<MonthRef>,
    max_dates: u32,
) -> CompiledRule {
    let until = last.map_or(anchor, MonthRef::last_day);

    let mut body = String::from("FREQ=MONTHLY");
    if let Some(numbers) = &months {
        let list: Vec<String> = numbers.iter().map(u32::to_string).collect();
        body.push_str(&format!(";BYMONTH={}", list.join(",")));
    }

    let weekday = anchor.weekday();
    let day = anchor.day();
    let ordinal = Ordinal::of(anchor);
    match mode {
        MonthlyMode::ByDayOfMonth => body.push_str(&format!(";BYMONTHDAY={day}")),
        MonthlyMode::ByOrdinalWeekday => body.push_str(&format!(
            ";BYDAY={};BYSETPOS={}",
            ical_weekday(weekday),
            ordinal.setpos()
        )),
    }

    let keep: Box<dyn Fn(CivilDate) -> bool> = Box::new(move |date: CivilDate| {
        let in_month_set = months.as_ref().is_none_or(|m| m.contains(&date.month()));
        let on_pattern = match mode {
            MonthlyMode::ByDayOfMonth => date.day() == day,
            MonthlyMode::ByOrdinalWeekday => ordinal.matches(weekday, date),
        };
        in_month_set && date <= until && on_pattern
    });

    CompiledRule {
        body,
        until: Some(until),
        limit: max_dates.saturating_add(1),
        keep,
        truncate: None,
    }
}

const fn ical_weekday(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}
