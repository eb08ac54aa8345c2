//! Tests for recurrence expansion.
//!
//! Covers every rule kind, the skip-without-backfill policy for missing days,
//! the carried "last weekday of the month" flag, and input validation.

use booking_engine::{expand_recurrence, EngineError, MonthlyMode, RecurrenceSpec, ValidationError};
use chrono::{Month, NaiveDate, Weekday};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn weekly(interval_weeks: u32, weekdays: &[Weekday], repeat_count: u32) -> RecurrenceSpec {
    RecurrenceSpec::Weekly {
        interval_weeks,
        weekdays: weekdays.to_vec(),
        repeat_count,
    }
}

fn monthly(mode: MonthlyMode, repeat_count: u32) -> RecurrenceSpec {
    RecurrenceSpec::Monthly { mode, repeat_count }
}

fn yearly(mode: MonthlyMode, months: &[Month], repeat_count: u32) -> RecurrenceSpec {
    RecurrenceSpec::Yearly {
        mode,
        months: months.to_vec(),
        repeat_count,
    }
}

// ---------------------------------------------------------------------------
// Weekly
// ---------------------------------------------------------------------------

#[test]
fn weekly_mon_wed_four_dates() {
    let result = expand_recurrence(date(2025, 1, 6), &weekly(1, &[Weekday::Mon, Weekday::Wed], 4))
        .expect("should expand weekly");

    assert_eq!(
        result,
        vec![
            date(2025, 1, 6),
            date(2025, 1, 8),
            date(2025, 1, 13),
            date(2025, 1, 15),
        ]
    );
}

#[test]
fn weekly_skips_selected_days_before_anchor_in_first_week() {
    // Anchor Wed Jan 8; Mon Jan 6 is in the same week but earlier.
    // Every other week: Jan 5-11, Jan 19-25, Feb 2-8.
    let result = expand_recurrence(date(2025, 1, 8), &weekly(2, &[Weekday::Mon, Weekday::Wed], 4))
        .expect("should expand biweekly");

    assert_eq!(
        result,
        vec![
            date(2025, 1, 8),
            date(2025, 1, 20),
            date(2025, 1, 22),
            date(2025, 2, 3),
        ]
    );
}

#[test]
fn weekly_weeks_start_on_sunday() {
    // Sunday Jan 5 and Saturday Jan 11 share a Sunday-first week.
    let result = expand_recurrence(date(2025, 1, 5), &weekly(2, &[Weekday::Sat, Weekday::Sun], 4))
        .expect("should expand");

    assert_eq!(
        result,
        vec![
            date(2025, 1, 5),
            date(2025, 1, 11),
            date(2025, 1, 19),
            date(2025, 1, 25),
        ]
    );
}

#[test]
fn weekly_anchor_weekday_not_selected_is_not_emitted() {
    // Anchor is a Tuesday but only Thursdays are selected.
    let result =
        expand_recurrence(date(2025, 1, 7), &weekly(1, &[Weekday::Thu], 2)).expect("should expand");
    assert_eq!(result, vec![date(2025, 1, 9), date(2025, 1, 16)]);
}

#[test]
fn weekly_duplicate_weekdays_do_not_duplicate_dates() {
    let result = expand_recurrence(date(2025, 1, 6), &weekly(1, &[Weekday::Mon, Weekday::Mon], 3))
        .expect("should expand");
    assert_eq!(
        result,
        vec![date(2025, 1, 6), date(2025, 1, 13), date(2025, 1, 20)]
    );
}

#[test]
fn weekends_are_not_filtered_out() {
    // Availability is the classifier's concern; Saturday Jan 4 stays.
    let result = expand_recurrence(date(2025, 1, 3), &weekly(1, &[Weekday::Fri, Weekday::Sat], 2))
        .expect("should expand");
    assert_eq!(result, vec![date(2025, 1, 3), date(2025, 1, 4)]);
}

// ---------------------------------------------------------------------------
// Monthly
// ---------------------------------------------------------------------------

#[test]
fn monthly_by_day_skips_months_without_that_day() {
    // Three months scanned, February has no 31st → two dates.
    let result = expand_recurrence(date(2025, 1, 31), &monthly(MonthlyMode::ByDayOfMonth, 3))
        .expect("should expand");
    assert_eq!(result, vec![date(2025, 1, 31), date(2025, 3, 31)]);
}

#[test]
fn monthly_by_day_regular() {
    let result = expand_recurrence(date(2025, 11, 10), &monthly(MonthlyMode::ByDayOfMonth, 3))
        .expect("should expand");
    assert_eq!(
        result,
        vec![date(2025, 11, 10), date(2025, 12, 10), date(2026, 1, 10)]
    );
}

#[test]
fn monthly_ordinal_last_wednesday_is_carried_forward() {
    // Jan 29 2025 is the last Wednesday of January.
    let result = expand_recurrence(date(2025, 1, 29), &monthly(MonthlyMode::ByOrdinalWeekday, 2))
        .expect("should expand");
    assert_eq!(result, vec![date(2025, 1, 29), date(2025, 2, 26)]);
}

#[test]
fn monthly_ordinal_last_flag_picks_fifth_week_when_present() {
    // April 2025 has five Wednesdays; the last one is the 30th.
    let result = expand_recurrence(date(2025, 1, 29), &monthly(MonthlyMode::ByOrdinalWeekday, 4))
        .expect("should expand");
    assert_eq!(
        result,
        vec![
            date(2025, 1, 29),
            date(2025, 2, 26),
            date(2025, 3, 26),
            date(2025, 4, 30),
        ]
    );
}

#[test]
fn monthly_ordinal_fourth_is_not_last() {
    // Jan 22 2025 is the 4th Wednesday but not the last one.
    let result = expand_recurrence(date(2025, 1, 22), &monthly(MonthlyMode::ByOrdinalWeekday, 4))
        .expect("should expand");
    assert_eq!(
        result,
        vec![
            date(2025, 1, 22),
            date(2025, 2, 26),
            date(2025, 3, 26),
            date(2025, 4, 23),
        ]
    );
}

#[test]
fn monthly_ordinal_second_tuesday() {
    let result = expand_recurrence(date(2025, 1, 14), &monthly(MonthlyMode::ByOrdinalWeekday, 3))
        .expect("should expand");
    assert_eq!(
        result,
        vec![date(2025, 1, 14), date(2025, 2, 11), date(2025, 3, 11)]
    );
}

// ---------------------------------------------------------------------------
// Yearly
// ---------------------------------------------------------------------------

#[test]
fn yearly_by_day_in_selected_months() {
    let result = expand_recurrence(
        date(2025, 3, 15),
        &yearly(MonthlyMode::ByDayOfMonth, &[Month::March, Month::September], 2),
    )
    .expect("should expand");
    assert_eq!(
        result,
        vec![
            date(2025, 3, 15),
            date(2025, 9, 15),
            date(2026, 3, 15),
            date(2026, 9, 15),
        ]
    );
}

#[test]
fn yearly_months_before_anchor_start_next_year() {
    let result = expand_recurrence(
        date(2025, 6, 10),
        &yearly(MonthlyMode::ByDayOfMonth, &[Month::January, Month::June], 2),
    )
    .expect("should expand");
    assert_eq!(
        result,
        vec![date(2025, 6, 10), date(2026, 1, 10), date(2026, 6, 10)]
    );
}

#[test]
fn yearly_by_day_skips_missing_days() {
    // No February 31st; January is not selected so the anchor is not emitted.
    let result = expand_recurrence(
        date(2024, 1, 31),
        &yearly(MonthlyMode::ByDayOfMonth, &[Month::February, Month::March], 1),
    )
    .expect("should expand");
    assert_eq!(result, vec![date(2024, 3, 31)]);
}

#[test]
fn yearly_ordinal_uses_anchor_last_week_flag() {
    let result = expand_recurrence(
        date(2025, 1, 29),
        &yearly(MonthlyMode::ByOrdinalWeekday, &[Month::January, Month::April], 1),
    )
    .expect("should expand");
    assert_eq!(result, vec![date(2025, 1, 29), date(2025, 4, 30)]);
}

// ---------------------------------------------------------------------------
// Indefinite
// ---------------------------------------------------------------------------

#[test]
fn indefinite_bounded_by_month_limit() {
    let result =
        expand_recurrence(date(2025, 1, 15), &RecurrenceSpec::Indefinite { month_limit: 3 })
            .expect("should expand");
    assert_eq!(
        result,
        vec![date(2025, 1, 15), date(2025, 2, 15), date(2025, 3, 15)]
    );
}

#[test]
fn indefinite_skips_short_months() {
    // 2025 months with a 31st: Jan, Mar, May, Jul, Aug, Oct, Dec.
    let result =
        expand_recurrence(date(2025, 1, 31), &RecurrenceSpec::Indefinite { month_limit: 12 })
            .expect("should expand");
    assert_eq!(result.len(), 7);
    assert_eq!(result.last(), Some(&date(2025, 12, 31)));
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validation_error(spec: &RecurrenceSpec) -> ValidationError {
    match expand_recurrence(date(2025, 1, 6), spec) {
        Err(EngineError::Validation(e)) => e,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[test]
fn empty_weekday_set_rejected() {
    assert_eq!(validation_error(&weekly(1, &[], 4)), ValidationError::EmptyWeekdaySet);
}

#[test]
fn zero_repeat_count_rejected() {
    assert!(matches!(
        validation_error(&monthly(MonthlyMode::ByDayOfMonth, 0)),
        ValidationError::RepeatCount { got: 0, .. }
    ));
}

#[test]
fn interval_out_of_range_rejected() {
    assert_eq!(
        validation_error(&weekly(53, &[Weekday::Mon], 1)),
        ValidationError::IntervalWeeks(53)
    );
    assert_eq!(
        validation_error(&weekly(0, &[Weekday::Mon], 1)),
        ValidationError::IntervalWeeks(0)
    );
}

#[test]
fn month_limit_out_of_range_rejected() {
    assert_eq!(
        validation_error(&RecurrenceSpec::Indefinite { month_limit: 0 }),
        ValidationError::MonthLimit(0)
    );
    assert_eq!(
        validation_error(&RecurrenceSpec::Indefinite { month_limit: 121 }),
        ValidationError::MonthLimit(121)
    );
}

#[test]
fn empty_month_set_rejected() {
    assert_eq!(
        validation_error(&yearly(MonthlyMode::ByDayOfMonth, &[], 1)),
        ValidationError::EmptyMonthSet
    );
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

#[test]
fn spec_parses_from_json() {
    let json = r#"{"kind":"weekly","interval_weeks":1,"weekdays":["Mon","Wed"],"repeat_count":4}"#;
    let spec: RecurrenceSpec = serde_json::from_str(json).expect("should parse");
    assert_eq!(spec, weekly(1, &[Weekday::Mon, Weekday::Wed], 4));

    let json = r#"{"kind":"monthly","mode":"by_ordinal_weekday","repeat_count":2}"#;
    let spec: RecurrenceSpec = serde_json::from_str(json).expect("should parse");
    assert_eq!(spec, monthly(MonthlyMode::ByOrdinalWeekday, 2));
}
