//! Occurrence generation for recurring events.
//!
//! Expands a base start time plus a canonical [`RecurrenceConfig`] into the
//! ordered sequence of occurrence start times up to a horizon. The sequence
//! always begins with the base start itself, even when the base date does
//! not satisfy a weekly weekday constraint: the anchor date of the source
//! event is occurrence 0 no matter what.
//!
//! Steps are calendar arithmetic on the date component, preserving the
//! base's time-of-day, so a 9:00 event stays a 9:00 event across month
//! boundaries.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use std::collections::BTreeSet;

use monthgrid_core::{EventTime, RecurrenceConfig, RecurrenceEnd, RecurrencePattern, Weekday};

/// Absolute cap on generated occurrences, bounding worst-case cost
/// regardless of configuration.
pub const MAX_OCCURRENCES: usize = 100;

/// How far ahead the weekly weekday scan looks before falling back.
const WEEKDAY_SCAN_DAYS: i64 = 14;

/// Generates the ordered occurrence start times for a recurring event.
///
/// The result always contains the base start at index 0. Generation stops
/// at the horizon, at the configured end condition (`until` is inclusive),
/// and at [`MAX_OCCURRENCES`], whichever comes first.
pub fn generate_occurrences(
    start: &EventTime,
    config: &RecurrenceConfig,
    horizon: DateTime<Utc>,
) -> Vec<EventTime> {
    let mut occurrences = vec![start.clone()];
    if !config.is_recurring() {
        return occurrences;
    }

    let limit = match config.end {
        RecurrenceEnd::After { occurrences: n } => (n as usize).min(MAX_OCCURRENCES),
        _ => MAX_OCCURRENCES,
    };

    let mut current = start.clone();
    while occurrences.len() < limit {
        let Some(next) = next_occurrence(&current, config) else {
            break;
        };
        // Every step must move strictly forward.
        if next.to_utc_datetime() <= current.to_utc_datetime() {
            break;
        }
        if next.to_utc_datetime() > horizon {
            break;
        }
        if let RecurrenceEnd::On { until } = config.end {
            if next.to_utc_datetime() > until {
                break;
            }
        }
        occurrences.push(next.clone());
        current = next;
    }

    occurrences
}

/// Computes the occurrence following `current` per the config's pattern.
fn next_occurrence(current: &EventTime, config: &RecurrenceConfig) -> Option<EventTime> {
    let date = current.date();
    let interval = i64::from(config.interval);
    let next_date = match config.pattern {
        RecurrencePattern::Daily => date.checked_add_signed(Duration::days(interval))?,
        RecurrencePattern::Weekly if config.weekdays.is_empty() => {
            date.checked_add_signed(Duration::days(interval * 7))?
        }
        RecurrencePattern::Weekly => next_weekday_match(date, &config.weekdays, config.interval)?,
        RecurrencePattern::Monthly => date.checked_add_months(Months::new(config.interval))?,
        RecurrencePattern::Yearly => {
            date.checked_add_months(Months::new(config.interval.checked_mul(12)?))?
        }
        RecurrencePattern::None | RecurrencePattern::Unknown => return None,
    };
    Some(with_date(current, next_date))
}

/// Finds the next date whose weekday is in the set, scanning day-by-day at
/// most two weeks ahead. Beyond weekly cadence (`interval > 1`) a candidate
/// must lie at least `interval` weeks out; when nothing in the scan window
/// qualifies, fall back to the same weekday `interval` weeks later.
fn next_weekday_match(
    current: NaiveDate,
    weekdays: &BTreeSet<Weekday>,
    interval: u32,
) -> Option<NaiveDate> {
    let min_gap = if interval > 1 { i64::from(interval) * 7 } else { 1 };
    for offset in 1..=WEEKDAY_SCAN_DAYS {
        if offset < min_gap {
            continue;
        }
        let candidate = current.checked_add_signed(Duration::days(offset))?;
        if weekdays.contains(&Weekday::from_chrono(candidate.weekday())) {
            return Some(candidate);
        }
    }
    current.checked_add_signed(Duration::days(i64::from(interval) * 7))
}

/// Rebases an event time onto a new date, keeping the stored time-of-day
/// and offset for timed events.
fn with_date(base: &EventTime, date: NaiveDate) -> EventTime {
    match base {
        EventTime::DateTime(dt) => {
            let rebased = date
                .and_time(dt.time())
                .and_local_timezone(*dt.offset())
                .single()
                .expect("fixed offsets are never ambiguous");
            EventTime::DateTime(rebased)
        }
        EventTime::AllDay(_) => EventTime::AllDay(date),
    }
}
