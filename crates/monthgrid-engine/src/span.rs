//! Multi-day span assignment.
//!
//! Given an occurrence's start and end, computes the ordered list of
//! calendar days it covers, annotated for multi-day rendering (first day,
//! last day, total days).
//!
//! All-day events carry a well-known encoding ambiguity: many sources store
//! a one-day event with an exclusive end of `start + 1 day`. Such an event
//! occupies only its start day; the extra day is not spillover.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::warn;

use monthgrid_core::{DayKey, EventTime};

/// Upper bound on span length; anything longer is corrupt sync data and is
/// truncated so a single record cannot make the pass unbounded.
pub const MAX_SPAN_DAYS: i64 = 366;

/// One day of an occurrence's span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySpan {
    /// The covered day.
    pub day: DayKey,
    /// Whether this is the first day of the span.
    pub is_first_day: bool,
    /// Whether this is the last day of the span.
    pub is_last_day: bool,
    /// Whether the span covers more than one day.
    pub is_multi_day: bool,
    /// Total days in the span.
    pub total_days: u32,
}

/// Computes the ordered day list an occurrence covers, start day through
/// end day inclusive.
pub fn assign_span(start: &EventTime, end: &EventTime) -> Vec<DaySpan> {
    let first = start.day_key();
    let mut last = end.day_key();

    // An end before the start is degraded to a single-day span.
    if last < first {
        last = first;
    }

    // The all-day exclusive-end encoding: start + 1 day means one day.
    if start.is_all_day() && first.days_until(&last) == 1 {
        last = first;
    }

    let mut total = first.days_until(&last) + 1;
    if total > MAX_SPAN_DAYS {
        warn!(
            from = %first,
            to = %last,
            "span exceeds {MAX_SPAN_DAYS} days; truncating"
        );
        total = MAX_SPAN_DAYS;
    }

    let total_days = total as u32;
    let is_multi_day = total > 1;
    (0..total)
        .map(|offset| DaySpan {
            day: DayKey::new(first.date() + Duration::days(offset)),
            is_first_day: offset == 0,
            is_last_day: offset == total - 1,
            is_multi_day,
            total_days,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn key(y: i32, m: u32, d: u32) -> DayKey {
        DayKey::new(date(y, m, d))
    }

    #[test]
    fn single_day_timed_event() {
        let spans = assign_span(
            &EventTime::from_utc(utc(2025, 4, 1, 9, 0, 0)),
            &EventTime::from_utc(utc(2025, 4, 1, 9, 30, 0)),
        );
        assert_eq!(spans.len(), 1);
        let span = &spans[0];
        assert_eq!(span.day, key(2025, 4, 1));
        assert!(span.is_first_day);
        assert!(span.is_last_day);
        assert!(!span.is_multi_day);
        assert_eq!(span.total_days, 1);
    }

    #[test]
    fn timed_event_crossing_midnight_is_multi_day() {
        let spans = assign_span(
            &EventTime::from_utc(utc(2025, 4, 1, 22, 0, 0)),
            &EventTime::from_utc(utc(2025, 4, 2, 2, 0, 0)),
        );
        assert_eq!(spans.len(), 2);
        assert!(spans[0].is_first_day && !spans[0].is_last_day);
        assert!(!spans[1].is_first_day && spans[1].is_last_day);
        assert!(spans.iter().all(|s| s.is_multi_day && s.total_days == 2));
    }

    #[test]
    fn three_day_offsite() {
        let spans = assign_span(
            &EventTime::from_utc(utc(2025, 4, 15, 9, 0, 0)),
            &EventTime::from_utc(utc(2025, 4, 17, 17, 0, 0)),
        );
        assert_eq!(
            spans.iter().map(|s| s.day).collect::<Vec<_>>(),
            vec![key(2025, 4, 15), key(2025, 4, 16), key(2025, 4, 17)]
        );
        assert!(spans[1].is_multi_day);
        assert!(!spans[1].is_first_day && !spans[1].is_last_day);
        assert_eq!(spans[1].total_days, 3);
    }

    #[test]
    fn all_day_plus_one_end_is_single_day() {
        // The inclusive/exclusive encoding ambiguity: this is one day off,
        // not an event spilling into June 11.
        let spans = assign_span(
            &EventTime::from_date(date(2025, 6, 10)),
            &EventTime::from_date(date(2025, 6, 11)),
        );
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].day, key(2025, 6, 10));
        assert!(!spans[0].is_multi_day);
    }

    #[test]
    fn all_day_longer_span_keeps_end_day() {
        let spans = assign_span(
            &EventTime::from_date(date(2025, 6, 10)),
            &EventTime::from_date(date(2025, 6, 13)),
        );
        assert_eq!(spans.len(), 4);
        assert_eq!(spans[3].day, key(2025, 6, 13));
        assert!(spans[0].is_multi_day);
    }

    #[test]
    fn end_before_start_degrades_to_start_day() {
        let spans = assign_span(
            &EventTime::from_utc(utc(2025, 4, 10, 9, 0, 0)),
            &EventTime::from_utc(utc(2025, 4, 8, 9, 0, 0)),
        );
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].day, key(2025, 4, 10));
    }

    #[test]
    fn pathological_span_is_truncated() {
        let spans = assign_span(
            &EventTime::from_date(date(2025, 1, 1)),
            &EventTime::from_date(date(2035, 1, 1)),
        );
        assert_eq!(spans.len(), MAX_SPAN_DAYS as usize);
        assert!(spans.last().unwrap().is_last_day);
    }
}
