//! Day-bucket assembly.
//!
//! Folds the full event list into a mapping from day key to the ordered
//! entries a month view renders for that day: base occurrences, generated
//! recurrence occurrences, and multi-day span segments, restricted to the
//! visible window and deduplicated per day.
//!
//! The map is built fresh on every call and never diffed against a previous
//! result; identical inputs always produce an identical map.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate};
use serde::Serialize;
use tracing::warn;

use monthgrid_core::{DayKey, DisplayWindow, EventTime, PlacedEvent, SyncedEvent};

use crate::dedup::dedup_day;
use crate::error::{GridError, GridResult};
use crate::generate::generate_occurrences;
use crate::parse::parse_recurrence;
use crate::span::assign_span;

/// The assembled result: every visible day mapped to its ordered entries.
///
/// Days iterate chronologically; entries within a day keep input order,
/// with generated occurrences following their base event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DayBuckets {
    buckets: BTreeMap<DayKey, Vec<PlacedEvent>>,
}

impl DayBuckets {
    /// Returns the entries for a day, if any were placed there.
    pub fn get(&self, day: &DayKey) -> Option<&[PlacedEvent]> {
        self.buckets.get(day).map(Vec::as_slice)
    }

    /// Iterates over the non-empty days in chronological order.
    pub fn days(&self) -> impl Iterator<Item = &DayKey> {
        self.buckets.keys()
    }

    /// Iterates over `(day, entries)` pairs in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (&DayKey, &[PlacedEvent])> {
        self.buckets.iter().map(|(day, entries)| (day, entries.as_slice()))
    }

    /// Number of days that received at least one entry.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns `true` if nothing was placed.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total entries across all days.
    pub fn total_entries(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    fn insert(&mut self, entry: PlacedEvent) {
        self.buckets.entry(entry.day).or_default().push(entry);
    }

    fn dedup_in_place(&mut self) {
        for entries in self.buckets.values_mut() {
            *entries = dedup_day(std::mem::take(entries));
        }
    }
}

/// Builds the bucket map for one display window.
///
/// This is the engine's entry point. It never fails as a whole: events with
/// invalid dates are skipped, unparseable recurrence rules degrade to the
/// base occurrence, and every recovery is reported as a warning.
pub fn build_month_grid(events: &[SyncedEvent], window: &DisplayWindow) -> DayBuckets {
    let mut buckets = DayBuckets::default();
    let Some(horizon) = window.horizon() else {
        return buckets;
    };

    for event in events {
        let (start, end) = match parse_event_times(event) {
            Ok(times) => times,
            Err(err) => {
                warn!(event_id = %event.id, %err, "skipping event with invalid dates");
                continue;
            }
        };

        place(&mut buckets, window, event, &start, &end, 0);

        let Some(rule) = event.recurrence.as_deref() else {
            continue;
        };
        let config = match parse_recurrence(&event.id, rule) {
            Ok(config) => config,
            Err(err) => {
                warn!(event_id = %event.id, %err, "treating event as non-recurring");
                continue;
            }
        };
        if !config.is_recurring() {
            continue;
        }

        let starts = generate_occurrences(&start, &config, horizon);
        // Index 0 is the base occurrence, already placed above.
        for (index, occurrence_start) in starts.iter().enumerate().skip(1) {
            let occurrence_end = shift_end(&start, &end, occurrence_start);
            place(
                &mut buckets,
                window,
                event,
                occurrence_start,
                &occurrence_end,
                index as u32,
            );
        }
    }

    buckets.dedup_in_place();
    buckets
}

/// Places one occurrence's span into the buckets, keeping only the days
/// present in the window.
fn place(
    buckets: &mut DayBuckets,
    window: &DisplayWindow,
    event: &SyncedEvent,
    start: &EventTime,
    end: &EventTime,
    occurrence_index: u32,
) {
    let recurrence_id =
        (occurrence_index > 0).then(|| format!("{}-recurrence-{}", event.id, occurrence_index));

    for span in assign_span(start, end) {
        if !window.contains(&span.day) {
            continue;
        }
        buckets.insert(PlacedEvent {
            event: event.clone(),
            start: start.clone(),
            end: end.clone(),
            occurrence_index,
            recurrence_id: recurrence_id.clone(),
            day: span.day,
            is_first_day: span.is_first_day,
            is_last_day: span.is_last_day,
            is_multi_day: span.is_multi_day,
            total_days: span.total_days,
        });
    }
}

/// Validates and parses an event's stored start/end into typed times.
fn parse_event_times(event: &SyncedEvent) -> GridResult<(EventTime, EventTime)> {
    let start = parse_instant(event, "start", &event.start)?;
    let end = parse_instant(event, "end", &event.end)?;
    Ok((start, end))
}

fn parse_instant(event: &SyncedEvent, field: &'static str, value: &str) -> GridResult<EventTime> {
    let trimmed = value.trim();
    if event.all_day {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Ok(EventTime::from_date(date));
        }
        // Some sources store all-day bounds as full timestamps.
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(EventTime::from_date(dt.date_naive()));
        }
    } else if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(EventTime::from_fixed(dt));
    }
    Err(GridError::InvalidDate {
        event_id: event.id.clone(),
        field,
        value: value.to_string(),
    })
}

/// Computes an occurrence's end from the base event's duration.
///
/// All-day events preserve the day count; timed events preserve the clock
/// duration.
fn shift_end(base_start: &EventTime, base_end: &EventTime, occurrence_start: &EventTime) -> EventTime {
    match (base_start, base_end) {
        (EventTime::AllDay(start_date), EventTime::AllDay(end_date)) => {
            let days = (*end_date - *start_date).num_days().max(0);
            EventTime::AllDay(occurrence_start.date() + Duration::days(days))
        }
        _ => {
            let duration = base_end.to_utc_datetime() - base_start.to_utc_datetime();
            match occurrence_start {
                EventTime::DateTime(dt) => EventTime::from_fixed(*dt + duration),
                EventTime::AllDay(date) => {
                    EventTime::AllDay(*date + Duration::days(duration.num_days().max(0)))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn key(y: i32, m: u32, d: u32) -> DayKey {
        DayKey::from_ymd(y, m, d).unwrap()
    }

    fn april_window() -> DisplayWindow {
        DisplayWindow::from_range(key(2025, 4, 1), key(2025, 4, 30))
    }

    fn timed(id: &str, title: &str, start: &str, end: &str) -> SyncedEvent {
        SyncedEvent::new(id, title, start, end, "primary")
    }

    mod placement {
        use super::*;

        #[test]
        fn single_event_lands_on_its_day() {
            let events = vec![timed(
                "evt-1",
                "Review",
                "2025-04-03T14:00:00Z",
                "2025-04-03T15:00:00Z",
            )];
            let buckets = build_month_grid(&events, &april_window());

            assert_eq!(buckets.len(), 1);
            let entries = buckets.get(&key(2025, 4, 3)).unwrap();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].event.id, "evt-1");
            assert_eq!(entries[0].occurrence_index, 0);
            assert!(entries[0].recurrence_id.is_none());
        }

        #[test]
        fn multi_day_event_lands_on_every_covered_day() {
            let events = vec![timed(
                "evt-1",
                "Offsite",
                "2025-04-15T09:00:00Z",
                "2025-04-17T17:00:00Z",
            )];
            let buckets = build_month_grid(&events, &april_window());

            assert_eq!(buckets.len(), 3);
            let first = &buckets.get(&key(2025, 4, 15)).unwrap()[0];
            assert!(first.is_first_day && !first.is_last_day && first.is_multi_day);
            let last = &buckets.get(&key(2025, 4, 17)).unwrap()[0];
            assert!(last.is_last_day && !last.is_first_day);
            assert_eq!(last.total_days, 3);
        }

        #[test]
        fn days_outside_window_are_dropped() {
            let events = vec![timed(
                "evt-1",
                "Spanning",
                "2025-04-29T09:00:00Z",
                "2025-05-02T17:00:00Z",
            )];
            let buckets = build_month_grid(&events, &april_window());

            assert_eq!(buckets.len(), 2); // Apr 29, Apr 30 only
            assert!(buckets.get(&key(2025, 5, 1)).is_none());
        }

        #[test]
        fn all_day_plus_one_occupies_single_bucket() {
            let events = vec![
                timed("evt-1", "Holiday", "2025-04-21", "2025-04-22").with_all_day(true),
            ];
            let buckets = build_month_grid(&events, &april_window());

            assert_eq!(buckets.len(), 1);
            assert!(buckets.get(&key(2025, 4, 21)).is_some());
            assert!(buckets.get(&key(2025, 4, 22)).is_none());
        }

        #[test]
        fn empty_window_yields_empty_buckets() {
            let events = vec![timed(
                "evt-1",
                "Review",
                "2025-04-03T14:00:00Z",
                "2025-04-03T15:00:00Z",
            )];
            let buckets = build_month_grid(&events, &DisplayWindow::new([]));
            assert!(buckets.is_empty());
        }
    }

    mod recurrence_expansion {
        use super::*;

        #[test]
        fn standup_scenario() {
            // Weekly Monday/Wednesday from a Tuesday anchor, four
            // occurrences total.
            let rule = r#"{
                "pattern": "weekly",
                "interval": 1,
                "weekdays": ["monday", "wednesday"],
                "endType": "after",
                "occurrences": 4
            }"#;
            let events = vec![
                timed("evt-1", "Standup", "2025-04-01T09:00:00Z", "2025-04-01T09:30:00Z")
                    .with_recurrence(rule),
            ];
            let buckets = build_month_grid(&events, &april_window());

            let placed_days: Vec<DayKey> = buckets.days().copied().collect();
            assert_eq!(
                placed_days,
                vec![key(2025, 4, 1), key(2025, 4, 2), key(2025, 4, 7), key(2025, 4, 9)]
            );
            assert_eq!(buckets.total_entries(), 4);

            let base = &buckets.get(&key(2025, 4, 1)).unwrap()[0];
            assert_eq!(base.occurrence_index, 0);
            assert!(base.recurrence_id.is_none());

            let third = &buckets.get(&key(2025, 4, 7)).unwrap()[0];
            assert_eq!(third.occurrence_index, 2);
            assert_eq!(third.recurrence_id.as_deref(), Some("evt-1-recurrence-2"));
            assert_eq!(third.original_event_id(), "evt-1");
            // Duration preserved.
            assert_eq!(
                third.end.to_utc_datetime() - third.start.to_utc_datetime(),
                Duration::minutes(30)
            );
        }

        #[test]
        fn rrule_string_expansion() {
            let events = vec![
                timed("evt-1", "Scrum", "2025-04-28T08:00:00Z", "2025-04-28T08:15:00Z")
                    .with_recurrence("RRULE:FREQ=DAILY;COUNT=3"),
            ];
            let buckets = build_month_grid(&events, &april_window());

            let placed_days: Vec<DayKey> = buckets.days().copied().collect();
            assert_eq!(
                placed_days,
                vec![key(2025, 4, 28), key(2025, 4, 29), key(2025, 4, 30)]
            );
        }

        #[test]
        fn occurrences_follow_base_within_a_day() {
            // A daily event overlapping midnight places base and occurrence
            // segments; within one day the base entry comes first.
            let events = vec![
                timed("evt-1", "Night shift", "2025-04-01T22:00:00Z", "2025-04-02T02:00:00Z")
                    .with_recurrence("FREQ=DAILY;COUNT=2"),
            ];
            let buckets = build_month_grid(&events, &april_window());

            let april_second = buckets.get(&key(2025, 4, 2)).unwrap();
            assert_eq!(april_second.len(), 2);
            assert_eq!(april_second[0].occurrence_index, 0);
            assert_eq!(april_second[1].occurrence_index, 1);
        }

        #[test]
        fn all_day_recurrence_preserves_day_count() {
            let events = vec![
                timed("evt-1", "Sprint", "2025-04-07", "2025-04-09")
                    .with_all_day(true)
                    .with_recurrence(r#"{"pattern": "weekly", "endType": "after", "occurrences": 2}"#),
            ];
            let buckets = build_month_grid(&events, &april_window());

            // Base: Apr 7-9 (three days); occurrence 1: Apr 14-16.
            assert!(buckets.get(&key(2025, 4, 9)).is_some());
            assert!(buckets.get(&key(2025, 4, 14)).is_some());
            assert!(buckets.get(&key(2025, 4, 16)).is_some());
            let occurrence = &buckets.get(&key(2025, 4, 14)).unwrap()[0];
            assert_eq!(occurrence.total_days, 3);
        }

        #[test]
        fn unparseable_rule_keeps_base_occurrence() {
            let events = vec![
                timed("evt-1", "Oddity", "2025-04-03T10:00:00Z", "2025-04-03T11:00:00Z")
                    .with_recurrence("every other thursday"),
            ];
            let buckets = build_month_grid(&events, &april_window());

            assert_eq!(buckets.total_entries(), 1);
            assert!(buckets.get(&key(2025, 4, 3)).is_some());
        }

        #[test]
        fn unknown_pattern_keeps_base_occurrence() {
            let events = vec![
                timed("evt-1", "Oddity", "2025-04-03T10:00:00Z", "2025-04-03T11:00:00Z")
                    .with_recurrence(r#"{"pattern": "fortnightly"}"#),
            ];
            let buckets = build_month_grid(&events, &april_window());

            assert_eq!(buckets.total_entries(), 1);
        }
    }

    mod error_recovery {
        use super::*;

        #[test]
        fn invalid_dates_skip_the_event_only() {
            let events = vec![
                timed("evt-bad", "Broken", "not-a-date", "2025-04-03T15:00:00Z"),
                timed("evt-good", "Fine", "2025-04-03T14:00:00Z", "2025-04-03T15:00:00Z"),
            ];
            let buckets = build_month_grid(&events, &april_window());

            assert_eq!(buckets.total_entries(), 1);
            assert_eq!(buckets.get(&key(2025, 4, 3)).unwrap()[0].event.id, "evt-good");
        }

        #[test]
        fn invalid_end_also_skips() {
            let events = vec![timed("evt-bad", "Broken", "2025-04-03T14:00:00Z", "later")];
            let buckets = build_month_grid(&events, &april_window());
            assert!(buckets.is_empty());
        }

        #[test]
        fn recurring_event_with_invalid_dates_generates_nothing() {
            let events = vec![
                timed("evt-bad", "Broken", "garbage", "garbage").with_recurrence("FREQ=DAILY"),
            ];
            let buckets = build_month_grid(&events, &april_window());
            assert!(buckets.is_empty());
        }
    }

    mod pipeline_properties {
        use super::*;

        #[test]
        fn idempotent_across_passes() {
            let rule = r#"{"pattern": "daily", "endType": "after", "occurrences": 5}"#;
            let events = vec![
                timed("evt-1", "Standup", "2025-04-01T09:00:00Z", "2025-04-01T09:30:00Z")
                    .with_recurrence(rule),
                timed("evt-2", "Offsite", "2025-04-15T09:00:00Z", "2025-04-17T17:00:00Z"),
                timed("evt-3", "Holiday", "2025-04-21", "2025-04-22").with_all_day(true),
            ];
            let window = april_window();

            let first = build_month_grid(&events, &window);
            let second = build_month_grid(&events, &window);
            assert_eq!(first, second);
        }

        #[test]
        fn input_events_are_not_mutated() {
            let events = vec![timed(
                "evt-1",
                "Review",
                "2025-04-03T14:00:00Z",
                "2025-04-03T15:00:00Z",
            )];
            let snapshot = events.clone();
            let _ = build_month_grid(&events, &april_window());
            assert_eq!(events, snapshot);
        }

        #[test]
        fn duplicated_sync_copies_collapse_per_day() {
            let stub = timed(
                "local-1",
                "Board Meeting",
                "2025-04-10T12:00:00Z",
                "2025-04-10T13:00:00Z",
            )
            .with_uid("evt-123");
            let synced = timed(
                "remote-1",
                "Board Meeting",
                "2025-04-10T12:00:00Z",
                "2025-04-10T13:00:00Z",
            )
            .with_uid("evt-123")
            .with_url("https://cal.example.com/evt-123");

            let buckets = build_month_grid(&[stub, synced], &april_window());

            let entries = buckets.get(&key(2025, 4, 10)).unwrap();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].event.id, "remote-1");
        }

        #[test]
        fn stable_order_follows_input_order() {
            let events = vec![
                timed("evt-b", "Second", "2025-04-03T15:00:00Z", "2025-04-03T16:00:00Z"),
                timed("evt-a", "First", "2025-04-03T09:00:00Z", "2025-04-03T10:00:00Z"),
            ];
            let buckets = build_month_grid(&events, &april_window());

            let entries = buckets.get(&key(2025, 4, 3)).unwrap();
            // Input order, not time order.
            assert_eq!(entries[0].event.id, "evt-b");
            assert_eq!(entries[1].event.id, "evt-a");
        }
    }
}
