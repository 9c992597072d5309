//! Time types for calendar-grid placement.
//!
//! This module provides [`DayKey`] (the canonical calendar-day identifier
//! used as the bucket key everywhere), [`EventTime`] for representing event
//! start/end times (which may be either a specific instant or an all-day
//! date), and [`DisplayWindow`] for the set of days a month view renders.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Canonical identifier for a calendar day, rendered as `YYYY-MM-DD`.
///
/// Keys are derived from an event's *stored* calendar date, never from a
/// viewer-local conversion, so the same stored instant always yields the
/// same key. Keys order chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(NaiveDate);

impl DayKey {
    /// Creates a day key for the given date.
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Creates a day key from year/month/day components.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Returns the underlying date.
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Returns the key for the following day.
    pub fn succ(&self) -> Self {
        Self(self.0.succ_opt().expect("valid successor date"))
    }

    /// Returns the signed number of days from this key to `other`.
    pub fn days_until(&self, other: &DayKey) -> i64 {
        (other.0 - self.0).num_days()
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DayKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Self)
    }
}

impl Serialize for DayKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl serde::de::Visitor<'_> for KeyVisitor {
            type Value = DayKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a YYYY-MM-DD day key")
            }

            fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<DayKey, E> {
                value.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(KeyVisitor)
    }
}

/// Represents the time of a calendar event.
///
/// Calendar events can have two types of times:
/// - **DateTime**: A specific instant, stored with the offset it was
///   recorded in by the sync source
/// - **AllDay**: A date without a specific time (all-day events)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EventTime {
    /// A specific instant, keeping the recorded offset.
    DateTime(DateTime<FixedOffset>),
    /// An all-day event date (no specific time).
    AllDay(NaiveDate),
}

impl EventTime {
    /// Creates a new `EventTime::DateTime` from a UTC datetime.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt.fixed_offset())
    }

    /// Creates a new `EventTime::DateTime` keeping the recorded offset.
    pub fn from_fixed(dt: DateTime<FixedOffset>) -> Self {
        Self::DateTime(dt)
    }

    /// Creates a new `EventTime::AllDay` from a date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self::AllDay(date)
    }

    /// Returns `true` if this is an all-day event time.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }

    /// Returns `true` if this is a specific instant.
    pub fn is_datetime(&self) -> bool {
        matches!(self, Self::DateTime(_))
    }

    /// Returns the instant if this is a `DateTime` variant.
    pub fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Self::DateTime(dt) => Some(dt),
            Self::AllDay(_) => None,
        }
    }

    /// Returns the date if this is an `AllDay` variant.
    pub fn as_date(&self) -> Option<&NaiveDate> {
        match self {
            Self::AllDay(d) => Some(d),
            Self::DateTime(_) => None,
        }
    }

    /// Converts to a UTC datetime for comparison purposes.
    ///
    /// For all-day events, returns midnight UTC on that date.
    pub fn to_utc_datetime(&self) -> DateTime<Utc> {
        match self {
            Self::DateTime(dt) => dt.with_timezone(&Utc),
            Self::AllDay(date) => date.and_hms_opt(0, 0, 0).expect("valid time").and_utc(),
        }
    }

    /// Returns the calendar date of this event time as stored.
    ///
    /// For timed events this is the date in the recorded offset, not the
    /// date after conversion to any viewer timezone.
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::DateTime(dt) => dt.date_naive(),
            Self::AllDay(date) => *date,
        }
    }

    /// Returns the day key this event time buckets into.
    ///
    /// The key comes from the stored representation's own date fields; no
    /// viewer-timezone conversion is ever involved, so an instant stored as
    /// midnight UTC keys to the same calendar day for every viewer.
    pub fn day_key(&self) -> DayKey {
        DayKey::new(self.date())
    }

    /// Checks if this event time is before another event time.
    ///
    /// All-day events are compared at midnight UTC.
    pub fn is_before(&self, other: &EventTime) -> bool {
        self.to_utc_datetime() < other.to_utc_datetime()
    }

    /// Checks if this event time is after another event time.
    ///
    /// All-day events are compared at midnight UTC.
    pub fn is_after(&self, other: &EventTime) -> bool {
        self.to_utc_datetime() > other.to_utc_datetime()
    }
}

impl PartialOrd for EventTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_utc_datetime().cmp(&other.to_utc_datetime())
    }
}

/// The ordered set of days the current month view renders.
///
/// Typically 35 or 42 cells for a month grid. Days are kept sorted and
/// deduplicated; containment checks are by binary search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayWindow {
    days: Vec<DayKey>,
}

impl DisplayWindow {
    /// Creates a window from an arbitrary collection of day keys.
    ///
    /// Duplicates are removed and the days are sorted chronologically.
    pub fn new(days: impl IntoIterator<Item = DayKey>) -> Self {
        let mut days: Vec<DayKey> = days.into_iter().collect();
        days.sort();
        days.dedup();
        Self { days }
    }

    /// Creates a window covering every day from `first` through `last`
    /// inclusive.
    ///
    /// # Panics
    ///
    /// Panics if `first` is after `last`.
    pub fn from_range(first: DayKey, last: DayKey) -> Self {
        assert!(first <= last, "DisplayWindow first day must be <= last day");
        let mut days = Vec::new();
        let mut day = first;
        while day <= last {
            days.push(day);
            day = day.succ();
        }
        Self { days }
    }

    /// Creates the full month grid for the given month: every day of the
    /// month plus the leading/trailing days needed to pad to whole weeks
    /// starting on `week_start` (35 or 42 cells for most months).
    pub fn month_grid(year: i32, month: u32, week_start: Weekday) -> Option<Self> {
        let first_of_month = NaiveDate::from_ymd_opt(year, month, 1)?;
        let last_of_month = first_of_month
            .checked_add_months(Months::new(1))?
            .pred_opt()?;

        let lead = (first_of_month.weekday().num_days_from_monday() + 7
            - week_start.num_days_from_monday())
            % 7;
        let grid_first = first_of_month.checked_sub_signed(Duration::days(i64::from(lead)))?;

        let span = i64::from(lead) + i64::from(last_of_month.day());
        let cells = ((span + 6) / 7) * 7;
        let grid_last = grid_first.checked_add_signed(Duration::days(cells - 1))?;

        Some(Self::from_range(DayKey::new(grid_first), DayKey::new(grid_last)))
    }

    /// Checks if a day key is part of this window.
    pub fn contains(&self, key: &DayKey) -> bool {
        self.days.binary_search(key).is_ok()
    }

    /// Returns the first (earliest) day of the window.
    pub fn first(&self) -> Option<DayKey> {
        self.days.first().copied()
    }

    /// Returns the last (latest) day of the window.
    pub fn last(&self) -> Option<DayKey> {
        self.days.last().copied()
    }

    /// Returns the days of the window in chronological order.
    pub fn days(&self) -> &[DayKey] {
        &self.days
    }

    /// Iterates over the days of the window in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = &DayKey> {
        self.days.iter()
    }

    /// Returns the number of days in the window.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Returns `true` if the window contains no days.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Returns the occurrence-generation horizon for this window: the end
    /// of the day one calendar month past the last visible day, so that
    /// multi-day spillover into the window is always covered.
    ///
    /// Returns `None` for an empty window.
    pub fn horizon(&self) -> Option<DateTime<Utc>> {
        let last = self.days.last()?;
        let shifted = last.date().checked_add_months(Months::new(1))?;
        Some(shifted.and_hms_opt(23, 59, 59).expect("valid time").and_utc())
    }
}
