//! Canonical recurrence model.
//!
//! Recurrence rules arrive from the sync layer in two grammars (a structured
//! JSON object or an iCalendar `RRULE` string). Both normalize into
//! [`RecurrenceConfig`]; nothing downstream of the parser ever branches on
//! the original format.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How often a recurring event repeats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecurrencePattern {
    /// Not recurring.
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// Structurally valid rule with an unrecognized pattern value;
    /// generation stops at the base occurrence.
    Unknown,
}

impl RecurrencePattern {
    /// Returns the canonical lowercase name for this pattern.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Unknown => "unknown",
        }
    }

    /// Parses a pattern name case-insensitively.
    ///
    /// Anything unrecognized maps to [`RecurrencePattern::Unknown`] rather
    /// than failing, so a structurally valid rule with a pattern this engine
    /// does not know still displays its base occurrence.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Self::None,
            "daily" => Self::Daily,
            "weekly" => Self::Weekly,
            "monthly" => Self::Monthly,
            "yearly" => Self::Yearly,
            _ => Self::Unknown,
        }
    }

    /// Returns `true` if this pattern generates occurrences.
    pub fn is_recurring(&self) -> bool {
        matches!(self, Self::Daily | Self::Weekly | Self::Monthly | Self::Yearly)
    }
}

impl fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RecurrencePattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RecurrencePattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::parse(&value))
    }
}

/// Error returned when a weekday name or code is not recognized.
#[derive(Debug, Error)]
#[error("unrecognized weekday '{0}'")]
pub struct UnknownWeekday(String);

/// Day of week for weekly recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Returns the lowercase full name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }

    /// Maps an iCalendar two-letter `BYDAY` code (`MO`, `TU`, ...).
    pub fn from_byday(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "MO" => Some(Self::Monday),
            "TU" => Some(Self::Tuesday),
            "WE" => Some(Self::Wednesday),
            "TH" => Some(Self::Thursday),
            "FR" => Some(Self::Friday),
            "SA" => Some(Self::Saturday),
            "SU" => Some(Self::Sunday),
            _ => None,
        }
    }

    /// Converts to the chrono weekday for date arithmetic.
    pub fn to_chrono(self) -> chrono::Weekday {
        match self {
            Self::Monday => chrono::Weekday::Mon,
            Self::Tuesday => chrono::Weekday::Tue,
            Self::Wednesday => chrono::Weekday::Wed,
            Self::Thursday => chrono::Weekday::Thu,
            Self::Friday => chrono::Weekday::Fri,
            Self::Saturday => chrono::Weekday::Sat,
            Self::Sunday => chrono::Weekday::Sun,
        }
    }

    /// Converts from the chrono weekday.
    pub fn from_chrono(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = UnknownWeekday;

    /// Accepts full names case-insensitively, plus two-letter BYDAY codes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monday" => Ok(Self::Monday),
            "tuesday" => Ok(Self::Tuesday),
            "wednesday" => Ok(Self::Wednesday),
            "thursday" => Ok(Self::Thursday),
            "friday" => Ok(Self::Friday),
            "saturday" => Ok(Self::Saturday),
            "sunday" => Ok(Self::Sunday),
            _ => Weekday::from_byday(s).ok_or_else(|| UnknownWeekday(s.to_string())),
        }
    }
}

impl Serialize for Weekday {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Weekday {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// When a recurrence stops generating occurrences.
///
/// The shape guarantees that exactly one of the occurrence count and the
/// until-instant is meaningful.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum RecurrenceEnd {
    /// Repeats until the generation horizon.
    #[default]
    Never,
    /// Stops after a total number of occurrences (the base counts).
    After { occurrences: u32 },
    /// Stops at the given instant, inclusive.
    On { until: chrono::DateTime<chrono::Utc> },
}

/// Canonical recurrence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceConfig {
    /// The repeat pattern.
    pub pattern: RecurrencePattern,
    /// Every `interval` days/weeks/months/years (at least 1).
    pub interval: u32,
    /// Weekday set, meaningful for weekly patterns only.
    pub weekdays: BTreeSet<Weekday>,
    /// End condition.
    pub end: RecurrenceEnd,
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self::none()
    }
}

impl RecurrenceConfig {
    /// Creates a config for the given pattern with defaults
    /// (`interval = 1`, no weekday set, never ends).
    pub fn new(pattern: RecurrencePattern) -> Self {
        Self {
            pattern,
            interval: 1,
            weekdays: BTreeSet::new(),
            end: RecurrenceEnd::Never,
        }
    }

    /// The non-recurring config, used for absent or unparseable rules.
    pub fn none() -> Self {
        Self::new(RecurrencePattern::None)
    }

    /// Builder method to set the interval (clamped to at least 1).
    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval.max(1);
        self
    }

    /// Builder method to set the weekday set.
    pub fn with_weekdays(mut self, weekdays: impl IntoIterator<Item = Weekday>) -> Self {
        self.weekdays = weekdays.into_iter().collect();
        self
    }

    /// Builder method to set the end condition.
    pub fn with_end(mut self, end: RecurrenceEnd) -> Self {
        self.end = end;
        self
    }

    /// Returns `true` if this config generates occurrences.
    pub fn is_recurring(&self) -> bool {
        self.pattern.is_recurring()
    }
}
