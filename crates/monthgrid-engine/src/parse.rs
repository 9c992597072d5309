//! Recurrence-rule parsing.
//!
//! Stored recurrence rules come in two grammars: a JSON-encoded structured
//! config, or an iCalendar-style `RRULE` string (optionally prefixed
//! `RRULE:`). Both normalize into the canonical
//! [`RecurrenceConfig`]; nothing downstream branches on the source format.
//!
//! Malformed scalar values inside an otherwise recognizable rule degrade
//! per-token with a warning (default interval, skipped weekday code)
//! rather than rejecting the whole rule: a degraded schedule is still
//! better than losing the event's recurrence entirely.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use monthgrid_core::{RecurrenceConfig, RecurrenceEnd, RecurrencePattern, Weekday};

use crate::error::{GridError, GridResult};

/// Date-only UNTIL literal (`20250430`).
static UNTIL_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{8}$").expect("valid UNTIL date regex"));

/// Date-time UNTIL literal (`20250430T235959Z`, trailing `Z` optional).
static UNTIL_DATETIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{8}T\d{6}Z?$").expect("valid UNTIL datetime regex"));

/// Two-letter BYDAY token (`MO`, `tu`).
static BYDAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i)(MO|TU|WE|TH|FR|SA|SU)$").expect("valid BYDAY regex"));

/// Wire shape of a structured recurrence rule as the sync layer stores it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecurrenceConfig {
    pattern: Option<String>,
    #[serde(default = "default_interval")]
    interval: u32,
    #[serde(default)]
    weekdays: Vec<Weekday>,
    #[serde(default)]
    end_type: RawEndType,
    occurrences: Option<u32>,
    until_instant: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawEndType {
    #[default]
    Never,
    After,
    On,
}

fn default_interval() -> u32 {
    1
}

/// Parses an event's raw recurrence field.
///
/// An absent or blank field is simply a non-recurring event.
pub fn parse_recurrence_field(event_id: &str, raw: Option<&str>) -> GridResult<RecurrenceConfig> {
    match raw {
        Some(rule) if !rule.trim().is_empty() => parse_recurrence(event_id, rule),
        _ => Ok(RecurrenceConfig::none()),
    }
}

/// Normalizes a raw recurrence rule into the canonical config.
///
/// Tries the structured-JSON grammar first, then the `RRULE` grammar; a
/// string that matches neither is a [`GridError::RecurrenceParse`] and the
/// caller treats the event as non-recurring.
pub fn parse_recurrence(event_id: &str, raw: &str) -> GridResult<RecurrenceConfig> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(RecurrenceConfig::none());
    }

    if let Ok(raw_config) = serde_json::from_str::<RawRecurrenceConfig>(trimmed) {
        if let Some(config) = from_structured(event_id, raw_config) {
            return Ok(config);
        }
    }

    let body = trimmed.strip_prefix("RRULE:").unwrap_or(trimmed);
    if body.to_ascii_uppercase().contains("FREQ=") {
        return parse_rrule(event_id, body);
    }

    Err(GridError::RecurrenceParse {
        event_id: event_id.to_string(),
        rule: raw.to_string(),
    })
}

/// Converts a decoded structured config into the canonical form.
///
/// Returns `None` when the object carried no `pattern` field at all, which
/// sends the caller on to the RRULE grammar.
fn from_structured(event_id: &str, raw: RawRecurrenceConfig) -> Option<RecurrenceConfig> {
    let pattern_text = raw.pattern?;
    let pattern = RecurrencePattern::parse(&pattern_text);
    if pattern == RecurrencePattern::Unknown {
        let err = GridError::UnknownPattern {
            pattern: pattern_text,
        };
        warn!(event_id, %err, "keeping base occurrence only");
    }

    let end = match raw.end_type {
        RawEndType::Never => RecurrenceEnd::Never,
        RawEndType::After => match raw.occurrences {
            Some(occurrences) if occurrences > 0 => RecurrenceEnd::After { occurrences },
            _ => {
                warn!(event_id, "endType 'after' without a positive occurrence count; treating as never-ending");
                RecurrenceEnd::Never
            }
        },
        RawEndType::On => match raw.until_instant {
            Some(until) => RecurrenceEnd::On { until },
            None => {
                warn!(event_id, "endType 'on' without an untilInstant; treating as never-ending");
                RecurrenceEnd::Never
            }
        },
    };

    let mut config = RecurrenceConfig::new(pattern)
        .with_interval(raw.interval)
        .with_end(end);
    if pattern == RecurrencePattern::Weekly {
        config = config.with_weekdays(raw.weekdays);
    }
    Some(config)
}

/// Parses the `;`-separated KEY=VALUE components of an RRULE body.
fn parse_rrule(event_id: &str, body: &str) -> GridResult<RecurrenceConfig> {
    let mut pattern = None;
    let mut interval = 1u32;
    let mut weekdays = BTreeSet::new();
    let mut count = None;
    let mut until = None;

    for component in body.split(';') {
        let component = component.trim();
        if component.is_empty() {
            continue;
        }
        let Some((key, value)) = component.split_once('=') else {
            warn!(event_id, component, "skipping malformed RRULE component");
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_uppercase().as_str() {
            "FREQ" => {
                let parsed = RecurrencePattern::parse(value);
                if parsed == RecurrencePattern::Unknown {
                    let err = GridError::UnknownPattern {
                        pattern: value.to_string(),
                    };
                    warn!(event_id, %err, "keeping base occurrence only");
                }
                pattern = Some(parsed);
            }
            "INTERVAL" => match value.parse::<u32>() {
                Ok(n) if n >= 1 => interval = n,
                _ => warn!(event_id, value, "invalid INTERVAL; defaulting to 1"),
            },
            "BYDAY" => {
                for code in value.split(',') {
                    let code = code.trim();
                    if BYDAY_RE.is_match(code) {
                        if let Some(day) = Weekday::from_byday(code) {
                            weekdays.insert(day);
                        }
                    } else {
                        warn!(event_id, code, "skipping unrecognized BYDAY code");
                    }
                }
            }
            "COUNT" => match value.parse::<u32>() {
                Ok(n) if n >= 1 => count = Some(n),
                _ => warn!(event_id, value, "ignoring invalid COUNT"),
            },
            "UNTIL" => match parse_until(value) {
                Some(instant) => until = Some(instant),
                None => warn!(event_id, value, "ignoring unparseable UNTIL"),
            },
            // Unsupported components (BYSETPOS, BYMONTHDAY, ...) are ignored.
            _ => {}
        }
    }

    let Some(pattern) = pattern else {
        return Err(GridError::RecurrenceParse {
            event_id: event_id.to_string(),
            rule: body.to_string(),
        });
    };

    // UNTIL wins over COUNT when both are present.
    let end = if let Some(until) = until {
        RecurrenceEnd::On { until }
    } else if let Some(occurrences) = count {
        RecurrenceEnd::After { occurrences }
    } else {
        RecurrenceEnd::Never
    };

    let mut config = RecurrenceConfig::new(pattern)
        .with_interval(interval)
        .with_end(end);
    if pattern == RecurrencePattern::Weekly {
        config = config.with_weekdays(weekdays);
    }
    Ok(config)
}

/// Parses an iCalendar UNTIL literal as UTC.
///
/// A date-only literal means the end of that day, so an occurrence on the
/// UNTIL day itself is kept.
fn parse_until(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if UNTIL_DATE_RE.is_match(value) {
        let date = NaiveDate::parse_from_str(value, "%Y%m%d").ok()?;
        return Some(date.and_hms_opt(23, 59, 59).expect("valid time").and_utc());
    }
    if UNTIL_DATETIME_RE.is_match(value) {
        let bare = value.trim_end_matches('Z');
        let dt = NaiveDateTime::parse_from_str(bare, "%Y%m%dT%H%M%S").ok()?;
        return Some(dt.and_utc());
    }
    None
}
