//! Event types for calendar-grid placement.
//!
//! This module provides the two event representations the engine works with:
//! - [`SyncedEvent`]: the stored record exactly as the sync layer holds it
//! - [`PlacedEvent`]: a per-day, display-ready entry derived from a synced
//!   event during one computation pass
//!
//! Synced events are owned by the external store; the engine only reads them
//! and produces derived copies that are never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time::{DayKey, EventTime};

/// A calendar event as held by the sync layer.
///
/// Start and end are kept as the stored text (RFC 3339 for timed events,
/// `YYYY-MM-DD` for all-day events) because records arrive from an external
/// synchronization source with no validity guarantee; validating them is the
/// engine's job, and an invalid record must degrade rather than poison the
/// whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncedEvent {
    /// Unique identifier within the local store.
    pub id: String,
    /// Stable logical identity assigned by the sync source, when known.
    /// Duplicated sync copies of one logical event share this.
    pub uid: Option<String>,
    /// The event title/summary.
    pub title: String,
    /// Stored start, as text.
    pub start: String,
    /// Stored end, as text.
    pub end: String,
    /// Whether this is an all-day event.
    pub all_day: bool,
    /// The calendar this event belongs to.
    pub calendar_id: String,
    /// Raw recurrence rule: a JSON-encoded structured config, an iCalendar
    /// `RRULE` string, or absent.
    pub recurrence: Option<String>,
    /// Entity tag from the sync source; presence means the copy was
    /// confirmed by the remote.
    pub etag: Option<String>,
    /// URL of the event at the remote source.
    pub url: Option<String>,
    /// The event description.
    pub description: Option<String>,
    /// Attendee addresses.
    pub attendees: Vec<String>,
    /// Booked resources (rooms, equipment).
    pub resources: Vec<String>,
    /// When the sync layer last attempted to reconcile this record.
    pub last_sync_attempt: Option<DateTime<Utc>>,
}

impl SyncedEvent {
    /// Creates a new event with required fields.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
        calendar_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            uid: None,
            title: title.into(),
            start: start.into(),
            end: end.into(),
            all_day: false,
            calendar_id: calendar_id.into(),
            recurrence: None,
            etag: None,
            url: None,
            description: None,
            attendees: Vec::new(),
            resources: Vec::new(),
            last_sync_attempt: None,
        }
    }

    /// Builder method to set the sync-source uid.
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    /// Builder method to mark the event all-day.
    pub fn with_all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }

    /// Builder method to set the raw recurrence rule.
    pub fn with_recurrence(mut self, rule: impl Into<String>) -> Self {
        self.recurrence = Some(rule.into());
        self
    }

    /// Builder method to set the etag.
    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    /// Builder method to set the remote URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to add an attendee.
    pub fn with_attendee(mut self, attendee: impl Into<String>) -> Self {
        self.attendees.push(attendee.into());
        self
    }

    /// Builder method to set the resource list.
    pub fn with_resources(mut self, resources: Vec<String>) -> Self {
        self.resources = resources;
        self
    }

    /// Builder method to set the last sync attempt timestamp.
    pub fn with_last_sync_attempt(mut self, at: DateTime<Utc>) -> Self {
        self.last_sync_attempt = Some(at);
        self
    }

    /// Returns `true` if the record carries a non-empty remote URL,
    /// the strongest confirmation that the remote source knows this copy.
    pub fn has_remote_url(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.is_empty())
    }

    /// Returns `true` if the record carries a non-empty etag.
    pub fn has_etag(&self) -> bool {
        self.etag.as_deref().is_some_and(|e| !e.is_empty())
    }

    /// Counts how many optional fields this record has populated.
    ///
    /// Used to rank near-identical sync copies by informational
    /// completeness.
    pub fn populated_field_count(&self) -> usize {
        let mut count = 0;
        if self.uid.as_deref().is_some_and(|u| !u.is_empty()) {
            count += 1;
        }
        if self.has_remote_url() {
            count += 1;
        }
        if self.has_etag() {
            count += 1;
        }
        if self.description.as_deref().is_some_and(|d| !d.is_empty()) {
            count += 1;
        }
        if !self.attendees.is_empty() {
            count += 1;
        }
        if !self.resources.is_empty() {
            count += 1;
        }
        if self.recurrence.is_some() {
            count += 1;
        }
        if self.last_sync_attempt.is_some() {
            count += 1;
        }
        count
    }

    /// Combined length of the title and description text.
    ///
    /// Final tie-break when ranking sync copies.
    pub fn text_weight(&self) -> usize {
        self.title.len() + self.description.as_deref().map_or(0, str::len)
    }
}

/// One entry of a day bucket: an event (or a generated occurrence of a
/// recurring event) placed on a specific calendar day.
///
/// Placed events are created fresh on every computation pass and discarded
/// once the rendering layer consumes them; they are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedEvent {
    /// The source record this entry was derived from.
    pub event: SyncedEvent,
    /// Start of this occurrence (the base start for index 0).
    pub start: EventTime,
    /// End of this occurrence, duration preserved from the base event.
    pub end: EventTime,
    /// 0 for the base occurrence, counting up for generated ones.
    pub occurrence_index: u32,
    /// Synthetic stable identifier `{event_id}-recurrence-{index}` for
    /// generated occurrences; `None` for the base.
    pub recurrence_id: Option<String>,
    /// The day this entry is bucketed under.
    pub day: DayKey,
    /// Whether this day is the first of the occurrence's span.
    pub is_first_day: bool,
    /// Whether this day is the last of the occurrence's span.
    pub is_last_day: bool,
    /// Whether the occurrence spans more than one day.
    pub is_multi_day: bool,
    /// Total days in the occurrence's span.
    pub total_days: u32,
}

impl PlacedEvent {
    /// Returns the identifier to key this entry by in a rendered list:
    /// the synthetic recurrence id for generated occurrences, the event id
    /// for the base.
    pub fn display_id(&self) -> &str {
        self.recurrence_id.as_deref().unwrap_or(&self.event.id)
    }

    /// The id of the event this entry was derived from.
    pub fn original_event_id(&self) -> &str {
        &self.event.id
    }

    /// Returns `true` for generated occurrences (index > 0).
    pub fn is_occurrence(&self) -> bool {
        self.occurrence_index > 0
    }

    /// Start instant in epoch milliseconds, the identity component used by
    /// deduplication.
    pub fn start_millis(&self) -> i64 {
        self.start.to_utc_datetime().timestamp_millis()
    }
}
