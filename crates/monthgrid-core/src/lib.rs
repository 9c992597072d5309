//! Core types: time, events, recurrence model

pub mod event;
pub mod recurrence;
pub mod time;
pub mod tracing;

pub use event::{PlacedEvent, SyncedEvent};
pub use recurrence::{
    RecurrenceConfig, RecurrenceEnd, RecurrencePattern, UnknownWeekday, Weekday,
};
pub use time::{DayKey, DisplayWindow, EventTime};
pub use self::tracing::{init_tracing, TracingConfig, TracingError, TracingOutputFormat};
