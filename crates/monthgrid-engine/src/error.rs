//! Error types for grid computation.
//!
//! Every error here is locally recovered: the assembly loop reports it as a
//! warning and degrades (skips the event, or shows only its base
//! occurrence). None of them abort a computation pass.

use thiserror::Error;

/// Errors that can occur while expanding and placing events.
#[derive(Debug, Error)]
pub enum GridError {
    /// An event's stored start or end failed to parse to a valid instant.
    /// The whole event is skipped for the pass.
    #[error("invalid {field} '{value}' for event '{event_id}'")]
    InvalidDate {
        event_id: String,
        field: &'static str,
        value: String,
    },

    /// A recurrence rule was present but unparseable in either supported
    /// format. The event is treated as non-recurring.
    #[error("unparseable recurrence rule for event '{event_id}': {rule}")]
    RecurrenceParse { event_id: String, rule: String },

    /// A structurally valid rule carried an unrecognized pattern value.
    /// Occurrence generation stops; the base occurrence is still shown.
    #[error("unknown recurrence pattern '{pattern}'")]
    UnknownPattern { pattern: String },
}

/// Result type alias for grid operations.
pub type GridResult<T> = Result<T, GridError>;
