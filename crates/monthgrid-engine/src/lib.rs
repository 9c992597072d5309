//! Recurring-event expansion and calendar-grid placement.
//!
//! Turns a flat collection of stored events (each with a start/end, an
//! optional recurrence rule, and an optional multi-day span) into the exact
//! per-day entries a month view renders, with duplicated sync copies of the
//! same logical event collapsed to their most complete representative.
//!
//! ## Modules
//!
//! - [`parse`] — two-grammar recurrence rules → canonical config
//! - [`generate`] — canonical config → bounded occurrence sequence
//! - [`span`] — occurrence start/end → covered days with multi-day markers
//! - [`bucket`] — full event list → per-day bucket map
//! - [`dedup`] — per-day collapse of duplicated sync copies
//! - [`error`] — error taxonomy (every error is locally recovered)
//!
//! The pipeline is synchronous and pure: the same events and window always
//! produce the same bucket map, and nothing reads ambient timezone state.
//!
//! # Example
//!
//! ```
//! use monthgrid_core::{DayKey, DisplayWindow, SyncedEvent};
//! use monthgrid_engine::build_month_grid;
//!
//! let events = vec![
//!     SyncedEvent::new(
//!         "evt-1",
//!         "Planning",
//!         "2025-04-03T14:00:00Z",
//!         "2025-04-03T15:00:00Z",
//!         "primary",
//!     ),
//! ];
//! let window = DisplayWindow::from_range(
//!     DayKey::from_ymd(2025, 4, 1).unwrap(),
//!     DayKey::from_ymd(2025, 4, 30).unwrap(),
//! );
//!
//! let buckets = build_month_grid(&events, &window);
//! assert_eq!(buckets.total_entries(), 1);
//! ```

pub mod bucket;
pub mod dedup;
pub mod error;
pub mod generate;
pub mod parse;
pub mod span;


pub use bucket::{DayBuckets, build_month_grid};
pub use dedup::dedup_day;
pub use error::{GridError, GridResult};
pub use generate::{MAX_OCCURRENCES, generate_occurrences};
pub use parse::{parse_recurrence, parse_recurrence_field};
pub use span::{DaySpan, MAX_SPAN_DAYS, assign_span};
