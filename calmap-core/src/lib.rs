//! Core types for the calmap calendar reconciliation engine.
//!
//! This crate holds the parts with real design content:
//! - [`TimeZone`] and [`Instant`] for zone-aware points in time
//! - [`Event`] and [`Participant`] value objects with construction-time
//!   validation, structural equality and field-level diffing
//! - [`perform_event_mapping`] to partition two event collections into
//!   common pairs, left-only and right-only sets
//! - [`RecurrenceRule`] to expand repeating-event definitions into
//!   concrete occurrences
//!
//! Everything here is synchronous and immutable; calendar sources that
//! produce the event collections live in provider crates.

pub mod date;
pub mod error;
pub mod event;
pub mod mapping;
pub mod recurrence;

pub use date::{Instant, TimeZone};
pub use error::{CoreError, CoreResult};
pub use event::{Event, EventKind, EventProjection, Participant};
pub use mapping::{EventMapping, perform_event_mapping};
pub use recurrence::{RecurrenceRule, RepeatKind};
