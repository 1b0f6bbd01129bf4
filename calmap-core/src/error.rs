//! Error types for the calmap core.

use thiserror::Error;

use crate::date::Instant;
use crate::event::Event;

/// Errors raised by the reconciliation core.
///
/// Every failure is raised at the point of violation; nothing is
/// collected or deferred. Internal-consistency violations in the matcher
/// are not represented here: they panic, because they indicate a bug in
/// the matcher itself rather than bad input.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The name is not in the IANA database, or is a 3-letter
    /// abbreviation other than UTC/GMT (those are ambiguous across
    /// regions and deliberately rejected).
    #[error("time zone not found: {0}")]
    TimeZoneNotFound(String),

    /// Calendar fields that do not name a real instant in the zone,
    /// either out of range or falling into a DST gap.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// Free-text date parsing failure.
    #[error("failed to parse {text:?} as a date time")]
    DateTimeParse { text: String },

    #[error("event title must not be empty")]
    EmptyTitle,

    #[error("participant name must not be empty")]
    EmptyParticipantName,

    /// The start/end/all-day triplet of an event (or a date range) is
    /// inconsistent: end precedes start, or an all-day event lacks an
    /// end.
    #[error("invalid event date time pair (start: {start}, end: {end:?}, all_day: {all_day})")]
    InvalidDateTimePair {
        start: Instant,
        end: Option<Instant>,
        all_day: bool,
    },

    /// A recurrence rule carries out-of-range parameters.
    #[error("invalid repeat rule: {0}")]
    InvalidRepeatRule(String),

    /// One event structurally matches several events on the other side.
    /// The matcher refuses to guess; the caller decides the
    /// disambiguation policy.
    #[error("event {:?} structurally matches {} events on the other side", .event.title(), .candidates.len())]
    AmbiguousMapping {
        event: Box<Event>,
        candidates: Vec<Event>,
    },
}

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
