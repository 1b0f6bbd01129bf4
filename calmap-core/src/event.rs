//! Calendar event values.
//!
//! An [`Event`] is validated once at construction and immutable
//! afterwards; changes are represented as new values plus a field-level
//! diff, never as in-place mutation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::date::Instant;
use crate::error::{CoreError, CoreResult};

/// A participant of an event: opaque identity plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    id: String,
    name: String,
}

impl Participant {
    /// Fails with [`CoreError::EmptyParticipantName`] if `name` is
    /// empty.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> CoreResult<Participant> {
        let name = name.into();
        if name.is_empty() {
            return Err(CoreError::EmptyParticipantName);
        }
        Ok(Participant {
            id: id.into(),
            name,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Kind of a calendar event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Normal,
    Banner,
}

/// An immutable calendar event.
///
/// Constructed through [`Event::new`], which enforces the invariants:
/// non-empty title, `start <= end` when an end is present, and no
/// all-day event without an end. The `id` is an opaque label from the
/// source system and takes no part in structural equality.
#[derive(Debug, Clone)]
pub struct Event {
    id: String,
    kind: EventKind,
    title: String,
    description: Option<String>,
    start: Instant,
    end: Option<Instant>,
    all_day: bool,
    participants: Vec<Participant>,
    public: bool,
    last_update: Instant,
}

impl Event {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        kind: EventKind,
        title: impl Into<String>,
        description: Option<String>,
        start: Instant,
        end: Option<Instant>,
        all_day: bool,
        participants: Vec<Participant>,
        public: bool,
        last_update: Instant,
    ) -> CoreResult<Event> {
        let title = title.into();
        if title.is_empty() {
            return Err(CoreError::EmptyTitle);
        }

        match &end {
            Some(end_instant) => {
                if start > *end_instant {
                    return Err(CoreError::InvalidDateTimePair {
                        start,
                        end,
                        all_day,
                    });
                }
            }
            None => {
                // An all-day event must carry an end.
                if all_day {
                    return Err(CoreError::InvalidDateTimePair {
                        start,
                        end: None,
                        all_day,
                    });
                }
            }
        }

        Ok(Event {
            id: id.into(),
            kind,
            title,
            description,
            start,
            end,
            all_day,
            participants,
            public,
            last_update,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn start(&self) -> &Instant {
        &self.start
    }

    pub fn end(&self) -> Option<&Instant> {
        self.end.as_ref()
    }

    pub fn is_all_day(&self) -> bool {
        self.all_day
    }

    /// Participants in source order. The order is preserved but carries
    /// no meaning for equality.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn last_update(&self) -> &Instant {
        &self.last_update
    }

    /// Structural equality: title, description, start, end and the
    /// all-day flag. `id`, `kind`, `participants`, `public` and
    /// `last_update` are deliberately not compared, so two events that
    /// differ only in those fields are judged the same occurrence.
    pub fn is_same_event(&self, other: &Event) -> bool {
        self.title == other.title
            && self.description == other.description
            && self.start == other.start
            && self.end == other.end
            && self.all_day == other.all_day
    }

    /// The fixed serializable field set used for diffing.
    ///
    /// Participants are intentionally absent: they do not round-trip
    /// through a projection.
    pub fn to_projection(&self) -> EventProjection {
        EventProjection {
            id: self.id.clone(),
            kind: self.kind,
            title: self.title.clone(),
            description: self.description.clone(),
            start: self.start.clone(),
            end: self.end.clone(),
            all_day: self.all_day,
            public: self.public,
            last_update: self.last_update.clone(),
        }
    }

    /// Reconstructs an event from a projection, re-validating all
    /// invariants. The participant list comes back empty.
    pub fn from_projection(projection: EventProjection) -> CoreResult<Event> {
        Event::new(
            projection.id,
            projection.kind,
            projection.title,
            projection.description,
            projection.start,
            projection.end,
            projection.all_day,
            Vec::new(),
            projection.public,
            projection.last_update,
        )
    }

    /// Field-level diff over the projection fields: every field whose
    /// values differ, mapped to the `(self, other)` value pair.
    /// Value-equal fields are omitted; participant differences are not
    /// detected.
    pub fn difference(&self, other: &Event) -> BTreeMap<&'static str, (Value, Value)> {
        let mut changed = BTreeMap::new();

        diff_field(&mut changed, "id", &self.id, &other.id);
        diff_field(&mut changed, "kind", &self.kind, &other.kind);
        diff_field(&mut changed, "title", &self.title, &other.title);
        diff_field(
            &mut changed,
            "description",
            &self.description,
            &other.description,
        );
        diff_field(&mut changed, "start", &self.start, &other.start);
        diff_field(&mut changed, "end", &self.end, &other.end);
        diff_field(&mut changed, "all_day", &self.all_day, &other.all_day);
        diff_field(&mut changed, "public", &self.public, &other.public);
        diff_field(
            &mut changed,
            "last_update",
            &self.last_update,
            &other.last_update,
        );

        changed
    }
}

fn diff_field<T: PartialEq + Serialize>(
    changed: &mut BTreeMap<&'static str, (Value, Value)>,
    name: &'static str,
    left: &T,
    right: &T,
) {
    if left != right {
        let left = serde_json::to_value(left).unwrap_or(Value::Null);
        let right = serde_json::to_value(right).unwrap_or(Value::Null);
        changed.insert(name, (left, right));
    }
}

/// The serializable projection of an [`Event`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventProjection {
    pub id: String,
    pub kind: EventKind,
    pub title: String,
    pub description: Option<String>,
    pub start: Instant,
    pub end: Option<Instant>,
    pub all_day: bool,
    pub public: bool,
    pub last_update: Instant,
}
