//! Bidirectional event matching.
//!
//! Classifies the events of two calendars into common pairs, left-only
//! and right-only sets. Matching is exact and structural, so results
//! are deterministic and auditable; a one-to-many match is surfaced as
//! an error instead of silently resolved, because picking one of
//! several structurally identical candidates could misattribute an
//! unrelated event during a later apply step.

use std::collections::HashSet;

use crate::error::{CoreError, CoreResult};
use crate::event::Event;

/// Three-way partition produced by [`perform_event_mapping`].
#[derive(Debug, Clone, Default)]
pub struct EventMapping {
    /// Pairs judged to be the same event, in left-input order.
    pub common: Vec<(Event, Event)>,
    /// Events present only in the left input, in input order.
    pub left_only: Vec<Event>,
    /// Events present only in the right input, in input order.
    pub right_only: Vec<Event>,
}

/// Partitions two event collections into common pairs and one-side-only
/// sets.
///
/// A left event matching two or more right events (or vice versa) fails
/// with [`CoreError::AmbiguousMapping`] carrying the event and all
/// candidates; that error is recoverable and disambiguation is the
/// caller's decision. A violated internal post-condition panics: it
/// means a bug in the matcher, not bad input.
pub fn perform_event_mapping(left: &[Event], right: &[Event]) -> CoreResult<EventMapping> {
    // Left-to-right scan decides the partition.
    let mut common_pairs: Vec<(usize, usize)> = Vec::new();
    let mut left_only: Vec<usize> = Vec::new();

    for (i, event) in left.iter().enumerate() {
        let matched: Vec<usize> = right
            .iter()
            .enumerate()
            .filter(|(_, candidate)| event.is_same_event(candidate))
            .map(|(j, _)| j)
            .collect();

        match matched.as_slice() {
            [] => left_only.push(i),
            [j] => common_pairs.push((i, *j)),
            _ => {
                return Err(CoreError::AmbiguousMapping {
                    event: Box::new(event.clone()),
                    candidates: matched.into_iter().map(|j| right[j].clone()).collect(),
                });
            }
        }
    }

    // Right-to-left scan is a consistency check on the first scan plus
    // the right-only classification.
    let paired: HashSet<(usize, usize)> = common_pairs.iter().copied().collect();
    let mut right_only: Vec<usize> = Vec::new();

    for (j, event) in right.iter().enumerate() {
        let matched: Vec<usize> = left
            .iter()
            .enumerate()
            .filter(|(_, candidate)| event.is_same_event(candidate))
            .map(|(i, _)| i)
            .collect();

        match matched.as_slice() {
            [] => right_only.push(j),
            [i] => {
                assert!(
                    paired.contains(&(*i, j)),
                    "event mapping is not symmetric: right event {j} pairs with left \
                     event {i} only in the reverse scan"
                );
            }
            _ => {
                return Err(CoreError::AmbiguousMapping {
                    event: Box::new(event.clone()),
                    candidates: matched.into_iter().map(|i| left[i].clone()).collect(),
                });
            }
        }
    }

    // Post-condition: the partition reconstructs both inputs exactly.
    let mut seen_left: HashSet<usize> = common_pairs.iter().map(|(i, _)| *i).collect();
    seen_left.extend(left_only.iter().copied());
    assert_eq!(
        seen_left.len(),
        left.len(),
        "event mapping lost or duplicated left events"
    );

    let mut seen_right: HashSet<usize> = common_pairs.iter().map(|(_, j)| *j).collect();
    seen_right.extend(right_only.iter().copied());
    assert_eq!(
        seen_right.len(),
        right.len(),
        "event mapping lost or duplicated right events"
    );

    Ok(EventMapping {
        common: common_pairs
            .into_iter()
            .map(|(i, j)| (left[i].clone(), right[j].clone()))
            .collect(),
        left_only: left_only.into_iter().map(|i| left[i].clone()).collect(),
        right_only: right_only.into_iter().map(|j| right[j].clone()).collect(),
    })
}
