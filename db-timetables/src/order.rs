//! Ordering stops for display.

use std::cmp::Ordering;

use chrono::NaiveDateTime;

use crate::domain::{EventKind, TimetableStop};

/// Total order over stops by a selected event's planned time.
///
/// A departure board sorts by planned departure, an arrival board by
/// planned arrival. When a stop lacks the selected event (terminating or
/// originating trains), the opposite event's planned time is used instead,
/// so every stop still gets a sensible position.
#[derive(Debug, Clone, Copy)]
pub struct StopOrder {
    kind: EventKind,
}

impl StopOrder {
    /// An order driven by the given event kind.
    pub fn new(kind: EventKind) -> Self {
        StopOrder { kind }
    }

    /// Compare two stops. Stops with equal keys compare equal.
    pub fn compare(&self, a: &TimetableStop, b: &TimetableStop) -> Ordering {
        let key_a = self.sort_key(a);
        let key_b = self.sort_key(b);
        // The feed guarantees a planned time on at least one event of
        // every stop; asserted rather than re-validated per call.
        debug_assert!(key_a.is_some(), "stop {} has no planned time", a.id);
        debug_assert!(key_b.is_some(), "stop {} has no planned time", b.id);
        key_a.cmp(&key_b)
    }

    fn sort_key(&self, stop: &TimetableStop) -> Option<NaiveDateTime> {
        stop.event(self.kind)
            .and_then(|event| event.planned_time)
            .or_else(|| {
                stop.event(self.kind.opposite())
                    .and_then(|event| event.planned_time)
            })
    }
}
