//! Timetable stops: one train's arrival and/or departure at one station.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::event::Event;

/// Opaque identifier of a timetable stop.
///
/// Stable across the plan and change feeds for the same physical stop,
/// which makes it the merge and deduplication key. The feed encodes a
/// trip id, a daily trip index and a date in it, but nothing here depends
/// on that structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StopId(String);

impl StopId {
    /// Wrap a raw feed identifier.
    pub fn new(id: impl Into<String>) -> Self {
        StopId(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which side of a stop an operation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Arrival,
    Departure,
}

impl EventKind {
    /// The other side.
    pub fn opposite(&self) -> EventKind {
        match self {
            EventKind::Arrival => EventKind::Departure,
            EventKind::Departure => EventKind::Arrival,
        }
    }
}

/// Trip identification attached to a stop (the feed's `<tl>` element).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TripLabel {
    /// Trip category, e.g. "ICE", "RE", "S".
    pub category: Option<String>,
    /// Train number within the category.
    pub number: Option<String>,
    /// Owning operator code.
    pub owner: Option<String>,
}

/// One arrival/departure record for one train at one station.
///
/// At least one of `arrival`/`departure` is present; the feed guarantees
/// this and it is not re-validated here. A terminating train has no
/// departure, an originating one no arrival.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimetableStop {
    /// Merge/dedup key, stable across feeds.
    pub id: StopId,
    /// Trip identification, when the feed provides it.
    pub label: Option<TripLabel>,
    /// Arrival side, if the train arrives here.
    pub arrival: Option<Event>,
    /// Departure side, if the train departs from here.
    pub departure: Option<Event>,
}

impl TimetableStop {
    /// A stop with the given id and nothing else, ready to be filled in.
    pub fn new(id: StopId) -> Self {
        TimetableStop {
            id,
            label: None,
            arrival: None,
            departure: None,
        }
    }

    /// The event on the requested side, if present.
    pub fn event(&self, kind: EventKind) -> Option<&Event> {
        match kind {
            EventKind::Arrival => self.arrival.as_ref(),
            EventKind::Departure => self.departure.as_ref(),
        }
    }

    /// Whether this stop lies entirely in the past.
    ///
    /// True only when the best available time of *both* sides is before
    /// `now`. A side without an event, or whose event carries no time,
    /// counts as past, so a stop is never kept alive by missing data; a
    /// stop with no time information at all is past.
    pub fn is_past(&self, now: NaiveDateTime) -> bool {
        let side_past = |event: &Option<Event>| match event {
            Some(event) => event.is_past(now),
            None => true,
        };
        side_past(&self.arrival) && side_past(&self.departure)
    }
}
