//! Domain types for the timetable cache engine.
//!
//! These types represent validated feed data. Identifiers enforce their
//! invariants at construction time; stops and events are plain records
//! whose optionality mirrors the feed (planned attributes from the plan
//! feed, changed attributes from the change feeds).

mod attribute;
mod event;
mod station;
mod stop;

pub use attribute::EventAttribute;
pub use event::{Event, EventStatus};
pub use station::{EvaNumber, InvalidEva};
pub use stop::{EventKind, StopId, TimetableStop, TripLabel};
