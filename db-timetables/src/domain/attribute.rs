//! Generic per-field access to event attributes.
//!
//! The merger walks over the changed attributes one by one instead of
//! hard-coding field assignments, so adding an attribute means extending
//! the enum and the two match arms here, nowhere else.

use super::event::Event;

/// One named attribute of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAttribute {
    PlannedTime,
    ChangedTime,
    PlannedPlatform,
    ChangedPlatform,
    PlannedPath,
    ChangedPath,
    PlannedStatus,
    ChangedStatus,
}

impl EventAttribute {
    /// The four changed attributes, the ones a change feed may override.
    pub const CHANGED: [EventAttribute; 4] = [
        EventAttribute::ChangedTime,
        EventAttribute::ChangedPlatform,
        EventAttribute::ChangedPath,
        EventAttribute::ChangedStatus,
    ];

    /// Whether the attribute carries a value on `event`.
    pub fn is_present(&self, event: &Event) -> bool {
        match self {
            EventAttribute::PlannedTime => event.planned_time.is_some(),
            EventAttribute::ChangedTime => event.changed_time.is_some(),
            EventAttribute::PlannedPlatform => event.planned_platform.is_some(),
            EventAttribute::ChangedPlatform => event.changed_platform.is_some(),
            EventAttribute::PlannedPath => event.planned_path.is_some(),
            EventAttribute::ChangedPath => event.changed_path.is_some(),
            EventAttribute::PlannedStatus => event.planned_status.is_some(),
            EventAttribute::ChangedStatus => event.changed_status.is_some(),
        }
    }

    /// Copy this attribute from `from` into `into` when `from` has it.
    ///
    /// An absent attribute on `from` leaves `into` untouched.
    pub fn copy_into(&self, from: &Event, into: &mut Event) {
        match self {
            EventAttribute::PlannedTime => {
                if let Some(value) = from.planned_time {
                    into.planned_time = Some(value);
                }
            }
            EventAttribute::ChangedTime => {
                if let Some(value) = from.changed_time {
                    into.changed_time = Some(value);
                }
            }
            EventAttribute::PlannedPlatform => {
                if let Some(value) = &from.planned_platform {
                    into.planned_platform = Some(value.clone());
                }
            }
            EventAttribute::ChangedPlatform => {
                if let Some(value) = &from.changed_platform {
                    into.changed_platform = Some(value.clone());
                }
            }
            EventAttribute::PlannedPath => {
                if let Some(value) = &from.planned_path {
                    into.planned_path = Some(value.clone());
                }
            }
            EventAttribute::ChangedPath => {
                if let Some(value) = &from.changed_path {
                    into.changed_path = Some(value.clone());
                }
            }
            EventAttribute::PlannedStatus => {
                if let Some(value) = from.planned_status {
                    into.planned_status = Some(value);
                }
            }
            EventAttribute::ChangedStatus => {
                if let Some(value) = from.changed_status {
                    into.changed_status = Some(value);
                }
            }
        }
    }
}
