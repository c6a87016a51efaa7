//! Merging change-feed stops into plan stops.

use crate::domain::{Event, EventAttribute, TimetableStop};

/// Merge the changed attributes of `second` into `first`, returning a new
/// stop.
///
/// Arrival and departure are merged independently: when both stops carry
/// an event on a side, every changed attribute present on `second` is
/// copied over `first`'s event on that side; attributes absent on `second`
/// leave `first`'s values in place. A side that either stop lacks is left
/// untouched. Planned attributes are never overwritten.
///
/// This is last-writer-wins per attribute, so a partial change update does
/// not clobber unrelated attributes, and applying the same change twice is
/// a no-op the second time.
pub fn merge(first: &TimetableStop, second: &TimetableStop) -> TimetableStop {
    let mut merged = first.clone();
    merge_event(merged.arrival.as_mut(), second.arrival.as_ref());
    merge_event(merged.departure.as_mut(), second.departure.as_ref());
    merged
}

fn merge_event(into: Option<&mut Event>, from: Option<&Event>) {
    if let (Some(into), Some(from)) = (into, from) {
        for attribute in EventAttribute::CHANGED {
            attribute.copy_into(from, into);
        }
    }
}
