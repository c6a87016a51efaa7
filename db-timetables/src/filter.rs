//! Predicates selecting which plan stops are worth caching.
//!
//! The loader applies its filter once, to plan-fetched stops; change
//! batches are never filtered (a change for an uncached stop just waits in
//! the pending table until its plan stop arrives or it goes stale).

use crate::domain::{EventKind, TimetableStop};

/// A pure filter over timetable stops.
pub trait StopFilter {
    /// Whether the stop is relevant to the caller.
    fn matches(&self, stop: &TimetableStop) -> bool;
}

/// Adapts a closure into a [`StopFilter`].
pub struct FilterFn<F>(F);

impl<F> FilterFn<F>
where
    F: Fn(&TimetableStop) -> bool,
{
    pub fn new(f: F) -> Self {
        FilterFn(f)
    }
}

impl<F> StopFilter for FilterFn<F>
where
    F: Fn(&TimetableStop) -> bool,
{
    fn matches(&self, stop: &TimetableStop) -> bool {
        (self.0)(stop)
    }
}

/// Accepts every stop.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyStop;

impl StopFilter for AnyStop {
    fn matches(&self, _stop: &TimetableStop) -> bool {
        true
    }
}

/// Accepts stops whose selected event is served from one of the given
/// platforms.
///
/// Judged on the best available platform, so a stop moved onto a watched
/// platform by a change matches. A stop lacking the selected event or any
/// platform information does not match.
#[derive(Debug, Clone)]
pub struct PlatformFilter {
    kind: EventKind,
    platforms: Vec<String>,
}

impl PlatformFilter {
    pub fn new(kind: EventKind, platforms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        PlatformFilter {
            kind,
            platforms: platforms.into_iter().map(Into::into).collect(),
        }
    }
}

impl StopFilter for PlatformFilter {
    fn matches(&self, stop: &TimetableStop) -> bool {
        stop.event(self.kind)
            .and_then(|event| event.best_platform())
            .is_some_and(|platform| self.platforms.iter().any(|p| p == platform))
    }
}

/// Accepts stops whose trip category is in the given set (e.g. only "ICE"
/// and "IC" trains). A stop without a trip label does not match.
#[derive(Debug, Clone)]
pub struct CategoryFilter {
    categories: Vec<String>,
}

impl CategoryFilter {
    pub fn new(categories: impl IntoIterator<Item = impl Into<String>>) -> Self {
        CategoryFilter {
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }
}

impl StopFilter for CategoryFilter {
    fn matches(&self, stop: &TimetableStop) -> bool {
        stop.label
            .as_ref()
            .and_then(|label| label.category.as_deref())
            .is_some_and(|category| self.categories.iter().any(|c| c == category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Event, StopId, TripLabel};

    fn stop_on_platform(platform: &str) -> TimetableStop {
        TimetableStop {
            departure: Some(Event {
                planned_platform: Some(platform.into()),
                ..Event::default()
            }),
            ..TimetableStop::new(StopId::new("s1"))
        }
    }

    #[test]
    fn any_stop_matches_everything() {
        assert!(AnyStop.matches(&TimetableStop::new(StopId::new("s1"))));
    }

    #[test]
    fn closures_adapt_into_filters() {
        let filter = FilterFn::new(|stop: &TimetableStop| stop.id.as_str() == "s1");
        assert!(filter.matches(&TimetableStop::new(StopId::new("s1"))));
        assert!(!filter.matches(&TimetableStop::new(StopId::new("s2"))));
    }

    #[test]
    fn platform_filter_uses_best_platform() {
        let filter = PlatformFilter::new(EventKind::Departure, ["4", "5"]);

        assert!(filter.matches(&stop_on_platform("4")));
        assert!(!filter.matches(&stop_on_platform("9")));

        // A platform change onto a watched platform matches.
        let mut moved = stop_on_platform("9");
        moved.departure.as_mut().unwrap().changed_platform = Some("5".into());
        assert!(filter.matches(&moved));
    }

    #[test]
    fn platform_filter_rejects_missing_event() {
        let filter = PlatformFilter::new(EventKind::Departure, ["4"]);
        let arrival_only = TimetableStop {
            arrival: Some(Event {
                planned_platform: Some("4".into()),
                ..Event::default()
            }),
            ..TimetableStop::new(StopId::new("s1"))
        };
        assert!(!filter.matches(&arrival_only));
    }

    #[test]
    fn category_filter_matches_label() {
        let filter = CategoryFilter::new(["ICE", "IC"]);

        let mut ice = TimetableStop::new(StopId::new("s1"));
        ice.label = Some(TripLabel {
            category: Some("ICE".into()),
            ..TripLabel::default()
        });
        assert!(filter.matches(&ice));

        let mut regional = TimetableStop::new(StopId::new("s2"));
        regional.label = Some(TripLabel {
            category: Some("RB".into()),
            ..TripLabel::default()
        });
        assert!(!filter.matches(&regional));

        assert!(!filter.matches(&TimetableStop::new(StopId::new("s3"))));
    }
}
