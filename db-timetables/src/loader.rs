//! The timetable loader: cache ownership, fetch cadence and merging.
//!
//! One loader serves one station. Each call to [`TimetableLoader::get_stops`]
//! runs a single update cycle against the remote feeds and returns the
//! refreshed cache, sorted for display. The loader is built for
//! single-threaded, scheduler-driven use: it takes `&mut self`, performs
//! its remote calls sequentially and holds no locks.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, trace};

use crate::api::{TimetableApi, TimetableError, hour_slice};
use crate::clock::{Clock, SystemClock};
use crate::domain::{EvaNumber, EventKind, StopId, TimetableStop};
use crate::filter::{AnyStop, StopFilter};
use crate::merge::merge;
use crate::order::StopOrder;

/// The change feeds are refreshed server-side roughly every 30 seconds;
/// polling faster than that cannot observe anything new.
const CHANGES_GRANULARITY_SECS: i64 = 30;

/// The recent-changes feed only covers the last 120 seconds; beyond that
/// the full feed is required to avoid missing changes.
const RECENT_CHANGES_VALIDITY_SECS: i64 = 120;

/// The API serves plan data at most 18 hours ahead of the call time.
const PLAN_HORIZON_HOURS: i64 = 18;

/// The loader's cache: two partitions plus the feed high-water marks.
///
/// `ready` holds stops that passed the filter and are not yet past; only
/// its contents are ever served. `pending` holds changes whose plan stop
/// has not been fetched yet; they wait there until the plan catches up or
/// they go stale. An id is never in both partitions at once: `insert`
/// clears the pending slot, and `apply_change` only stashes when the id
/// is not ready.
#[derive(Default)]
struct StopCache {
    ready: HashMap<StopId, TimetableStop>,
    pending: HashMap<StopId, TimetableStop>,
    /// Hour slice most recently requested from the plan feed.
    last_plan_fetch: Option<NaiveDateTime>,
    /// When a change feed was last successfully fetched.
    last_changes_fetch: Option<NaiveDateTime>,
}

impl StopCache {
    /// Merge a change into its ready stop, or stash it as pending.
    fn apply_change(&mut self, change: TimetableStop) {
        match self.ready.get(&change.id) {
            Some(existing) => {
                debug_assert!(
                    !self.pending.contains_key(&change.id),
                    "stop id in both cache partitions"
                );
                let merged = merge(existing, &change);
                self.ready.insert(merged.id.clone(), merged);
            }
            None => {
                // Replaces any earlier pending change for the same stop;
                // the change feeds always carry the full current state.
                self.pending.insert(change.id.clone(), change);
            }
        }
    }

    /// Remove and return the pending change for `id`, if any.
    fn take_pending(&mut self, id: &StopId) -> Option<TimetableStop> {
        self.pending.remove(id)
    }

    /// Put a stop into the ready partition.
    fn insert(&mut self, stop: TimetableStop) {
        self.pending.remove(&stop.id);
        self.ready.insert(stop.id.clone(), stop);
    }

    /// Drop ready stops entirely in the past, and prune pending changes
    /// that have become moot.
    ///
    /// Pending entries use a stricter rule than ready ones: a change that
    /// carries no time at all (platform-only, status-only) is still
    /// waiting for its plan stop, not moot, so only entries whose known
    /// times all lie in the past are dropped.
    fn evict(&mut self, now: NaiveDateTime) -> usize {
        let before = self.ready.len();
        self.ready.retain(|_, stop| !stop.is_past(now));
        self.pending.retain(|_, stop| !pending_is_moot(stop, now));
        before - self.ready.len()
    }

    fn ready_len(&self) -> usize {
        self.ready.len()
    }

    fn ready_stops(&self) -> impl Iterator<Item = &TimetableStop> {
        self.ready.values()
    }
}

/// Maintains at least `desired_count` upcoming, filter-matching stops for
/// one station, refreshed on every [`get_stops`](Self::get_stops) call
/// with as few remote requests as possible.
///
/// Not safe for concurrent use; `&mut self` makes the required external
/// serialization explicit. "Now" is read from the clock once per cycle
/// and reused for every decision within it, so a cycle is logically
/// atomic even though the wall clock moves underneath it.
pub struct TimetableLoader<A: TimetableApi> {
    api: A,
    station: EvaNumber,
    order: StopOrder,
    desired_count: usize,
    filter: Box<dyn StopFilter + Send>,
    clock: Box<dyn Clock + Send>,
    cache: StopCache,
}

impl<A: TimetableApi> TimetableLoader<A> {
    /// Create a loader for `station`, sorting by `kind` and aiming to keep
    /// `desired_count` stops cached. Accepts every stop and reads the
    /// system clock until told otherwise.
    pub fn new(api: A, station: EvaNumber, kind: EventKind, desired_count: usize) -> Self {
        TimetableLoader {
            api,
            station,
            order: StopOrder::new(kind),
            desired_count,
            filter: Box::new(AnyStop),
            clock: Box::new(SystemClock),
            cache: StopCache::default(),
        }
    }

    /// Only cache plan stops accepted by `filter`. Applied at load time,
    /// never re-applied to already-cached stops or to changes.
    pub fn with_filter(mut self, filter: impl StopFilter + Send + 'static) -> Self {
        self.filter = Box::new(filter);
        self
    }

    /// Use a custom time source (for testing).
    pub fn with_clock(mut self, clock: impl Clock + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// The station this loader serves.
    pub fn station(&self) -> EvaNumber {
        self.station
    }

    /// Change the number of stops to keep cached. Takes effect on the
    /// next update cycle; triggers no fetch by itself.
    pub fn set_desired_count(&mut self, count: usize) {
        self.desired_count = count;
    }

    pub fn desired_count(&self) -> usize {
        self.desired_count
    }

    /// Run one update cycle and return the cached stops, sorted.
    ///
    /// A cycle refreshes the change feeds (when due), evicts past stops
    /// and tops the cache up from the plan feed. Any transport error
    /// aborts the cycle and is propagated; progress already committed to
    /// the cache stays committed, and the next call picks up from there.
    pub async fn get_stops(&mut self) -> Result<Vec<TimetableStop>, TimetableError> {
        let now = self.clock.now();

        self.refresh_changes(now).await?;
        let evicted = self.cache.evict(now);
        if evicted > 0 {
            debug!(evicted, "dropped past stops");
        }
        self.fill_plan(now).await?;

        let mut stops: Vec<TimetableStop> = self.cache.ready_stops().cloned().collect();
        stops.sort_by(|a, b| self.order.compare(a, b));
        Ok(stops)
    }

    /// Fetch the due change feed, if any, and fold the batch in.
    async fn refresh_changes(&mut self, now: NaiveDateTime) -> Result<(), TimetableError> {
        let elapsed = self
            .cache
            .last_changes_fetch
            .map(|t| (now - t).num_seconds());

        let changes = match elapsed {
            Some(secs) if secs < CHANGES_GRANULARITY_SECS => {
                trace!(secs, "changes fetched recently, skipping");
                return Ok(());
            }
            Some(secs) if secs < RECENT_CHANGES_VALIDITY_SECS => {
                debug!(secs, "fetching recent changes");
                self.api.get_recent_changes(self.station).await?
            }
            _ => {
                debug!("fetching full changes");
                self.api.get_full_changes(self.station).await?
            }
        };

        // Marked only after a successful fetch: a failure must not
        // suppress the retry on the next cycle.
        self.cache.last_changes_fetch = Some(now);

        debug!(count = changes.len(), "applying changes");
        for change in changes {
            self.cache.apply_change(change);
        }
        Ok(())
    }

    /// Fetch plan slices until the cache holds enough stops or the feed's
    /// advance horizon is reached.
    async fn fill_plan(&mut self, now: NaiveDateTime) -> Result<(), TimetableError> {
        let horizon = now + Duration::hours(PLAN_HORIZON_HOURS);

        while self.cache.ready_len() < self.desired_count {
            let slice = match self.cache.last_plan_fetch {
                Some(previous) => previous + Duration::hours(1),
                None => hour_slice(now),
            };
            if slice > horizon {
                debug!(
                    cached = self.cache.ready_len(),
                    desired = self.desired_count,
                    "plan horizon reached"
                );
                break;
            }

            let batch = self.api.get_plan(self.station, slice).await?;
            debug!(slice = %slice, count = batch.len(), "fetched plan slice");

            for stop in batch {
                if !self.filter.matches(&stop) {
                    continue;
                }
                let stop = match self.cache.take_pending(&stop.id) {
                    Some(pending) => merge(&stop, &pending),
                    None => stop,
                };
                if !stop.is_past(now) {
                    self.cache.insert(stop);
                }
            }

            // Recorded whether or not the slice yielded usable stops, so
            // an empty hour is never requested twice.
            self.cache.last_plan_fetch = Some(slice);
        }
        Ok(())
    }
}

/// Whether a pending change can never be merged usefully any more.
///
/// True only when the change carries at least one time and every time it
/// carries is before `now`. A time-less change gives no grounds for
/// disposal on its own.
fn pending_is_moot(stop: &TimetableStop, now: NaiveDateTime) -> bool {
    let mut times = [stop.arrival.as_ref(), stop.departure.as_ref()]
        .into_iter()
        .flatten()
        .filter_map(|event| event.best_time())
        .peekable();
    times.peek().is_some() && times.all(|time| time < now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{ApiCall, MockTimetableApi};
    use crate::domain::Event;
    use crate::filter::PlatformFilter;
    use chrono::NaiveDate;
    use std::sync::{Arc, Mutex};

    /// Settable clock shared between a test and its loader.
    #[derive(Clone)]
    struct ManualClock(Arc<Mutex<NaiveDateTime>>);

    impl ManualClock {
        fn at(time: NaiveDateTime) -> Self {
            ManualClock(Arc::new(Mutex::new(time)))
        }

        fn set(&self, time: NaiveDateTime) {
            *self.0.lock().unwrap() = time;
        }

        fn advance_secs(&self, secs: i64) {
            let mut guard = self.0.lock().unwrap();
            *guard += Duration::seconds(secs);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> NaiveDateTime {
            *self.0.lock().unwrap()
        }
    }

    fn eva() -> EvaNumber {
        EvaNumber::parse("8000105").unwrap()
    }

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn departure_stop(id: &str, time: NaiveDateTime) -> TimetableStop {
        TimetableStop {
            departure: Some(Event {
                planned_time: Some(time),
                ..Event::default()
            }),
            ..TimetableStop::new(StopId::new(id))
        }
    }

    fn departure_change(id: &str, time: NaiveDateTime) -> TimetableStop {
        TimetableStop {
            departure: Some(Event {
                changed_time: Some(time),
                ..Event::default()
            }),
            ..TimetableStop::new(StopId::new(id))
        }
    }

    fn loader(
        mock: &MockTimetableApi,
        clock: &ManualClock,
        desired: usize,
    ) -> TimetableLoader<MockTimetableApi> {
        TimetableLoader::new(mock.clone(), eva(), EventKind::Departure, desired)
            .with_clock(clock.clone())
    }

    fn plan_calls(mock: &MockTimetableApi) -> Vec<NaiveDateTime> {
        mock.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::Plan(slice) => Some(slice),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn fills_across_slices_until_desired_count() {
        let mock = MockTimetableApi::new();
        mock.set_plan(at(10, 0), vec![departure_stop("a", at(10, 45))]);
        mock.set_plan(at(11, 0), vec![departure_stop("b", at(11, 15))]);
        mock.set_plan(at(12, 0), vec![departure_stop("c", at(12, 5))]);

        let clock = ManualClock::at(at(10, 30));
        let mut loader = loader(&mock, &clock, 3);

        let stops = loader.get_stops().await.unwrap();

        let ids: Vec<&str> = stops.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(plan_calls(&mock), vec![at(10, 0), at(11, 0), at(12, 0)]);
    }

    #[tokio::test]
    async fn satisfied_cache_fetches_no_plan() {
        let mock = MockTimetableApi::new();
        mock.set_plan(at(10, 0), vec![departure_stop("a", at(10, 45))]);

        let clock = ManualClock::at(at(10, 0));
        let mut loader = loader(&mock, &clock, 1);

        loader.get_stops().await.unwrap();
        mock.clear_calls();

        // Cache still holds one future stop; only the changes feed runs.
        clock.advance_secs(31);
        loader.get_stops().await.unwrap();
        assert_eq!(plan_calls(&mock), Vec::<NaiveDateTime>::new());
    }

    #[tokio::test]
    async fn raising_desired_count_resumes_filling() {
        let mock = MockTimetableApi::new();
        mock.set_plan(at(10, 0), vec![departure_stop("a", at(10, 45))]);
        mock.set_plan(at(11, 0), vec![departure_stop("b", at(11, 15))]);

        let clock = ManualClock::at(at(10, 0));
        let mut loader = loader(&mock, &clock, 1);

        let stops = loader.get_stops().await.unwrap();
        assert_eq!(stops.len(), 1);

        // No fetch happens until the next cycle.
        loader.set_desired_count(2);
        mock.clear_calls();

        let stops = loader.get_stops().await.unwrap();
        assert_eq!(stops.len(), 2);
        assert_eq!(plan_calls(&mock), vec![at(11, 0)]);
    }

    #[tokio::test]
    async fn first_fetch_uses_full_changes() {
        let mock = MockTimetableApi::new();
        let clock = ManualClock::at(at(10, 0));
        let mut loader = loader(&mock, &clock, 0);

        loader.get_stops().await.unwrap();
        assert_eq!(mock.calls(), vec![ApiCall::FullChanges]);
    }

    #[tokio::test]
    async fn changes_skipped_below_granularity() {
        let mock = MockTimetableApi::new();
        let clock = ManualClock::at(at(10, 0));
        let mut loader = loader(&mock, &clock, 0);

        loader.get_stops().await.unwrap();
        mock.clear_calls();

        clock.advance_secs(29);
        loader.get_stops().await.unwrap();
        assert_eq!(mock.calls(), vec![]);
    }

    #[tokio::test]
    async fn recent_changes_within_validity_window() {
        let mock = MockTimetableApi::new();
        let clock = ManualClock::at(at(10, 0));
        let mut loader = loader(&mock, &clock, 0);

        loader.get_stops().await.unwrap();
        mock.clear_calls();

        clock.advance_secs(119);
        loader.get_stops().await.unwrap();
        assert_eq!(mock.calls(), vec![ApiCall::RecentChanges]);
    }

    #[tokio::test]
    async fn full_changes_beyond_validity_window() {
        let mock = MockTimetableApi::new();
        let clock = ManualClock::at(at(10, 0));
        let mut loader = loader(&mock, &clock, 0);

        loader.get_stops().await.unwrap();
        mock.clear_calls();

        clock.advance_secs(121);
        loader.get_stops().await.unwrap();
        assert_eq!(mock.calls(), vec![ApiCall::FullChanges]);
    }

    #[tokio::test]
    async fn change_for_cached_stop_merges_in_place() {
        let mock = MockTimetableApi::new();
        mock.set_plan(at(10, 0), vec![departure_stop("a", at(10, 45))]);

        let clock = ManualClock::at(at(10, 0));
        let mut loader = loader(&mock, &clock, 1);
        loader.get_stops().await.unwrap();

        mock.set_full_changes(vec![departure_change("a", at(10, 55))]);
        clock.advance_secs(121);

        let stops = loader.get_stops().await.unwrap();
        let departure = stops[0].departure.as_ref().unwrap();
        assert_eq!(departure.planned_time, Some(at(10, 45)));
        assert_eq!(departure.changed_time, Some(at(10, 55)));
    }

    #[tokio::test]
    async fn unmatched_change_stays_pending() {
        // A change for an unknown stop C stashed earlier must not
        // appear in the result while plan stops A and B do.
        let mock = MockTimetableApi::new();
        mock.set_plan(
            at(10, 0),
            vec![
                departure_stop("a", at(10, 15)),
                departure_stop("b", at(10, 45)),
            ],
        );
        mock.set_full_changes(vec![departure_change("c", at(10, 5))]);

        let clock = ManualClock::at(at(10, 0));
        let mut loader = loader(&mock, &clock, 2);

        let stops = loader.get_stops().await.unwrap();
        let ids: Vec<&str> = stops.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[tokio::test]
    async fn pending_change_merged_when_plan_arrives() {
        // The change for A arrives before A's plan stop is fetched;
        // once the plan catches up, both the planned and the changed
        // time are visible on the merged stop.
        let mock = MockTimetableApi::new();
        mock.set_plan(at(10, 0), vec![departure_stop("b", at(10, 45))]);
        mock.set_plan(at(11, 0), vec![departure_stop("a", at(11, 15))]);
        mock.set_full_changes(vec![departure_change("a", at(11, 20))]);

        let clock = ManualClock::at(at(10, 0));
        let mut loader = loader(&mock, &clock, 1);

        // First cycle stashes the change for "a"; only "b" is served.
        let stops = loader.get_stops().await.unwrap();
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].id.as_str(), "b");

        // Next cycle needs more stops and reaches the 11:00 slice.
        mock.set_full_changes(vec![]);
        loader.set_desired_count(2);
        clock.advance_secs(121);

        let stops = loader.get_stops().await.unwrap();
        let a = stops.iter().find(|s| s.id.as_str() == "a").unwrap();
        let departure = a.departure.as_ref().unwrap();
        assert_eq!(departure.planned_time, Some(at(11, 15)));
        assert_eq!(departure.changed_time, Some(at(11, 20)));
    }

    #[tokio::test]
    async fn platform_only_pending_change_waits_for_plan() {
        // A platform change carries no time at all; it must survive in
        // the pending table until its plan stop is fetched, however many
        // cycles that takes.
        let mock = MockTimetableApi::new();
        mock.set_plan(at(10, 0), vec![departure_stop("b", at(10, 45))]);
        mock.set_plan(at(11, 0), vec![departure_stop("a", at(11, 15))]);
        mock.set_full_changes(vec![TimetableStop {
            departure: Some(Event {
                changed_platform: Some("9".into()),
                ..Event::default()
            }),
            ..TimetableStop::new(StopId::new("a"))
        }]);

        let clock = ManualClock::at(at(10, 0));
        let mut loader = loader(&mock, &clock, 1);

        loader.get_stops().await.unwrap();
        assert_eq!(loader.cache.pending.len(), 1);

        mock.set_full_changes(vec![]);
        loader.set_desired_count(2);
        clock.advance_secs(121);

        let stops = loader.get_stops().await.unwrap();
        let a = stops.iter().find(|s| s.id.as_str() == "a").unwrap();
        let departure = a.departure.as_ref().unwrap();
        assert_eq!(departure.changed_platform.as_deref(), Some("9"));
        assert_eq!(departure.planned_time, Some(at(11, 15)));
        assert!(loader.cache.pending.is_empty());
    }

    #[tokio::test]
    async fn status_only_pending_change_waits_for_plan() {
        let mock = MockTimetableApi::new();
        mock.set_plan(at(10, 0), vec![departure_stop("b", at(10, 45))]);
        mock.set_plan(at(11, 0), vec![departure_stop("a", at(11, 15))]);
        mock.set_full_changes(vec![TimetableStop {
            departure: Some(Event {
                changed_status: Some(crate::domain::EventStatus::Cancelled),
                ..Event::default()
            }),
            ..TimetableStop::new(StopId::new("a"))
        }]);

        let clock = ManualClock::at(at(10, 0));
        let mut loader = loader(&mock, &clock, 1);
        loader.get_stops().await.unwrap();

        mock.set_full_changes(vec![]);
        loader.set_desired_count(2);
        clock.advance_secs(121);

        let stops = loader.get_stops().await.unwrap();
        let a = stops.iter().find(|s| s.id.as_str() == "a").unwrap();
        assert_eq!(
            a.departure.as_ref().unwrap().changed_status,
            Some(crate::domain::EventStatus::Cancelled)
        );
    }

    #[tokio::test]
    async fn stale_pending_change_is_pruned() {
        // A pending change whose only time lies in the past is moot and
        // must not accumulate.
        let mock = MockTimetableApi::new();
        mock.set_full_changes(vec![departure_change("gone", at(10, 5))]);

        let clock = ManualClock::at(at(10, 0));
        let mut loader = loader(&mock, &clock, 0);

        loader.get_stops().await.unwrap();
        assert_eq!(loader.cache.pending.len(), 1);

        mock.set_full_changes(vec![]);
        clock.set(at(10, 30));
        loader.get_stops().await.unwrap();
        assert!(loader.cache.pending.is_empty());
    }

    #[tokio::test]
    async fn past_stops_are_evicted() {
        let mock = MockTimetableApi::new();
        mock.set_plan(
            at(10, 0),
            vec![
                departure_stop("a", at(10, 15)),
                departure_stop("b", at(11, 45)),
            ],
        );

        let clock = ManualClock::at(at(10, 0));
        let mut loader = loader(&mock, &clock, 2);

        let stops = loader.get_stops().await.unwrap();
        assert_eq!(stops.len(), 2);

        clock.set(at(10, 30));
        let stops = loader.get_stops().await.unwrap();
        let ids: Vec<&str> = stops.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["b"]);
    }

    #[tokio::test]
    async fn delayed_stop_survives_eviction() {
        let mock = MockTimetableApi::new();
        mock.set_plan(at(10, 0), vec![departure_stop("a", at(10, 15))]);

        let clock = ManualClock::at(at(10, 0));
        let mut loader = loader(&mock, &clock, 1);
        loader.get_stops().await.unwrap();

        // Delayed past its planned time: still served at 10:30.
        mock.set_full_changes(vec![departure_change("a", at(10, 40))]);
        clock.set(at(10, 30));

        let stops = loader.get_stops().await.unwrap();
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].id.as_str(), "a");
    }

    #[tokio::test]
    async fn evicted_stop_is_not_reinserted() {
        // Eviction is monotonic: a past stop reappearing in a later plan
        // batch must not come back.
        let mock = MockTimetableApi::new();
        mock.set_plan(at(10, 0), vec![departure_stop("a", at(10, 15))]);
        // The 11:00 slice redundantly repeats the already-past stop.
        mock.set_plan(
            at(11, 0),
            vec![
                departure_stop("a", at(10, 15)),
                departure_stop("b", at(11, 30)),
            ],
        );

        let clock = ManualClock::at(at(10, 0));
        let mut loader = loader(&mock, &clock, 1);
        loader.get_stops().await.unwrap();

        clock.set(at(10, 30));
        let stops = loader.get_stops().await.unwrap();
        let ids: Vec<&str> = stops.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["b"]);
    }

    #[tokio::test]
    async fn plan_requests_respect_horizon() {
        let mock = MockTimetableApi::new();
        let clock = ManualClock::at(at(10, 30));
        let mut loader = loader(&mock, &clock, 5);

        // No plan data anywhere: the loader walks to the horizon and
        // gives up for this cycle.
        loader.get_stops().await.unwrap();

        let horizon = at(10, 30) + Duration::hours(18);
        let slices = plan_calls(&mock);
        assert!(!slices.is_empty());
        assert!(slices.iter().all(|slice| *slice <= horizon));
        // Slices 10:00 through 04:00 next day, one per hour.
        assert_eq!(slices.len(), 19);

        // The next cycle has nothing left inside the horizon.
        mock.clear_calls();
        clock.advance_secs(31);
        loader.get_stops().await.unwrap();
        assert_eq!(plan_calls(&mock), Vec::<NaiveDateTime>::new());
    }

    #[tokio::test]
    async fn filter_applies_to_plan_not_changes() {
        let mock = MockTimetableApi::new();
        let on_4 = TimetableStop {
            departure: Some(Event {
                planned_time: Some(at(10, 15)),
                planned_platform: Some("4".into()),
                ..Event::default()
            }),
            ..TimetableStop::new(StopId::new("a"))
        };
        let on_9 = TimetableStop {
            departure: Some(Event {
                planned_time: Some(at(10, 20)),
                planned_platform: Some("9".into()),
                ..Event::default()
            }),
            ..TimetableStop::new(StopId::new("b"))
        };
        mock.set_plan(at(10, 0), vec![on_4, on_9]);

        let clock = ManualClock::at(at(10, 0));
        let mut loader = TimetableLoader::new(mock.clone(), eva(), EventKind::Departure, 1)
            .with_clock(clock.clone())
            .with_filter(PlatformFilter::new(EventKind::Departure, ["4"]));

        let stops = loader.get_stops().await.unwrap();
        let ids: Vec<&str> = stops.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["a"]);

        // A change for the cached stop is applied unfiltered.
        mock.set_full_changes(vec![departure_change("a", at(10, 25))]);
        clock.advance_secs(121);
        let stops = loader.get_stops().await.unwrap();
        assert_eq!(
            stops[0].departure.as_ref().unwrap().changed_time,
            Some(at(10, 25))
        );
    }

    #[tokio::test]
    async fn transport_error_propagates_and_cache_survives() {
        let mock = MockTimetableApi::new();
        mock.set_plan(at(10, 0), vec![departure_stop("a", at(10, 45))]);

        let clock = ManualClock::at(at(10, 0));
        let mut loader = loader(&mock, &clock, 1);
        loader.get_stops().await.unwrap();

        clock.advance_secs(121);
        mock.fail_next();
        assert!(loader.get_stops().await.is_err());

        // The failed cycle left the cache intact and did not record a
        // changes fetch, so the next cycle retries the full feed.
        mock.clear_calls();
        clock.advance_secs(30);
        let stops = loader.get_stops().await.unwrap();
        assert_eq!(stops.len(), 1);
        assert_eq!(mock.calls(), vec![ApiCall::FullChanges]);
    }

    #[tokio::test]
    async fn results_are_sorted_by_planned_time() {
        let mock = MockTimetableApi::new();
        mock.set_plan(
            at(10, 0),
            vec![
                departure_stop("late", at(11, 0)),
                departure_stop("early", at(10, 30)),
                departure_stop("mid", at(10, 45)),
            ],
        );

        let clock = ManualClock::at(at(10, 0));
        let mut loader = loader(&mock, &clock, 3);

        let stops = loader.get_stops().await.unwrap();
        let ids: Vec<&str> = stops.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["early", "mid", "late"]);
    }
}
