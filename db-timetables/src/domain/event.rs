//! Arrival/departure events and their attributes.

use chrono::NaiveDateTime;
use serde::Serialize;

/// Lifecycle status of an event, as reported by the feed.
///
/// The plan feed only ever reports `Planned`; the change feeds use `Added`
/// for unplanned extra stops and `Cancelled` for dropped ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// The stop is part of the published plan.
    Planned,
    /// The stop was added after the plan was published.
    Added,
    /// The stop was cancelled.
    Cancelled,
}

impl EventStatus {
    /// Decode a feed status code (`p`, `a` or `c`).
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "p" => Some(EventStatus::Planned),
            "a" => Some(EventStatus::Added),
            "c" => Some(EventStatus::Cancelled),
            _ => None,
        }
    }

    /// The single-letter feed code for this status.
    pub fn as_code(&self) -> &'static str {
        match self {
            EventStatus::Planned => "p",
            EventStatus::Added => "a",
            EventStatus::Cancelled => "c",
        }
    }
}

/// One side (arrival or departure) of a timetable stop.
///
/// Every attribute is independently optional and falls into one of two
/// classes: *planned* attributes are set once by the plan feed and never
/// change afterwards; *changed* attributes come from the change feeds and
/// override the planned value for display purposes. An absent changed
/// attribute means "no change reported yet", not "reverted".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Event {
    /// Scheduled time from the plan feed.
    pub planned_time: Option<NaiveDateTime>,
    /// Updated time from a change feed.
    pub changed_time: Option<NaiveDateTime>,
    /// Scheduled platform.
    pub planned_platform: Option<String>,
    /// Updated platform.
    pub changed_platform: Option<String>,
    /// Scheduled route (stations before/after this one on the trip).
    pub planned_path: Option<Vec<String>>,
    /// Updated route.
    pub changed_path: Option<Vec<String>>,
    /// Status from the plan feed.
    pub planned_status: Option<EventStatus>,
    /// Status from a change feed.
    pub changed_status: Option<EventStatus>,
    /// Line label shown to passengers (e.g. "RE 4" carries line "4").
    pub line: Option<String>,
}

impl Event {
    /// The most up-to-date time: changed if reported, else planned.
    pub fn best_time(&self) -> Option<NaiveDateTime> {
        self.changed_time.or(self.planned_time)
    }

    /// The most up-to-date platform: changed if reported, else planned.
    pub fn best_platform(&self) -> Option<&str> {
        self.changed_platform
            .as_deref()
            .or(self.planned_platform.as_deref())
    }

    /// The most up-to-date status: changed if reported, else planned.
    pub fn best_status(&self) -> Option<EventStatus> {
        self.changed_status.or(self.planned_status)
    }

    /// Whether this event lies entirely in the past.
    ///
    /// Judged on the best available time. An event with no time at all is
    /// treated as past: it carries nothing worth keeping alive.
    pub fn is_past(&self, now: NaiveDateTime) -> bool {
        match self.best_time() {
            Some(time) => time < now,
            None => true,
        }
    }
}
