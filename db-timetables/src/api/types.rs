//! Timetables API response DTOs.
//!
//! The feed is XML with everything in attributes. These types map directly
//! onto it via quick-xml's serde support (`@name` selects an attribute).
//! Every field is `Option` because each feed fills in a different subset:
//! plan responses carry only planned attributes, change responses mostly
//! changed ones.

use serde::Deserialize;

/// A `<timetable>` response from the plan or change endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TimetableDto {
    /// Station name, e.g. "Frankfurt(Main)Hbf". Absent on some change
    /// responses.
    #[serde(rename = "@station")]
    pub station: Option<String>,

    /// EVA number of the station.
    #[serde(rename = "@eva")]
    pub eva: Option<String>,

    /// The stops in this batch.
    #[serde(rename = "s", default)]
    pub stops: Vec<StopDto>,
}

/// An `<s>` element: one stop of one trip at the station.
#[derive(Debug, Clone, Deserialize)]
pub struct StopDto {
    /// Stop identifier, stable across the plan and change feeds.
    #[serde(rename = "@id")]
    pub id: String,

    /// Trip label. Present on plan stops, often absent on change stops.
    #[serde(rename = "tl")]
    pub trip_label: Option<TripLabelDto>,

    /// Arrival event.
    #[serde(rename = "ar")]
    pub arrival: Option<EventDto>,

    /// Departure event.
    #[serde(rename = "dp")]
    pub departure: Option<EventDto>,
}

/// A `<tl>` element identifying the trip.
#[derive(Debug, Clone, Deserialize)]
pub struct TripLabelDto {
    /// Trip category, e.g. "ICE", "RE", "S".
    #[serde(rename = "@c")]
    pub category: Option<String>,

    /// Train number.
    #[serde(rename = "@n")]
    pub number: Option<String>,

    /// Owner code of the operating company.
    #[serde(rename = "@o")]
    pub owner: Option<String>,
}

/// An `<ar>` or `<dp>` element.
///
/// Times are `YYMMDDHHMM` strings; paths are `|`-separated station lists;
/// statuses are the single letters `p`, `a` or `c`.
#[derive(Debug, Clone, Deserialize)]
pub struct EventDto {
    /// Planned time.
    #[serde(rename = "@pt")]
    pub planned_time: Option<String>,

    /// Changed time.
    #[serde(rename = "@ct")]
    pub changed_time: Option<String>,

    /// Planned platform.
    #[serde(rename = "@pp")]
    pub planned_platform: Option<String>,

    /// Changed platform.
    #[serde(rename = "@cp")]
    pub changed_platform: Option<String>,

    /// Planned path.
    #[serde(rename = "@ppth")]
    pub planned_path: Option<String>,

    /// Changed path.
    #[serde(rename = "@cpth")]
    pub changed_path: Option<String>,

    /// Planned status.
    #[serde(rename = "@ps")]
    pub planned_status: Option<String>,

    /// Changed status.
    #[serde(rename = "@cs")]
    pub changed_status: Option<String>,

    /// Line label.
    #[serde(rename = "@l")]
    pub line: Option<String>,
}
