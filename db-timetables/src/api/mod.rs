//! DB Timetables API client.
//!
//! The API serves three feeds per station, each a `<timetable>` document:
//! - `/plan/{eva}/{date}/{hour}`: the planned stops for one hour slice.
//!   Immutable once published, available at most 18 hours ahead.
//! - `/fchg/{eva}`: all currently-known changes, refreshed server-side
//!   roughly every 30 seconds, valid until the changed trip departs.
//! - `/rchg/{eva}`: the changes known within the last ~120 seconds;
//!   cheaper, meant for frequent polling.

use chrono::{NaiveDateTime, Timelike};

use crate::domain::{EvaNumber, TimetableStop};

mod client;
mod convert;
mod error;
pub mod mock;
mod types;

pub use client::{TimetablesClient, TimetablesConfig};
pub use convert::{ConversionError, convert_stop, convert_timetable};
pub use error::TimetableError;
pub use types::{EventDto, StopDto, TimetableDto, TripLabelDto};

/// Truncate to the start of the hour, the granularity of the plan feed.
///
/// Any two times within the same hour address the same plan slice.
pub fn hour_slice(time: NaiveDateTime) -> NaiveDateTime {
    time.date()
        .and_hms_opt(time.hour(), 0, 0)
        .expect("hour is in range")
}

/// The remote timetable service, at the granularity the loader consumes.
///
/// Implemented by [`TimetablesClient`] for the real API and by
/// [`mock::MockTimetableApi`] for tests. All three calls are fallible with
/// a transport error; retry policy is the caller's business.
#[allow(async_fn_in_trait)]
pub trait TimetableApi {
    /// Planned stops for the hour slice containing `hour`.
    async fn get_plan(
        &self,
        station: EvaNumber,
        hour: NaiveDateTime,
    ) -> Result<Vec<TimetableStop>, TimetableError>;

    /// All currently-known changes for the station.
    async fn get_full_changes(
        &self,
        station: EvaNumber,
    ) -> Result<Vec<TimetableStop>, TimetableError>;

    /// Changes known within the last ~120 seconds.
    async fn get_recent_changes(
        &self,
        station: EvaNumber,
    ) -> Result<Vec<TimetableStop>, TimetableError>;
}
