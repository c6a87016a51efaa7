//! Conversion from feed DTOs to domain types.

use chrono::NaiveDateTime;
use tracing::warn;

use crate::domain::{Event, EventStatus, StopId, TimetableStop, TripLabel};

use super::types::{EventDto, StopDto, TimetableDto};

/// Feed timestamp layout: `YYMMDDHHMM`.
const TIME_FORMAT: &str = "%y%m%d%H%M";

/// Error during DTO to domain conversion.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConversionError {
    /// Failed to parse a feed timestamp
    #[error("invalid timestamp: {0}")]
    InvalidTime(String),

    /// Unknown status code
    #[error("invalid status code: {0}")]
    InvalidStatus(String),

    /// A stop carried neither arrival nor departure
    #[error("stop {0} has no events")]
    EmptyStop(String),
}

/// Convert a timetable response to domain stops.
///
/// Malformed stops are skipped with a warning rather than failing the
/// whole batch; a single bad record must not starve the cache.
pub fn convert_timetable(timetable: &TimetableDto) -> Vec<TimetableStop> {
    let mut stops = Vec::with_capacity(timetable.stops.len());

    for stop in &timetable.stops {
        match convert_stop(stop) {
            Ok(converted) => stops.push(converted),
            Err(e) => warn!(stop_id = %stop.id, error = %e, "skipping malformed stop"),
        }
    }

    stops
}

/// Convert a single stop element.
pub fn convert_stop(dto: &StopDto) -> Result<TimetableStop, ConversionError> {
    if dto.arrival.is_none() && dto.departure.is_none() {
        return Err(ConversionError::EmptyStop(dto.id.clone()));
    }

    Ok(TimetableStop {
        id: StopId::new(dto.id.clone()),
        label: dto.trip_label.as_ref().map(|label| TripLabel {
            category: label.category.clone(),
            number: label.number.clone(),
            owner: label.owner.clone(),
        }),
        arrival: dto.arrival.as_ref().map(convert_event).transpose()?,
        departure: dto.departure.as_ref().map(convert_event).transpose()?,
    })
}

fn convert_event(dto: &EventDto) -> Result<Event, ConversionError> {
    Ok(Event {
        planned_time: parse_time(dto.planned_time.as_deref())?,
        changed_time: parse_time(dto.changed_time.as_deref())?,
        planned_platform: dto.planned_platform.clone(),
        changed_platform: dto.changed_platform.clone(),
        planned_path: dto.planned_path.as_deref().map(parse_path),
        changed_path: dto.changed_path.as_deref().map(parse_path),
        planned_status: parse_status(dto.planned_status.as_deref())?,
        changed_status: parse_status(dto.changed_status.as_deref())?,
        line: dto.line.clone(),
    })
}

fn parse_time(value: Option<&str>) -> Result<Option<NaiveDateTime>, ConversionError> {
    value
        .map(|s| {
            NaiveDateTime::parse_from_str(s, TIME_FORMAT)
                .map_err(|_| ConversionError::InvalidTime(s.to_string()))
        })
        .transpose()
}

fn parse_status(value: Option<&str>) -> Result<Option<EventStatus>, ConversionError> {
    value
        .map(|s| EventStatus::from_code(s).ok_or_else(|| ConversionError::InvalidStatus(s.to_string())))
        .transpose()
}

fn parse_path(value: &str) -> Vec<String> {
    value.split('|').map(str::to_string).collect()
}
