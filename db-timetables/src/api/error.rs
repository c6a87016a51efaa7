//! Timetable API client error types.

use std::fmt;

use super::convert::ConversionError;

/// Errors from the Timetables HTTP client.
///
/// These are all transport errors from the loader's point of view: it
/// propagates them unchanged and retries on its next scheduled call.
#[derive(Debug)]
pub enum TimetableError {
    /// HTTP request failed (network error, timeout, etc.)
    Http(reqwest::Error),

    /// XML deserialization failed
    Xml {
        message: String,
        body: Option<String>,
    },

    /// A decoded stop could not be converted to domain types
    Convert(ConversionError),

    /// API returned an error status code
    Api { status: u16, message: String },

    /// Rate limited by the API
    RateLimited,

    /// Invalid credentials or unauthorized
    Unauthorized,
}

impl fmt::Display for TimetableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimetableError::Http(e) => write!(f, "HTTP error: {e}"),
            TimetableError::Xml { message, body } => {
                write!(f, "XML parse error: {message}")?;
                if let Some(body) = body {
                    write!(f, " (body: {body})")?;
                }
                Ok(())
            }
            TimetableError::Convert(e) => write!(f, "conversion error: {e}"),
            TimetableError::Api { status, message } => {
                write!(f, "API error {status}: {message}")
            }
            TimetableError::RateLimited => write!(f, "rate limited by Timetables API"),
            TimetableError::Unauthorized => write!(f, "unauthorized (invalid credentials)"),
        }
    }
}

impl std::error::Error for TimetableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TimetableError::Http(e) => Some(e),
            TimetableError::Convert(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TimetableError {
    fn from(err: reqwest::Error) -> Self {
        TimetableError::Http(err)
    }
}

impl From<ConversionError> for TimetableError {
    fn from(err: ConversionError) -> Self {
        TimetableError::Convert(err)
    }
}
