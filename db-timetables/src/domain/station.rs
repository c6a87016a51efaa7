//! Station identifier types.

use std::fmt;

/// Error returned when parsing an invalid EVA number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid EVA number: {reason}")]
pub struct InvalidEva {
    reason: &'static str,
}

/// A valid EVA station number.
///
/// EVA numbers identify stations in the DB Timetables API. They are short
/// decimal numbers (German stations are typically seven digits starting
/// with 8, e.g. 8000105 for Frankfurt Hbf). This type guarantees that any
/// `EvaNumber` value is numeric and non-zero by construction.
///
/// # Examples
///
/// ```
/// use db_timetables::domain::EvaNumber;
///
/// let frankfurt = EvaNumber::parse("8000105").unwrap();
/// assert_eq!(frankfurt.to_string(), "8000105");
///
/// // Non-digits are rejected
/// assert!(EvaNumber::parse("80001O5").is_err());
///
/// // Empty and oversized inputs are rejected
/// assert!(EvaNumber::parse("").is_err());
/// assert!(EvaNumber::parse("123456789").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct EvaNumber(u32);

impl EvaNumber {
    /// Parse an EVA number from a string.
    ///
    /// The input must be 1 to 8 ASCII digits and non-zero.
    pub fn parse(s: &str) -> Result<Self, InvalidEva> {
        if s.is_empty() || s.len() > 8 {
            return Err(InvalidEva {
                reason: "must be 1 to 8 digits",
            });
        }

        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidEva {
                reason: "must be decimal digits only",
            });
        }

        // Length and digit checks above make this infallible.
        let value: u32 = s.parse().map_err(|_| InvalidEva {
            reason: "out of range",
        })?;

        if value == 0 {
            return Err(InvalidEva {
                reason: "must be non-zero",
            });
        }

        Ok(EvaNumber(value))
    }
}

impl fmt::Debug for EvaNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EvaNumber({})", self.0)
    }
}

impl fmt::Display for EvaNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
