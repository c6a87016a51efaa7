//! Time source abstraction.
//!
//! The loader never reads the wall clock directly; it asks a [`Clock`]
//! once per update cycle. Tests substitute a fixed clock to make feed
//! selection, eviction and the plan horizon deterministic.

use chrono::NaiveDateTime;

/// Supplies the current time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// The system wall clock, in local time.
///
/// Feed timestamps are German local time, so the loader compares them
/// against local time rather than UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}
