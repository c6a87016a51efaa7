//! Deutsche Bahn Timetables cache engine.
//!
//! Keeps a bounded, sorted, always-fresh view of the upcoming stops at one
//! station by reconciling the three feeds of the DB Timetables API: the
//! immutable hourly plan, the full-changes feed, and the cheap
//! recent-changes feed.

pub mod api;
pub mod clock;
pub mod domain;
pub mod filter;
pub mod loader;
pub mod merge;
pub mod order;
