//! Mock timetable API for testing without network access.
//!
//! Serves canned batches per feed, records every call so tests can assert
//! on fetch cadence, and can be told to fail the next call to exercise
//! error propagation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;

use crate::domain::{EvaNumber, TimetableStop};

use super::error::TimetableError;
use super::{TimetableApi, hour_slice};

/// One recorded call against the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    /// A plan request for the given hour slice.
    Plan(NaiveDateTime),
    FullChanges,
    RecentChanges,
}

#[derive(Default)]
struct MockState {
    plans: HashMap<NaiveDateTime, Vec<TimetableStop>>,
    full_changes: Vec<TimetableStop>,
    recent_changes: Vec<TimetableStop>,
    calls: Vec<ApiCall>,
    fail_next: bool,
}

/// Programmable in-memory [`TimetableApi`].
///
/// Clones share state, so a test can keep one handle while the loader
/// owns another and reprogram the feeds between update cycles.
#[derive(Clone, Default)]
pub struct MockTimetableApi {
    state: Arc<Mutex<MockState>>,
}

impl MockTimetableApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `stops` for the plan slice containing `hour`.
    pub fn set_plan(&self, hour: NaiveDateTime, stops: Vec<TimetableStop>) {
        let mut state = self.state.lock().unwrap();
        state.plans.insert(hour_slice(hour), stops);
    }

    /// Serve `stops` from the full-changes feed.
    pub fn set_full_changes(&self, stops: Vec<TimetableStop>) {
        self.state.lock().unwrap().full_changes = stops;
    }

    /// Serve `stops` from the recent-changes feed.
    pub fn set_recent_changes(&self, stops: Vec<TimetableStop>) {
        self.state.lock().unwrap().recent_changes = stops;
    }

    /// Make the next call fail with a transport error.
    pub fn fail_next(&self) {
        self.state.lock().unwrap().fail_next = true;
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Drop the recorded call history.
    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    fn record(&self, call: ApiCall) -> Result<(), TimetableError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.fail_next {
            state.fail_next = false;
            return Err(TimetableError::Api {
                status: 503,
                message: "mock failure".to_string(),
            });
        }
        Ok(())
    }
}

impl TimetableApi for MockTimetableApi {
    async fn get_plan(
        &self,
        _station: EvaNumber,
        hour: NaiveDateTime,
    ) -> Result<Vec<TimetableStop>, TimetableError> {
        let slice = hour_slice(hour);
        self.record(ApiCall::Plan(slice))?;
        let state = self.state.lock().unwrap();
        Ok(state.plans.get(&slice).cloned().unwrap_or_default())
    }

    async fn get_full_changes(
        &self,
        _station: EvaNumber,
    ) -> Result<Vec<TimetableStop>, TimetableError> {
        self.record(ApiCall::FullChanges)?;
        Ok(self.state.lock().unwrap().full_changes.clone())
    }

    async fn get_recent_changes(
        &self,
        _station: EvaNumber,
    ) -> Result<Vec<TimetableStop>, TimetableError> {
        self.record(ApiCall::RecentChanges)?;
        Ok(self.state.lock().unwrap().recent_changes.clone())
    }
}
