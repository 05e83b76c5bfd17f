// ── Coordinator state ──
//
// The shared view every consumer reads. Replaced as a whole after each
// refresh cycle so readers never observe a new snapshot paired with a
// stale error (or the reverse).

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::model::Snapshot;

/// Point-in-time state of a coordinator.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorState {
    /// Most recent successful snapshot. Survives later failed refreshes.
    pub snapshot: Option<Arc<Snapshot>>,
    /// Error from the most recent cycle, cleared by the next success.
    pub last_error: Option<CoreError>,
    /// Number of successful refreshes so far.
    pub generation: u64,
    /// Number of completed refresh cycles, successful or not.
    pub attempts: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_attempt: Option<DateTime<Utc>>,
}

impl CoordinatorState {
    /// At least one refresh has succeeded.
    pub fn is_ready(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Whether the most recent cycle succeeded. `false` before any cycle.
    pub fn last_update_success(&self) -> bool {
        self.attempts > 0 && self.last_error.is_none()
    }

    /// Outcome of the most recent cycle, as seen by callers that joined it.
    pub(crate) fn outcome(&self) -> Result<(), CoreError> {
        match &self.last_error {
            Some(err) => Err(err.clone()),
            None if self.attempts == 0 => Err(CoreError::Unavailable),
            None => Ok(()),
        }
    }

    /// Age of the held snapshot.
    pub fn data_age(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.snapshot.as_ref().map(|s| now - s.fetched_at)
    }

    pub(crate) fn succeeded(&self, snapshot: Snapshot) -> Self {
        let now = Utc::now();
        Self {
            snapshot: Some(Arc::new(snapshot)),
            last_error: None,
            generation: self.generation + 1,
            attempts: self.attempts + 1,
            last_success: Some(now),
            last_attempt: Some(now),
        }
    }

    pub(crate) fn failed(&self, error: CoreError) -> Self {
        Self {
            snapshot: self.snapshot.clone(),
            last_error: Some(error),
            generation: self.generation,
            attempts: self.attempts + 1,
            last_success: self.last_success,
            last_attempt: Some(Utc::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_state_is_not_ready() {
        let state = CoordinatorState::default();
        assert!(!state.is_ready());
        assert!(!state.last_update_success());
        assert_eq!(state.outcome(), Err(CoreError::Unavailable));
        assert!(state.data_age(Utc::now()).is_none());
    }

    #[test]
    fn failure_before_first_success_keeps_snapshot_absent() {
        let state = CoordinatorState::default().failed(CoreError::Timeout { timeout_secs: 5 });
        assert!(!state.is_ready());
        assert_eq!(state.attempts, 1);
        assert_eq!(state.generation, 0);
        assert_eq!(state.outcome(), Err(CoreError::Timeout { timeout_secs: 5 }));
    }
}
