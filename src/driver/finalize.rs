// src/driver/finalize.rs

//! Run finalization guard.

use std::sync::Arc;

use tracing::{info, warn};

use crate::types::{DriverStatus, RunOutcome};

use super::Shared;

/// Puts the driver back to `Idle` when a run ends, however it ends.
///
/// The guard is moved into the background task before it is spawned, so
/// completion, failure, panic, and abort all pass through `Drop`. A run that
/// never called [`FinalizeGuard::complete`] is recorded as aborted.
pub(crate) struct FinalizeGuard {
    shared: Arc<Shared>,
    run_id: u64,
    outcome: Option<RunOutcome>,
}

impl FinalizeGuard {
    pub(crate) fn new(shared: Arc<Shared>, run_id: u64) -> Self {
        Self {
            shared,
            run_id,
            outcome: None,
        }
    }

    pub(crate) fn complete(mut self, outcome: RunOutcome) {
        self.outcome = Some(outcome);
    }
}

impl Drop for FinalizeGuard {
    fn drop(&mut self) {
        let outcome = match self.outcome.take() {
            Some(outcome) => outcome,
            None => {
                warn!(run_id = self.run_id, "run ended without an outcome; recording abort");
                RunOutcome::failure(self.run_id, None, "run aborted before completion", None)
            }
        };

        info!(
            run_id = self.run_id,
            succeeded = outcome.succeeded,
            failing_stage = ?outcome.failing_stage,
            "run finalized"
        );

        // Result before Idle: a caller that sees Idle also sees this run's
        // outcome. Publishing Idle frees the run slot.
        self.shared.last_result.send_replace(Some(outcome));
        self.shared.board.clear_progress();
        self.shared.board.set(self.run_id, DriverStatus::Idle);
    }
}
