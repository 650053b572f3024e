// src/status.rs

//! Published driver status.
//!
//! Readers never contend with the pipeline: status and progress each live in
//! a `watch` channel and are replaced whole. Every status change is also
//! broadcast so observers can follow the exact transition sequence, which a
//! `watch` receiver would coalesce.
//!
//! The status cell doubles as the run slot. [`StatusBoard::try_claim`] moves
//! `Idle` to `Ready` under the channel's write lock, so publishing `Idle` is
//! the release and a caller that has seen `Idle` can always claim.

use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::progress::ProgressSnapshot;
use crate::types::{DriverStatus, StatusView};

const TRANSITION_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct StatusCell {
    run_id: u64,
    status: DriverStatus,
}

#[derive(Debug)]
pub struct StatusBoard {
    status: watch::Sender<StatusCell>,
    progress: watch::Sender<Option<ProgressSnapshot>>,
    transitions: broadcast::Sender<DriverStatus>,
}

impl StatusBoard {
    pub fn new() -> Self {
        let (status, _) = watch::channel(StatusCell::default());
        let (progress, _) = watch::channel(None);
        let (transitions, _) = broadcast::channel(TRANSITION_BUFFER);
        Self {
            status,
            progress,
            transitions,
        }
    }

    /// Publish a new status for `run_id`.
    pub fn set(&self, run_id: u64, status: DriverStatus) {
        let mut previous = status;
        self.status.send_modify(|cell| {
            previous = cell.status;
            *cell = StatusCell { run_id, status };
            // Broadcast under the write lock so the feed order matches the
            // order of publication. No subscribers is fine.
            let _ = self.transitions.send(status);
        });
        debug!(run_id, from = %previous, to = %status, "driver status changed");
    }

    /// Move `Idle` to `Ready` for a fresh run id in one step.
    ///
    /// Returns the new run id, or `None` if a run already holds the slot.
    pub fn try_claim(&self) -> Option<u64> {
        let mut claimed = None;
        self.status.send_if_modified(|cell| {
            if !cell.status.is_idle() {
                return false;
            }
            let run_id = cell.run_id + 1;
            *cell = StatusCell {
                run_id,
                status: DriverStatus::Ready,
            };
            let _ = self.transitions.send(DriverStatus::Ready);
            claimed = Some(run_id);
            true
        });
        if let Some(run_id) = claimed {
            debug!(run_id, from = %DriverStatus::Idle, to = %DriverStatus::Ready, "driver status changed");
        }
        claimed
    }

    pub fn status(&self) -> DriverStatus {
        self.status.borrow().status
    }

    /// Current status, with progress attached only while rendering.
    pub fn view(&self) -> StatusView {
        let cell = *self.status.borrow();
        let progress = match cell.status {
            DriverStatus::Rendering => *self.progress.borrow(),
            _ => None,
        };
        StatusView {
            run_id: cell.run_id,
            status: cell.status,
            progress,
        }
    }

    /// Sender the render stage publishes snapshots into.
    pub fn progress_sender(&self) -> &watch::Sender<Option<ProgressSnapshot>> {
        &self.progress
    }

    pub fn clear_progress(&self) {
        self.progress.send_replace(None);
    }

    pub fn subscribe_transitions(&self) -> broadcast::Receiver<DriverStatus> {
        self.transitions.subscribe()
    }

    /// Resolves once the published status is `Idle`.
    pub async fn wait_idle(&self) {
        let mut rx = self.status.subscribe();
        // The sender lives as long as `self`, so this cannot fail while borrowed.
        let _ = rx.wait_for(|cell| cell.status.is_idle()).await;
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}
