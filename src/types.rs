// src/types.rs

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::progress::ProgressSnapshot;

/// Driver-wide pipeline status.
///
/// A run moves strictly through `Idle -> Ready -> GeneratingScene ->
/// Rendering -> Idle`, leaving early to `Idle` when a stage fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DriverStatus {
    #[default]
    #[serde(rename = "idle")]
    Idle,
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "mc2pbrt")]
    GeneratingScene,
    #[serde(rename = "pbrt")]
    Rendering,
}

impl DriverStatus {
    /// Short wire name, as served on the status endpoint.
    pub fn as_str(self) -> &'static str {
        match self {
            DriverStatus::Idle => "idle",
            DriverStatus::Ready => "ready",
            DriverStatus::GeneratingScene => "mc2pbrt",
            DriverStatus::Rendering => "pbrt",
        }
    }

    pub fn is_idle(self) -> bool {
        self == DriverStatus::Idle
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the two external pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Scene generation (`mc2pbrt`).
    Generate,
    /// Rendering (`pbrt`).
    Render,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Generate => "generate",
            Stage::Render => "render",
        }
    }

    /// Status the driver reports while this stage is running.
    pub fn status(self) -> DriverStatus {
        match self {
            Stage::Generate => DriverStatus::GeneratingScene,
            Stage::Render => DriverStatus::Rendering,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view returned by `Driver::status`.
///
/// `progress` is only ever populated while `status` is `Rendering`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusView {
    /// Id of the run this status belongs to (0 before the first run).
    pub run_id: u64,
    pub status: DriverStatus,
    pub progress: Option<ProgressSnapshot>,
}

/// Result of one completed run.
///
/// Overwritten by the next run; the driver keeps no history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    pub run_id: u64,
    pub succeeded: bool,
    /// Stage that failed, if the failure happened inside a stage.
    pub failing_stage: Option<Stage>,
    pub error: Option<String>,
    /// Log file that captured this run's output, if one was created.
    pub log_name: Option<String>,
}

impl RunOutcome {
    pub fn success(run_id: u64, log_name: Option<String>) -> Self {
        Self {
            run_id,
            succeeded: true,
            failing_stage: None,
            error: None,
            log_name,
        }
    }

    pub fn failure(
        run_id: u64,
        failing_stage: Option<Stage>,
        error: impl Into<String>,
        log_name: Option<String>,
    ) -> Self {
        Self {
            run_id,
            succeeded: false,
            failing_stage,
            error: Some(error.into()),
            log_name,
        }
    }
}
