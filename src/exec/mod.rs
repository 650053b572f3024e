// src/exec/mod.rs

//! Stage process execution layer.
//!
//! - [`backend`] defines the [`StageBackend`] seam the pipeline talks to,
//!   plus the production [`ProcessStageBackend`]. Tests swap in fakes.
//! - [`stage_runner`] runs one external process with `tokio::process`,
//!   routes its output into the run log, and handles cancellation.

pub mod backend;
pub mod stage_runner;

use std::ffi::OsString;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use crate::progress::{ProgressParser, ProgressSnapshot};
use crate::status::StatusBoard;
use crate::types::Stage;

pub use backend::{ProcessStageBackend, StageBackend};
pub use stage_runner::run_stage;

/// Fully resolved invocation of one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCommand {
    pub stage: Stage,
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub workdir: PathBuf,
}

impl StageCommand {
    /// Human-readable command line for logging.
    pub fn display(&self) -> String {
        let mut out = self.program.display().to_string();
        for arg in &self.args {
            out.push(' ');
            out.push_str(&arg.to_string_lossy());
        }
        out
    }
}

/// Where a stage's output goes.
#[derive(Debug)]
pub struct StageIo {
    /// Run log; receives stderr always, and stdout unless `progress` is set
    /// (then stdout is teed into it by the progress pump).
    pub log: File,
    pub progress: Option<ProgressHook>,
}

/// Progress extraction attached to a stage's stdout.
#[derive(Clone)]
pub struct ProgressHook {
    pub parser: Arc<dyn ProgressParser>,
    pub board: Arc<StatusBoard>,
}

impl ProgressHook {
    pub fn publish(&self, snapshot: ProgressSnapshot) {
        self.board.progress_sender().send_replace(Some(snapshot));
    }
}

impl std::fmt::Debug for ProgressHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressHook").finish_non_exhaustive()
    }
}

/// How a stage process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageExit {
    Success,
    /// Non-zero exit; `None` when killed by a signal.
    Failed(Option<i32>),
    /// Killed because the run was cancelled.
    Cancelled,
}
