// src/pipeline.rs

//! Two-stage render pipeline: `mc2pbrt` scene generation, then `pbrt`.
//!
//! One [`PipelineRunner::run`] call is one run. It creates the run log,
//! advances the published status before each stage, and always produces a
//! [`RunOutcome`]; errors never escape as `Err`.

use std::ffi::OsString;
use std::fs::File;
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::DriverSettings;
use crate::errors::{DriverError, Result};
use crate::exec::{ProgressHook, StageBackend, StageCommand, StageExit, StageIo};
use crate::logstore::LogStore;
use crate::progress::ProgressParser;
use crate::status::StatusBoard;
use crate::types::{RunOutcome, Stage};

pub struct PipelineRunner {
    settings: Arc<DriverSettings>,
    backend: Arc<dyn StageBackend>,
    parser: Arc<dyn ProgressParser>,
    logs: LogStore,
    board: Arc<StatusBoard>,
}

impl std::fmt::Debug for PipelineRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRunner")
            .field("settings", &self.settings)
            .field("logs", &self.logs)
            .finish_non_exhaustive()
    }
}

impl PipelineRunner {
    pub fn new(
        settings: Arc<DriverSettings>,
        backend: Arc<dyn StageBackend>,
        parser: Arc<dyn ProgressParser>,
        logs: LogStore,
        board: Arc<StatusBoard>,
    ) -> Self {
        Self {
            settings,
            backend,
            parser,
            logs,
            board,
        }
    }

    /// Execute one run end to end.
    ///
    /// Leaves the published status at `Rendering` (or `GeneratingScene`) on
    /// return; resetting to `Idle` is the caller's finalization step.
    pub async fn run(&self, run_id: u64, cancel: CancellationToken) -> RunOutcome {
        let (log_name, log) = match self.logs.create() {
            Ok(created) => created,
            Err(e) => {
                error!(run_id, error = %e, "could not open run log");
                return RunOutcome::failure(run_id, None, format!("open log file: {e}"), None);
            }
        };

        for stage in [Stage::Generate, Stage::Render] {
            if let Err(e) = self.run_stage(run_id, stage, &log, &cancel).await {
                error!(run_id, %stage, error = %e, "pipeline stopped");
                return RunOutcome::failure(run_id, Some(stage), e.to_string(), Some(log_name));
            }
        }

        info!(run_id, log = %log_name, "render pipeline finished");
        RunOutcome::success(run_id, Some(log_name))
    }

    async fn run_stage(
        &self,
        run_id: u64,
        stage: Stage,
        log: &File,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(stage_error(stage, "cancelled before start"));
        }

        let progress = match stage {
            Stage::Generate => None,
            Stage::Render => {
                self.board.clear_progress();
                Some(ProgressHook {
                    parser: Arc::clone(&self.parser),
                    board: Arc::clone(&self.board),
                })
            }
        };
        self.board.set(run_id, stage.status());

        let log = log
            .try_clone()
            .with_context(|| format!("duplicating run log handle for {stage} stage"))
            .map_err(|e| stage_error(stage, format!("{e:#}")))?;
        let command = self.command_for(stage);
        info!(run_id, %stage, cmd = %command.display(), "running stage");

        let exit = self
            .backend
            .run_stage(command, StageIo { log, progress }, cancel.clone())
            .await;

        match exit {
            Ok(StageExit::Success) => Ok(()),
            Ok(StageExit::Failed(Some(code))) => {
                Err(stage_error(stage, format!("exited with status code {code}")))
            }
            Ok(StageExit::Failed(None)) => Err(stage_error(stage, "terminated by signal")),
            Ok(StageExit::Cancelled) => {
                warn!(run_id, %stage, "stage cancelled");
                Err(stage_error(stage, "cancelled"))
            }
            Err(e) => Err(stage_error(stage, format!("failed to start: {e}"))),
        }
    }

    /// Build the process invocation for `stage` from the settings.
    pub fn command_for(&self, stage: Stage) -> StageCommand {
        let s = &self.settings;
        let (program, args) = match stage {
            Stage::Generate => {
                let mut args: Vec<OsString> = Vec::new();
                let program = if s.generator_is_script() {
                    args.push(s.generator.clone().into_os_string());
                    s.python.clone().into()
                } else {
                    s.generator.clone()
                };
                args.push("--filename".into());
                args.push(s.config_file.clone().into());
                (program, args)
            }
            Stage::Render => (
                s.renderer.clone(),
                vec![
                    s.scene_path().into_os_string(),
                    "--outfile".into(),
                    s.output_image.clone().into(),
                ],
            ),
        };

        StageCommand {
            stage,
            program,
            args,
            workdir: s.workdir.clone(),
        }
    }
}

fn stage_error(stage: Stage, message: impl Into<String>) -> DriverError {
    DriverError::StageExecution {
        stage,
        message: message.into(),
    }
}
