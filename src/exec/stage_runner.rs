// src/exec/stage_runner.rs

//! Individual stage process runner.

use std::process::Stdio;

use anyhow::Context;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::progress::pump_progress;

use super::{StageCommand, StageExit, StageIo};

/// Run a single stage process to completion or cancellation.
///
/// - stderr always goes straight into the run log.
/// - stdout goes into the run log too; with a progress hook it is piped
///   through [`pump_progress`], which tees it into the log while parsing.
/// - If `cancel` fires, the child is killed and `StageExit::Cancelled` is
///   returned.
pub async fn run_stage(
    command: StageCommand,
    io: StageIo,
    cancel: CancellationToken,
) -> Result<StageExit> {
    let stage = command.stage;
    info!(%stage, cmd = %command.display(), workdir = %command.workdir.display(), "starting stage process");

    let StageIo { log, progress } = io;

    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .current_dir(&command.workdir)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    let stderr_log = log
        .try_clone()
        .with_context(|| format!("duplicating run log handle for {stage} stderr"))?;
    cmd.stderr(Stdio::from(stderr_log));

    if progress.is_some() {
        cmd.stdout(Stdio::piped());
    } else {
        let stdout_log = log
            .try_clone()
            .with_context(|| format!("duplicating run log handle for {stage} stdout"))?;
        cmd.stdout(Stdio::from(stdout_log));
    }

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning {stage} stage '{}'", command.program.display()))?;

    let pump = match (progress, child.stdout.take()) {
        (Some(hook), Some(stdout)) => {
            let tee = tokio::fs::File::from_std(log);
            Some(tokio::spawn(async move {
                pump_progress(stdout, hook.parser.as_ref(), hook.board.progress_sender(), Some(tee))
                    .await
            }))
        }
        _ => None,
    };

    let exit = tokio::select! {
        status_res = child.wait() => {
            let status = status_res
                .with_context(|| format!("waiting for {stage} stage process"))?;
            info!(
                %stage,
                exit_code = ?status.code(),
                success = status.success(),
                "stage process exited"
            );
            if status.success() {
                StageExit::Success
            } else {
                StageExit::Failed(status.code())
            }
        }

        _ = cancel.cancelled() => {
            info!(%stage, "cancellation requested; killing stage process");
            if let Err(e) = child.kill().await {
                warn!(%stage, error = %e, "failed to kill stage process on cancellation");
            }
            StageExit::Cancelled
        }
    };

    if let Some(handle) = pump {
        if exit == StageExit::Cancelled {
            // Orphaned grandchildren may keep the pipe open; don't wait on them.
            handle.abort();
        } else {
            match handle.await {
                Ok(Ok(())) => debug!(%stage, "progress pump finished"),
                Ok(Err(e)) => warn!(%stage, error = %e, "reading stage stdout failed"),
                Err(e) => warn!(%stage, error = %e, "progress pump task failed"),
            }
        }
    }

    Ok(exit)
}
