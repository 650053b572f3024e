use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use render_driver::errors::Result;
use render_driver::exec::{StageBackend, StageCommand, StageExit, StageIo};
use render_driver::progress::ProgressSnapshot;
use render_driver::types::Stage;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Scripted behaviour for one fake stage.
#[derive(Clone, Debug)]
pub enum FakeStage {
    Succeed,
    /// Exit with this non-zero code.
    Exit(i32),
    /// Report a spawn failure.
    FailToStart,
    /// Publish these snapshots, then succeed.
    Progress(Vec<ProgressSnapshot>),
    /// Publish these snapshots, then block until cancelled.
    Hang(Vec<ProgressSnapshot>),
    /// Block until the gate is notified (success) or the run is cancelled.
    Gated(Arc<Notify>),
}

/// A fake backend that:
/// - records every stage command it was asked to run
/// - writes a marker line into the run log
/// - behaves as scripted per stage instead of spawning processes.
pub struct FakeStageBackend {
    generate: FakeStage,
    render: FakeStage,
    calls: Arc<Mutex<Vec<StageCommand>>>,
}

impl FakeStageBackend {
    pub fn new(generate: FakeStage, render: FakeStage) -> Self {
        Self {
            generate,
            render,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Both stages succeed immediately.
    pub fn succeeding() -> Self {
        Self::new(FakeStage::Succeed, FakeStage::Succeed)
    }

    /// Shared record of invoked commands, in order.
    pub fn calls(&self) -> Arc<Mutex<Vec<StageCommand>>> {
        Arc::clone(&self.calls)
    }
}

impl StageBackend for FakeStageBackend {
    fn run_stage(
        &self,
        command: StageCommand,
        io: StageIo,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<StageExit>> + Send + '_>> {
        self.calls.lock().unwrap().push(command.clone());
        let behaviour = match command.stage {
            Stage::Generate => self.generate.clone(),
            Stage::Render => self.render.clone(),
        };

        Box::pin(async move {
            let StageIo { mut log, progress } = io;
            writeln!(log, "fake {} stage", command.stage).map_err(anyhow::Error::from)?;

            let publish = |snapshots: Vec<ProgressSnapshot>| {
                if let Some(hook) = &progress {
                    for s in snapshots {
                        hook.publish(s);
                    }
                }
            };

            match behaviour {
                FakeStage::Succeed => Ok(StageExit::Success),
                FakeStage::Exit(code) => Ok(StageExit::Failed(Some(code))),
                FakeStage::FailToStart => {
                    Err(anyhow::anyhow!("spawning fake {} stage: not found", command.stage).into())
                }
                FakeStage::Progress(snapshots) => {
                    publish(snapshots);
                    Ok(StageExit::Success)
                }
                FakeStage::Hang(snapshots) => {
                    publish(snapshots);
                    cancel.cancelled().await;
                    Ok(StageExit::Cancelled)
                }
                FakeStage::Gated(gate) => {
                    tokio::select! {
                        _ = gate.notified() => Ok(StageExit::Success),
                        _ = cancel.cancelled() => Ok(StageExit::Cancelled),
                    }
                }
            }
        })
    }
}
