// src/driver/mod.rs

//! The render driver: admission control, run lifecycle, and the public
//! contract used by front ends.
//!
//! A [`Driver`] is a cheap handle (`Arc` inside); clone it into every caller
//! instead of reaching for global state. At most one run is active at any
//! time:
//!
//! - [`Driver::submit`] claims the single run slot by moving the published
//!   status from `Idle` to `Ready` in one step, writes the request artifact,
//!   and spawns the pipeline on the runtime captured at construction.
//!   Publishing `Idle` again is what frees the slot.
//! - [`Driver::status`] and [`Driver::last_result`] read published values
//!   and never wait on the pipeline.
//! - [`Driver::cancel`] only requests termination; the run reports back to
//!   `Idle` through its finalization path.

mod finalize;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::DriverSettings;
use crate::errors::{DriverError, Result};
use crate::exec::{ProcessStageBackend, StageBackend};
use crate::logstore::LogStore;
use crate::pipeline::PipelineRunner;
use crate::progress::{PbrtProgressParser, ProgressParser};
use crate::request::RenderRequest;
use crate::serializer::ConfigSerializer;
use crate::status::StatusBoard;
use crate::types::{DriverStatus, RunOutcome, StatusView};

use finalize::FinalizeGuard;

/// State shared between driver handles and the background run task.
pub(crate) struct Shared {
    settings: Arc<DriverSettings>,
    serializer: ConfigSerializer,
    logs: LogStore,
    pipeline: PipelineRunner,
    board: Arc<StatusBoard>,
    last_result: watch::Sender<Option<RunOutcome>>,
    active: Mutex<Option<ActiveRun>>,
    runtime: Handle,
}

impl Shared {
    fn active(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle on the run currently (or most recently) in flight.
struct ActiveRun {
    run_id: u64,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

/// Render driver handle.
#[derive(Clone)]
pub struct Driver {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("settings", &self.shared.settings)
            .field("status", &self.shared.board.view())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Driver`] when the defaults need replacing.
pub struct DriverBuilder {
    settings: DriverSettings,
    backend: Arc<dyn StageBackend>,
    parser: Arc<dyn ProgressParser>,
    runtime: Option<Handle>,
}

impl DriverBuilder {
    /// Replace the process backend (tests use a scripted fake).
    pub fn backend(mut self, backend: Arc<dyn StageBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Replace the renderer progress parser.
    pub fn parser(mut self, parser: Arc<dyn ProgressParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Spawn runs on this runtime instead of the current one.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> Result<Driver> {
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current()
                .context("render driver must be built inside a tokio runtime")?,
        };

        let settings = Arc::new(self.settings);
        let logs = LogStore::new(&settings.log_dir);
        logs.ensure_dir()?;

        let board = Arc::new(StatusBoard::new());
        let pipeline = PipelineRunner::new(
            Arc::clone(&settings),
            self.backend,
            self.parser,
            logs.clone(),
            Arc::clone(&board),
        );
        let (last_result, _) = watch::channel(None);

        info!(
            workdir = %settings.workdir.display(),
            log_dir = %settings.log_dir.display(),
            "render driver ready"
        );

        Ok(Driver {
            shared: Arc::new(Shared {
                serializer: ConfigSerializer::new(settings.config_path()),
                settings,
                logs,
                pipeline,
                board,
                last_result,
                active: Mutex::new(None),
                runtime,
            }),
        })
    }
}

impl Driver {
    /// Driver with real processes and the pbrt progress parser, spawning on
    /// the current tokio runtime.
    pub fn new(settings: DriverSettings) -> Result<Self> {
        Self::builder(settings).build()
    }

    pub fn builder(settings: DriverSettings) -> DriverBuilder {
        DriverBuilder {
            settings,
            backend: Arc::new(ProcessStageBackend),
            parser: Arc::new(PbrtProgressParser),
            runtime: None,
        }
    }

    pub fn settings(&self) -> &DriverSettings {
        &self.shared.settings
    }

    /// Start a run for `request` and return its run id without waiting.
    ///
    /// Fails with [`DriverError::Busy`] if a run is active (nothing changes)
    /// or [`DriverError::Config`] if the request artifact cannot be written
    /// (the driver is back to `Idle` on return).
    pub fn submit(&self, request: RenderRequest) -> Result<u64> {
        let shared = &self.shared;
        let cancel = CancellationToken::new();
        let run_id = {
            // Held across the claim so `cancel` never sees `Ready` paired
            // with the previous run's token.
            let mut active = shared.active();
            let Some(run_id) = shared.board.try_claim() else {
                debug!("submit rejected; a run is already active");
                return Err(DriverError::Busy);
            };
            *active = Some(ActiveRun {
                run_id,
                cancel: cancel.clone(),
                handle: None,
            });
            run_id
        };
        info!(run_id, world = %request.world, player = %request.player, "render run admitted");

        if let Err(e) = shared.serializer.write(&request) {
            warn!(run_id, error = %e, "render config not written; run abandoned");
            shared.board.set(run_id, DriverStatus::Idle);
            return Err(e);
        }

        let guard = FinalizeGuard::new(Arc::clone(shared), run_id);
        let task_shared = Arc::clone(shared);
        let task_cancel = cancel.clone();

        let mut active = shared.active();
        let handle = shared.runtime.spawn(async move {
            let outcome = task_shared.pipeline.run(run_id, task_cancel).await;
            guard.complete(outcome);
        });
        if let Some(run) = active.as_mut().filter(|run| run.run_id == run_id) {
            run.handle = Some(handle);
        }

        Ok(run_id)
    }

    /// Current status; includes progress only while rendering.
    pub fn status(&self) -> StatusView {
        self.shared.board.view()
    }

    /// Outcome of the most recently completed run.
    pub fn last_result(&self) -> Option<RunOutcome> {
        self.shared.last_result.borrow().clone()
    }

    /// Request termination of the active stage process. No-op when idle.
    pub fn cancel(&self) {
        if self.shared.board.status().is_idle() {
            debug!("cancel requested while idle; nothing to do");
            return;
        }
        match self.shared.active().as_ref() {
            Some(run) if !run.cancel.is_cancelled() => {
                info!(run_id = run.run_id, "cancelling active run");
                run.cancel.cancel();
            }
            Some(run) => debug!(run_id = run.run_id, "run already cancelled"),
            None => debug!("no active run to cancel"),
        }
    }

    /// Cancel the active run, if any, and wait for its task to finish.
    pub async fn shutdown(&self) {
        let active = self.shared.active().take();
        let Some(run) = active else {
            return;
        };
        run.cancel.cancel();
        if let Some(handle) = run.handle {
            if let Err(e) = handle.await {
                warn!(run_id = run.run_id, error = %e, "run task ended abnormally");
            }
        }
        info!(run_id = run.run_id, "driver shut down");
    }

    /// Every status transition, in order, from now on.
    pub fn subscribe_transitions(&self) -> broadcast::Receiver<DriverStatus> {
        self.shared.board.subscribe_transitions()
    }

    /// Resolves once the driver is `Idle`.
    pub async fn wait_idle(&self) {
        self.shared.board.wait_idle().await;
    }

    pub fn list_logs(&self) -> Result<Vec<String>> {
        self.shared.logs.list()
    }

    pub fn read_log(&self, name: &str) -> Result<String> {
        self.shared.logs.read(name)
    }

    pub fn delete_log(&self, name: &str) -> Result<()> {
        self.shared.logs.delete(name)
    }

    pub fn result_image_path(&self) -> PathBuf {
        self.shared.settings.output_image_path()
    }

    /// Bytes of the last rendered image.
    pub fn result_image(&self) -> Result<Vec<u8>> {
        let path = self.result_image_path();
        std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DriverError::NotFound(path.display().to_string())
            } else {
                DriverError::Io(e)
            }
        })
    }

    /// Last rendered image, base64 encoded for embedding in a page.
    pub fn result_image_base64(&self) -> Result<String> {
        Ok(BASE64.encode(self.result_image()?))
    }
}
