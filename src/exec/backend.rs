// src/exec/backend.rs

//! Pluggable stage backend abstraction.
//!
//! The pipeline talks to a `StageBackend` instead of spawning processes
//! itself, so tests can script stage outcomes without real binaries.

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::errors::Result;

use super::{StageCommand, StageExit, StageIo};

/// Trait abstracting how a single stage is executed.
///
/// `Err` means the stage could not be started at all; a stage that ran and
/// failed reports `Ok(StageExit::Failed(..))`.
pub trait StageBackend: Send + Sync {
    fn run_stage(
        &self,
        command: StageCommand,
        io: StageIo,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<StageExit>> + Send + '_>>;
}

/// Production backend: real OS processes via `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessStageBackend;

impl StageBackend for ProcessStageBackend {
    fn run_stage(
        &self,
        command: StageCommand,
        io: StageIo,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<StageExit>> + Send + '_>> {
        Box::pin(super::stage_runner::run_stage(command, io, cancel))
    }
}
