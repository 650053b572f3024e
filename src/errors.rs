// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::types::Stage;

#[derive(Error, Debug)]
pub enum DriverError {
    /// A run is already active; nothing was changed.
    #[error("driver busy: a render run is already active")]
    Busy,

    /// The render request could not be written for the generation stage.
    #[error("config error: {0}")]
    Config(String),

    /// A stage process failed to start or exited unsuccessfully.
    #[error("{stage} stage failed: {message}")]
    StageExecution { stage: Stage, message: String },

    #[error("log not found: {0}")]
    NotFound(String),

    #[error("invalid log name: {0:?}")]
    InvalidLogName(String),

    /// Driver settings (TOML) could not be loaded or validated.
    #[error("settings error: {0}")]
    Settings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DriverError>;
