// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{DriverSettings, RawSettingsFile};
use crate::errors::Result;

/// Load a settings file from a given path and return the raw
/// `RawSettingsFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] to get
/// usable [`DriverSettings`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSettingsFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let raw: RawSettingsFile = toml::from_str(&contents)?;

    Ok(raw)
}

/// Load a settings file and validate it.
///
/// - Reads TOML.
/// - Applies defaults for the optional file names.
/// - Rejects empty paths and file names that would leave the workdir.
/// - Resolves every path to an absolute one.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<DriverSettings> {
    let raw = load_from_path(&path)?;
    DriverSettings::try_from(raw.driver)
}

/// `RenderDriver.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("RenderDriver.toml")
}
