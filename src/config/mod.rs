// src/config/mod.rs

//! Driver settings: TOML model, loading, and validation.
//!
//! - [`model`] holds the raw deserialized file and the validated
//!   [`DriverSettings`] the rest of the crate consumes.
//! - [`loader`] reads a file from disk.
//! - [`validate`] turns raw sections into settings (path checks, absolute
//!   path resolution).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{DriverSection, DriverSettings, RawSettingsFile};
