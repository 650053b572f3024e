// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level settings file as read from TOML.
///
/// ```toml
/// [driver]
/// workdir = "./mc2pbrt"
/// generator = "./mc2pbrt/main.py"
/// renderer = "./pbrt-v3/build/pbrt"
/// log_dir = "./log"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawSettingsFile {
    pub driver: DriverSection,
}

/// `[driver]` section, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct DriverSection {
    /// Pipeline root; both stages run here.
    pub workdir: String,

    /// Scene generator entry point (`mc2pbrt` binary or its `main.py`).
    pub generator: String,

    /// Renderer binary (`pbrt`).
    pub renderer: String,

    /// Directory holding one log file per run.
    pub log_dir: String,

    /// Interpreter used when `generator` is a Python script.
    #[serde(default = "default_python")]
    pub python: String,

    /// Name of the request artifact written into `workdir`.
    #[serde(default = "default_config_file")]
    pub config_file: String,

    /// Scene file produced by the generator, relative to `workdir`.
    #[serde(default = "default_scene_file")]
    pub scene_file: String,

    /// Image written by the renderer into `workdir`.
    #[serde(default = "default_output_image")]
    pub output_image: String,
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_config_file() -> String {
    "config.json".to_string()
}

fn default_scene_file() -> String {
    "scenes/target.pbrt".to_string()
}

fn default_output_image() -> String {
    "mc.png".to_string()
}

/// Validated driver settings with absolute paths.
///
/// Build through [`crate::config::load_and_validate`] or
/// `DriverSettings::try_from(section)`; [`DriverSettings::new`] exists for
/// callers that already hold absolute paths (tests, embedding).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSettings {
    pub workdir: PathBuf,
    pub generator: PathBuf,
    pub renderer: PathBuf,
    pub log_dir: PathBuf,
    pub python: String,
    pub config_file: String,
    pub scene_file: PathBuf,
    pub output_image: String,
}

impl DriverSettings {
    /// Settings with the stock file names (`config.json`,
    /// `scenes/target.pbrt`, `mc.png`) and `python3`.
    pub fn new(
        workdir: impl Into<PathBuf>,
        generator: impl Into<PathBuf>,
        renderer: impl Into<PathBuf>,
        log_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            workdir: workdir.into(),
            generator: generator.into(),
            renderer: renderer.into(),
            log_dir: log_dir.into(),
            python: default_python(),
            config_file: default_config_file(),
            scene_file: PathBuf::from(default_scene_file()),
            output_image: default_output_image(),
        }
    }

    /// Absolute path of the request artifact.
    pub fn config_path(&self) -> PathBuf {
        self.workdir.join(&self.config_file)
    }

    /// Absolute path of the generated scene handed to the renderer.
    pub fn scene_path(&self) -> PathBuf {
        self.workdir.join(&self.scene_file)
    }

    /// Absolute path of the rendered image.
    pub fn output_image_path(&self) -> PathBuf {
        self.workdir.join(&self.output_image)
    }

    /// Whether the generator has to go through the Python interpreter.
    pub fn generator_is_script(&self) -> bool {
        is_python_script(&self.generator)
    }
}

fn is_python_script(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "py")
}
