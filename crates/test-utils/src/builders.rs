#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use render_driver::config::DriverSettings;
use render_driver::request::{RenderRequest, Resolution, Selector};
use serde_json::Value;

/// Builder for `DriverSettings` rooted in a scratch directory.
///
/// Lays out `<root>/work/scenes` and uses `<root>/logs` for run logs.
pub struct SettingsBuilder {
    settings: DriverSettings,
}

impl SettingsBuilder {
    pub fn new(root: &Path) -> Self {
        let workdir = root.join("work");
        fs::create_dir_all(workdir.join("scenes")).expect("creating test workdir");
        Self {
            settings: DriverSettings::new(
                &workdir,
                root.join("mc2pbrt"),
                root.join("pbrt"),
                root.join("logs"),
            ),
        }
    }

    pub fn generator(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.generator = path.into();
        self
    }

    pub fn renderer(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.renderer = path.into();
        self
    }

    pub fn config_file(mut self, name: &str) -> Self {
        self.settings.config_file = name.to_string();
        self
    }

    pub fn build(self) -> DriverSettings {
        self.settings
    }
}

/// Builder for `RenderRequest` with sensible defaults.
pub struct RequestBuilder {
    request: RenderRequest,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            request: RenderRequest {
                world: "/saves/TestWorld".to_string(),
                player: "Steve".to_string(),
                sample: 4,
                radius: 2,
                resolution: None,
                method: Selector::named("PathTracing"),
                camera: Selector::named("Perspective"),
                phenomenons: Vec::new(),
            },
        }
    }

    pub fn world(mut self, world: &str) -> Self {
        self.request.world = world.to_string();
        self
    }

    pub fn sample(mut self, sample: u32) -> Self {
        self.request.sample = sample;
        self
    }

    pub fn resolution(mut self, width: u32, height: u32) -> Self {
        self.request.resolution = Some(Resolution { width, height });
        self
    }

    pub fn phenomenon(mut self, name: &str, params: Value) -> Self {
        self.request.phenomenons.push(Selector::new(name, params));
        self
    }

    pub fn build(self) -> RenderRequest {
        self.request
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
