// src/serializer.rs

//! Writes a [`RenderRequest`] as the JSON file the generation stage reads.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::errors::{DriverError, Result};
use crate::request::{RenderRequest, Selector};

/// On-disk layout read by `mc2pbrt --filename config.json`.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ConfigArtifact<'a> {
    world: &'a str,
    player: &'a str,
    sample: u32,
    radius: u32,
    resolution: ArtifactResolution,
    method: &'a Selector,
    camera: &'a Selector,
    phenomenons: &'a [Selector],
}

/// Zero width/height means "generator default".
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ArtifactResolution {
    width: u32,
    height: u32,
}

impl<'a> From<&'a RenderRequest> for ConfigArtifact<'a> {
    fn from(req: &'a RenderRequest) -> Self {
        let resolution = req
            .resolution
            .map(|r| ArtifactResolution {
                width: r.width,
                height: r.height,
            })
            .unwrap_or(ArtifactResolution {
                width: 0,
                height: 0,
            });

        Self {
            world: &req.world,
            player: &req.player,
            sample: req.sample,
            radius: req.radius,
            resolution,
            method: &req.method,
            camera: &req.camera,
            phenomenons: &req.phenomenons,
        }
    }
}

/// Serializes requests into a single, per-run overwritten artifact.
#[derive(Debug, Clone)]
pub struct ConfigSerializer {
    path: PathBuf,
}

impl ConfigSerializer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render the artifact text without touching the filesystem.
    pub fn render(request: &RenderRequest) -> Result<String> {
        serde_json::to_string_pretty(&ConfigArtifact::from(request))
            .map_err(|e| DriverError::Config(format!("encoding render config: {e}")))
    }

    /// Overwrite the artifact with `request`.
    pub fn write(&self, request: &RenderRequest) -> Result<()> {
        let text = Self::render(request)?;
        fs::write(&self.path, text).map_err(|e| {
            DriverError::Config(format!("writing {}: {e}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), "render config written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::request::Resolution;

    fn request() -> RenderRequest {
        RenderRequest {
            world: "/saves/World1".into(),
            player: "Steve".into(),
            sample: 16,
            radius: 8,
            resolution: None,
            method: Selector::new("PathTracing", json!({"depth": 5})),
            camera: Selector::named("Perspective"),
            phenomenons: vec![
                Selector::named("Sun"),
                Selector::new("Fog", json!({"density": 0.2})),
            ],
        }
    }

    #[test]
    fn artifact_uses_generator_field_names() {
        let text = ConfigSerializer::render(&request()).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed["World"], "/saves/World1");
        assert_eq!(parsed["Player"], "Steve");
        assert_eq!(parsed["Sample"], 16);
        assert_eq!(parsed["Radius"], 8);
        assert_eq!(parsed["Method"]["name"], "PathTracing");
        assert_eq!(parsed["Method"]["params"]["depth"], 5);
        assert_eq!(parsed["Camera"]["params"], Value::Null);
        assert_eq!(parsed["Phenomenons"][0]["name"], "Sun");
        assert_eq!(parsed["Phenomenons"][1]["params"]["density"], 0.2);
    }

    #[test]
    fn missing_resolution_is_written_as_zeros() {
        let text = ConfigSerializer::render(&request()).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["Resolution"], json!({"Width": 0, "Height": 0}));

        let mut req = request();
        req.resolution = Some(Resolution {
            width: 640,
            height: 480,
        });
        let parsed: Value =
            serde_json::from_str(&ConfigSerializer::render(&req).unwrap()).unwrap();
        assert_eq!(parsed["Resolution"], json!({"Width": 640, "Height": 480}));
    }

    #[test]
    fn phenomenon_order_is_preserved() {
        let text = ConfigSerializer::render(&request()).unwrap();
        assert!(text.find("\"Sun\"").unwrap() < text.find("\"Fog\"").unwrap());
    }

    #[test]
    fn write_overwrites_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let serializer = ConfigSerializer::new(dir.path().join("config.json"));
        fs::write(serializer.path(), "stale").unwrap();

        serializer.write(&request()).unwrap();

        let written = fs::read_to_string(serializer.path()).unwrap();
        assert!(written.starts_with('{'));
        assert!(written.contains("\"World\": \"/saves/World1\""));
    }

    #[test]
    fn write_failure_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let serializer = ConfigSerializer::new(dir.path().join("missing").join("config.json"));
        match serializer.write(&request()) {
            Err(DriverError::Config(msg)) => assert!(msg.contains("config.json")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }
}
