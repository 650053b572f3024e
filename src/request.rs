// src/request.rs

//! Render request handed to the driver by its callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A `{name, params}` pair picking a method, camera, or phenomenon plugin.
///
/// `params` is interpreted by the plugin itself; the driver passes it through
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selector {
    pub name: String,
    #[serde(default)]
    pub params: Value,
}

impl Selector {
    pub fn new(name: impl Into<String>, params: Value) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Selector without parameters.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, Value::Null)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Everything the generation stage needs to build one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Path to the Minecraft world save.
    pub world: String,
    /// Player whose position anchors the camera.
    pub player: String,
    /// Samples per pixel.
    pub sample: u32,
    /// Chunk search radius around the player.
    pub radius: u32,
    #[serde(default)]
    pub resolution: Option<Resolution>,
    pub method: Selector,
    pub camera: Selector,
    #[serde(default)]
    pub phenomenons: Vec<Selector>,
}
