//! Loader for the older single-atlas JSON level format.
//!
//! Fields are kept optional and loosely typed so the legacy validator can
//! report every gap in one pass instead of failing on the first.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{LevelError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyLevel {
    pub name: Option<String>,
    pub author: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub tile_width: Option<i64>,
    pub tile_height: Option<i64>,
    pub tiles: Option<Vec<Vec<i64>>>,
    pub player_spawn: Option<LegacySpawn>,
    pub objects: Option<Vec<LegacyObject>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacySpawn {
    pub x: Option<i64>,
    pub y: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyObject {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub x: Option<i64>,
    pub y: Option<i64>,
    #[serde(default)]
    pub properties: serde_json::Map<String, Value>,
}

pub fn load_from_json(json: &str, path: &Path) -> Result<LegacyLevel> {
    serde_json::from_str(json).map_err(|e| LevelError::malformed(path, format!("invalid JSON: {e}")))
}
