//! Reading authored documents from disk.
pub mod json;
pub mod tileset;
pub mod tmx;
pub mod xml;

use std::path::Path;

use log::info;

use crate::config::CompilerConfig;
use crate::error::{LevelError, Result};
use crate::model::{AtlasInfo, Gid, LevelDocument};

/// A parsed map together with its resolved atlases, in document order.
#[derive(Debug, Clone)]
pub struct LoadedMap {
    pub document: LevelDocument<Gid>,
    pub atlases: Vec<AtlasInfo>,
}

/// Read a `.tmx` file and every `.tsx` it references.
///
/// Descriptor paths are resolved relative to the map's own directory.
pub fn load_tmx(path: &Path, config: &CompilerConfig) -> Result<LoadedMap> {
    let text = std::fs::read_to_string(path).map_err(|e| LevelError::io(path, e))?;
    info!("File loaded, size: {} bytes", text.len());

    let document = tmx::parse_map(&text, path)?;
    let map_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let atlases = document
        .atlases
        .iter()
        .map(|reference| tileset::resolve(reference, map_dir, config))
        .collect::<Result<Vec<_>>>()?;

    Ok(LoadedMap { document, atlases })
}

/// Read a legacy `.json` level.
pub fn load_json(path: &Path) -> Result<json::LegacyLevel> {
    let text = std::fs::read_to_string(path).map_err(|e| LevelError::io(path, e))?;
    info!("File loaded, size: {} bytes", text.len());
    json::load_from_json(&text, path)
}
