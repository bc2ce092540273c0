//! Resolves `<tileset source="..">` references into atlas metadata and
//! assigns each atlas its canonical first id from the registry.

use std::path::Path;

use log::{debug, warn};

use crate::config::CompilerConfig;
use crate::error::{LevelError, Result};
use crate::model::{AtlasInfo, AtlasReference};
use crate::parser::xml;

/// Geometry read from an external `.tsx` descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub name: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tile_count: u32,
    pub columns: u32,
    pub image_source: String,
}

/// Read the descriptor behind `reference` (relative to `map_dir`) and
/// assign its canonical first id.
///
/// Resolution is per atlas; overlaps between atlases are reported by the
/// validator.
pub fn resolve(
    reference: &AtlasReference,
    map_dir: &Path,
    config: &CompilerConfig,
) -> Result<AtlasInfo> {
    let path = map_dir.join(&reference.descriptor_path);
    let text = std::fs::read_to_string(&path).map_err(|e| LevelError::Descriptor {
        path: path.clone(),
        reason: if e.kind() == std::io::ErrorKind::NotFound {
            "not found".to_string()
        } else {
            format!("cannot be read: {e}")
        },
    })?;
    let descriptor = parse_descriptor(&text, &path)?;
    Ok(assign(reference, descriptor, config))
}

pub fn parse_descriptor(text: &str, path: &Path) -> Result<Descriptor> {
    let malformed = |reason: String| LevelError::Descriptor {
        path: path.to_path_buf(),
        reason,
    };

    let root = xml::parse(text).map_err(|e| malformed(format!("malformed XML: {e}")))?;
    if root.name != "tileset" {
        return Err(malformed(format!(
            "root element is <{}>, expected <tileset>",
            root.name
        )));
    }

    let number = |key: &str| -> Result<u32> {
        let raw = root
            .attr(key)
            .ok_or_else(|| malformed(format!("missing `{key}` attribute")))?;
        raw.trim()
            .parse()
            .map_err(|_| malformed(format!("`{key}` = '{raw}' is not a non-negative integer")))
    };

    let name = root
        .attr("name")
        .ok_or_else(|| malformed("missing `name` attribute".to_string()))?
        .to_string();
    let tile_width = number("tilewidth")?;
    let tile_height = number("tileheight")?;
    let tile_count = number("tilecount")?;
    let columns = match root.attr("columns") {
        Some(_) => number("columns")?,
        None => 0,
    };
    let image_source = root
        .child("image")
        .and_then(|img| img.attr("source"))
        .ok_or_else(|| malformed("missing <image source=..>".to_string()))?
        .to_string();

    if tile_width == 0 || tile_height == 0 {
        return Err(malformed(format!(
            "tile size {tile_width}x{tile_height} must be non-zero"
        )));
    }

    Ok(Descriptor {
        name,
        tile_width,
        tile_height,
        tile_count,
        columns,
        image_source,
    })
}

/// Look the atlas up in the registry; unregistered atlases keep the id the
/// document declared and draw with palette bank 0.
pub fn assign(
    reference: &AtlasReference,
    descriptor: Descriptor,
    config: &CompilerConfig,
) -> AtlasInfo {
    let (canonical_first_id, palette_bank) = match config.atlas(&descriptor.name) {
        Some(entry) => (entry.first_id, entry.palette_bank),
        None => {
            warn!(
                "atlas '{}' is not in the canonical registry; keeping declared first id {} and palette bank 0",
                descriptor.name, reference.declared_first_id
            );
            (reference.declared_first_id, 0)
        }
    };

    debug!(
        "atlas '{}': gid {}.. -> canonical {}..{} (bank {})",
        descriptor.name,
        reference.declared_first_id,
        canonical_first_id,
        u64::from(canonical_first_id) + u64::from(descriptor.tile_count),
        palette_bank
    );

    AtlasInfo {
        name: descriptor.name,
        tile_width: descriptor.tile_width,
        tile_height: descriptor.tile_height,
        tile_count: descriptor.tile_count,
        columns: descriptor.columns,
        image_source: descriptor.image_source,
        declared_first_id: reference.declared_first_id,
        canonical_first_id,
        palette_bank,
    }
}
