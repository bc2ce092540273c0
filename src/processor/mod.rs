//! The functional core: pure passes from a parsed map to a compiled level.
//!
//! Stages run strictly in order: remap, validate, compact, collision.
pub mod collision;
pub mod compact;
pub mod legacy;
pub mod remap;
pub mod validate;

use std::path::Path;

use log::info;

use crate::config::CompilerConfig;
use crate::error::Result;
use crate::model::CompiledLevel;
use crate::parser::LoadedMap;

/// Runs every processing pass and returns a read-only structure for writers.
///
/// `path` is only used to label errors.
pub fn compile(loaded: LoadedMap, config: &CompilerConfig, path: &Path) -> Result<CompiledLevel> {
    let LoadedMap { document, atlases } = loaded;
    let mut warnings = Vec::new();

    let gid_map = remap::GidMap::new(&atlases);
    let document = remap::remap_document(document, &gid_map, &mut warnings);

    let validated = validate::validate(&document, &atlases, path)?;
    warnings.extend(validated.warnings);

    let compacted = compact::compact(&document, &atlases, &validated.geometry.layers)?;
    let collision = collision::build(&compacted, config);

    let geometry = validated.geometry;
    let mut sorted_atlases = atlases;
    sorted_atlases.sort_by_key(|a| a.canonical_first_id);
    info!(
        "Compiled '{}': {}x{} tiles, {} layers, {} unique tiles, {} objects",
        document.name,
        geometry.width,
        geometry.height,
        compacted.layers.len(),
        compacted.unique_tile_ids.len(),
        geometry.objects.len()
    );

    Ok(CompiledLevel {
        name: document.name,
        author: document.author,
        width: geometry.width,
        height: geometry.height,
        tile_width: geometry.tile_width,
        tile_height: geometry.tile_height,
        atlases: sorted_atlases,
        layers: compacted.layers,
        objects: geometry.objects,
        spawn: geometry.spawn,
        unique_tile_ids: compacted.unique_tile_ids,
        tile_palette_banks: compacted.palette_banks,
        collision,
        warnings,
    })
}
