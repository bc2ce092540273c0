//! Authored GID → canonical tile id.

use log::warn;

use crate::model::{AtlasInfo, Gid, LevelDocument, TileId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GidRange {
    declared_first: u32,
    canonical_first: u32,
    count: u32,
}

/// Total function from authored GIDs to canonical ids, built from the
/// resolved atlases. GID 0 (empty) always maps to canonical 0.
#[derive(Debug, Clone, Default)]
pub struct GidMap {
    ranges: Vec<GidRange>,
}

impl GidMap {
    pub fn new(atlases: &[AtlasInfo]) -> Self {
        GidMap {
            ranges: atlases
                .iter()
                .map(|a| GidRange {
                    declared_first: a.declared_first_id,
                    canonical_first: a.canonical_first_id,
                    count: a.tile_count,
                })
                .collect(),
        }
    }

    /// `None` when no atlas covers `gid`.
    pub fn lookup(&self, gid: Gid) -> Option<TileId> {
        if gid.0 == 0 {
            return Some(TileId::EMPTY);
        }
        // a later declaration shadows an earlier one
        self.ranges.iter().rev().find_map(|r| {
            let offset = gid.0.checked_sub(u64::from(r.declared_first))?;
            let offset = u32::try_from(offset).ok().filter(|&o| o < r.count)?;
            Some(TileId(r.canonical_first.saturating_add(offset)))
        })
    }

    /// Unknown GIDs degrade to the empty tile.
    pub fn apply(&self, gid: Gid) -> TileId {
        self.lookup(gid).unwrap_or(TileId::EMPTY)
    }
}

/// Rewrite every layer into canonical numbering.
pub fn remap_document(
    document: LevelDocument<Gid>,
    map: &GidMap,
    warnings: &mut Vec<String>,
) -> LevelDocument<TileId> {
    document.map_layers(|layer| {
        let mut unknown = 0usize;
        let grid = layer.tiles.map(|gid| match map.lookup(gid) {
            Some(id) => id,
            None => {
                unknown += 1;
                TileId::EMPTY
            }
        });
        if unknown > 0 {
            let message = format!(
                "layer '{}': {unknown} tile(s) reference no known atlas and were replaced by tile 0",
                layer.name
            );
            warn!("{message}");
            warnings.push(message);
        }
        grid
    })
}
