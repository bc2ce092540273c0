//! Per-level VRAM compaction: every distinct canonical tile used by the
//! level gets a dense slot, and grids are relabelled to those slots.

use std::collections::{BTreeSet, HashMap};

use log::info;

use crate::error::{LevelError, Result};
use crate::model::{
    AtlasInfo, COLLISION_CAPACITY, CompiledLayer, LayerRender, LevelDocument, Slot, TileId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compacted {
    /// Ascending; index == slot.
    pub unique_tile_ids: Vec<TileId>,
    /// Parallel to `unique_tile_ids`.
    pub palette_banks: Vec<u8>,
    pub layers: Vec<CompiledLayer>,
}

/// `renders` holds the validated placement of each layer, in document order.
pub fn compact(
    document: &LevelDocument<TileId>,
    atlases: &[AtlasInfo],
    renders: &[LayerRender],
) -> Result<Compacted> {
    // tile 0 takes a slot like any other tile when it is used
    let unique: BTreeSet<TileId> = document
        .layers
        .iter()
        .flat_map(|l| l.tiles.cells())
        .collect();
    if unique.len() > COLLISION_CAPACITY {
        return Err(LevelError::CapacityExceeded {
            count: unique.len(),
            capacity: COLLISION_CAPACITY,
        });
    }
    let unique_tile_ids: Vec<TileId> = unique.into_iter().collect();

    let slots: HashMap<TileId, Slot> = unique_tile_ids
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, Slot(i as u16)))
        .collect();

    let mut by_first_id: Vec<&AtlasInfo> = atlases.iter().collect();
    by_first_id.sort_by_key(|a| a.canonical_first_id);
    let palette_banks = unique_tile_ids
        .iter()
        .map(|&id| palette_bank(&by_first_id, id))
        .collect();

    let layers = document
        .layers
        .iter()
        .zip(renders)
        .map(|(layer, render)| CompiledLayer {
            name: layer.name.clone(),
            bg_layer: render.bg_layer,
            priority: render.priority,
            slots: layer.tiles.map(|id| slots[&id]),
        })
        .collect();

    info!(
        "Compacted {} layers into {} VRAM slots",
        document.layers.len(),
        unique_tile_ids.len()
    );

    Ok(Compacted {
        unique_tile_ids,
        palette_banks,
        layers,
    })
}

/// Bank of the atlas owning `id`; the empty tile and unowned ids use bank 0.
fn palette_bank(atlases: &[&AtlasInfo], id: TileId) -> u8 {
    if id == TileId::EMPTY {
        return 0;
    }
    atlases
        .iter()
        .find(|a| a.owns(id))
        .map_or(0, |a| a.palette_bank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Grid, RawLayer};

    fn atlas(name: &str, first: u32, count: u32, bank: u8) -> AtlasInfo {
        AtlasInfo {
            name: name.into(),
            tile_width: 8,
            tile_height: 8,
            tile_count: count,
            columns: 1,
            image_source: String::new(),
            declared_first_id: first,
            canonical_first_id: first,
            palette_bank: bank,
        }
    }

    fn compact(doc: &LevelDocument<TileId>, atlases: &[AtlasInfo]) -> Result<Compacted> {
        let renders = vec![LayerRender { bg_layer: 2, priority: 1 }; doc.layers.len()];
        super::compact(doc, atlases, &renders)
    }

    fn document(layers: Vec<Vec<Vec<u32>>>) -> LevelDocument<TileId> {
        LevelDocument {
            name: "t".into(),
            author: None,
            width: None,
            height: None,
            tile_width: 8,
            tile_height: 8,
            atlases: Vec::new(),
            layers: layers
                .into_iter()
                .enumerate()
                .map(|(i, rows)| RawLayer {
                    name: format!("L{i}"),
                    bg_layer: 2,
                    priority: 1,
                    tiles: Grid::new(
                        rows.into_iter()
                            .map(|r| r.into_iter().map(TileId).collect())
                            .collect(),
                    ),
                })
                .collect(),
            objects: Vec::new(),
            spawn: None,
            spawn_candidates: 0,
        }
    }

    #[test]
    fn dedups_across_layers_in_ascending_order() {
        let doc = document(vec![vec![vec![300, 1, 0]], vec![vec![1, 60, 300]]]);
        let atlases = [atlas("grassy_stone", 1, 55, 0), atlas("plants", 56, 160, 2), atlas("decals", 216, 1225, 3)];
        let out = compact(&doc, &atlases).expect("fits");

        assert_eq!(
            out.unique_tile_ids,
            vec![TileId(0), TileId(1), TileId(60), TileId(300)]
        );
        assert_eq!(out.palette_banks, vec![0, 0, 2, 3]);
        assert_eq!(out.layers[0].slots.rows, vec![vec![Slot(3), Slot(1), Slot(0)]]);
        assert_eq!(out.layers[1].slots.rows, vec![vec![Slot(1), Slot(2), Slot(3)]]);
        assert_eq!((out.layers[0].bg_layer, out.layers[0].priority), (2, 1));
    }

    #[test]
    fn slots_relabel_without_losing_the_canonical_tile() {
        let doc = document(vec![vec![vec![5, 9, 5], vec![2, 0, 9]]]);
        let out = compact(&doc, &[]).expect("fits");
        for (row_in, row_out) in doc.layers[0].tiles.rows.iter().zip(&out.layers[0].slots.rows) {
            for (id, slot) in row_in.iter().zip(row_out) {
                assert_eq!(out.unique_tile_ids[usize::from(slot.0)], *id);
            }
        }
        assert_eq!(out.unique_tile_ids.binary_search(&TileId(9)), Ok(3));
        assert!(out.unique_tile_ids.binary_search(&TileId(7)).is_err());
    }

    #[test]
    fn unowned_ids_use_bank_zero() {
        let doc = document(vec![vec![vec![2, 40]]]);
        let out = compact(&doc, &[atlas("x", 1, 10, 5)]).expect("fits");
        assert_eq!(out.palette_banks, vec![5, 0]);
    }

    #[test]
    fn more_than_2048_distinct_tiles_exceeds_capacity() {
        let row: Vec<u32> = (1..=2049).collect();
        let err = compact(&document(vec![vec![row]]), &[]).unwrap_err();
        assert!(matches!(
            err,
            LevelError::CapacityExceeded { count: 2049, capacity: 2048 }
        ));
    }

    #[test]
    fn exactly_2048_distinct_tiles_fit() {
        let row: Vec<u32> = (1..=2048).collect();
        let out = compact(&document(vec![vec![row]]), &[]).expect("fits");
        assert_eq!(out.unique_tile_ids.len(), 2048);
        assert_eq!(out.layers[0].slots.rows[0][2047], Slot(2047));
    }
}
