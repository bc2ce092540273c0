//! Solidity table addressed by VRAM slot.

use log::debug;

use crate::config::CompilerConfig;
use crate::model::{CollisionBitmap, Slot, TileId};
use crate::processor::compact::Compacted;

/// Mark the slot of every solid canonical tile the level actually uses.
///
/// Each solid range is looked up in the ascending slot table; members the
/// level never placed have no slot and are skipped. The empty tile is
/// never solid.
pub fn build(compacted: &Compacted, config: &CompilerConfig) -> CollisionBitmap {
    let ids = &compacted.unique_tile_ids;
    let mut bitmap = CollisionBitmap::default();
    let mut solid = 0usize;
    for &(start, end) in &config.solid {
        // tile 0 is skipped even when a range covers it
        let start = TileId(start.max(1));
        let first = ids.partition_point(|&id| id < start);
        let last = ids.partition_point(|&id| id < TileId(end));
        for slot in first..last {
            let slot = Slot(slot as u16);
            if !bitmap.is_solid(slot) {
                bitmap.set(slot);
                solid += 1;
            }
        }
    }
    debug!(
        "collision: {solid} of {} slots solid",
        compacted.unique_tile_ids.len()
    );
    bitmap
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compacted(ids: &[u32]) -> Compacted {
        Compacted {
            unique_tile_ids: ids.iter().copied().map(TileId).collect(),
            palette_banks: vec![0; ids.len()],
            layers: Vec::new(),
        }
    }

    #[test]
    fn bits_follow_slots_not_canonical_ids() {
        let bitmap = build(&compacted(&[1, 3]), &CompilerConfig::default());
        assert_eq!(bitmap.words[0], 0b11);
        assert!(bitmap.words[1..].iter().all(|&w| w == 0));
    }

    #[test]
    fn non_solid_and_absent_tiles_stay_clear() {
        // 0 → slot 0, 54 → slot 1, 300 → slot 2
        let bitmap = build(&compacted(&[0, 54, 300]), &CompilerConfig::default());
        assert!(!bitmap.is_solid(Slot(0)));
        assert!(bitmap.is_solid(Slot(1)));
        assert!(!bitmap.is_solid(Slot(2)));
        assert_eq!(bitmap.words[0], 0b010);
    }

    #[test]
    fn empty_tile_is_never_solid_even_when_configured() {
        let config = CompilerConfig::default().with_solid(vec![0..4]);
        let bitmap = build(&compacted(&[0, 2]), &config);
        assert!(!bitmap.is_solid(Slot(0)));
        assert!(bitmap.is_solid(Slot(1)));
    }

    #[test]
    fn overlapping_ranges_mark_each_slot_once() {
        let config = CompilerConfig::default().with_solid(vec![1..10, 5..20]);
        let bitmap = build(&compacted(&[2, 7, 15, 30]), &config);
        assert_eq!(bitmap.words[0], 0b0111);
    }

    #[test]
    fn huge_solid_range_is_not_walked_id_by_id() {
        let config = CompilerConfig::default().with_solid(vec![1..u32::MAX]);
        let bitmap = build(&compacted(&[0, 9, 65535]), &config);
        assert_eq!(bitmap.words[0], 0b110);
    }

    #[test]
    fn high_slots_land_in_later_words() {
        let ids: Vec<u32> = (1..=40).collect();
        let config = CompilerConfig::default().with_solid(vec![33..35]);
        let bitmap = build(&compacted(&ids), &config);
        // ids 33, 34 sit at slots 32, 33
        assert_eq!(bitmap.words[0], 0);
        assert_eq!(bitmap.words[1], 0b11);
    }
}
