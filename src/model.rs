// numeric limits of the target runtime
pub const MAX_MAP_DIM: u32 = 256;
pub const MAX_OBJECTS: usize = 256;
pub const MAX_TILE_ID: u32 = 65535;
/// Object and spawn positions are stored as u16 in the runtime record.
pub const MAX_OBJECT_COORD: i32 = 65535;
/// Pixel width/height of a map; every in-map pixel must fit a u16.
pub const MAX_PIXEL_EXTENT: u64 = 65536;

/// Soft VRAM budget; exceeding it only produces a warning.
pub const VRAM_TILE_BUDGET: usize = 1000;

pub const COLLISION_WORDS: usize = 64;
pub const COLLISION_CAPACITY: usize = COLLISION_WORDS * 32; // 2048

/// Hardware background layers / priority levels are both 0‥3.
pub const MAX_BG_LAYER: u8 = 3;
pub const MAX_PRIORITY: u8 = 3;

pub const DEFAULT_TILE_SIZE: u32 = 8;
pub const DEFAULT_LEVEL_NAME: &str = "Untitled";
pub const SPAWN_TYPE: &str = "PlayerSpawn";

use std::collections::BTreeMap;

/// ─────────────────────────────────────────────────────
/// Cell numberings
/// ─────────────────────────────────────────────────────

/// Tile id as numbered inside one authored document. Wider than the
/// canonical id so that any decoded cell can be held and later degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Gid(pub u64);

/// Runtime tile id, stable across every level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileId(pub u32);

impl TileId {
    pub const EMPTY: TileId = TileId(0);
}

/// Dense per-level index into `CompiledLevel::unique_tile_ids`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot(pub u16);

/// Row-major 2-D grid. Rows are kept as decoded so that misshapen layers
/// can still be reported by the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    pub rows: Vec<Vec<T>>,
}

impl<T: Copy> Grid<T> {
    pub fn new(rows: Vec<Vec<T>>) -> Self {
        Grid { rows }
    }

    /// Split a flat row-major sequence into rows of `width` cells.
    /// A trailing short row is kept as-is.
    pub fn from_flat(cells: Vec<T>, width: usize) -> Self {
        if width == 0 {
            let rows = if cells.is_empty() { Vec::new() } else { vec![cells] };
            return Grid { rows };
        }
        Grid {
            rows: cells.chunks(width).map(<[T]>::to_vec).collect(),
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = T> + '_ {
        self.rows.iter().flatten().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Relabel every cell, keeping the shape.
    pub fn map<U>(&self, mut f: impl FnMut(T) -> U) -> Grid<U> {
        Grid {
            rows: self
                .rows
                .iter()
                .map(|row| row.iter().map(|&c| f(c)).collect())
                .collect(),
        }
    }
}

/// ─────────────────────────────────────────────────────
/// Atlases
/// ─────────────────────────────────────────────────────

/// One `<tileset>` entry of the authored map, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasReference {
    pub declared_first_id: u32,
    pub descriptor_path: String,
}

/// An atlas after its descriptor was read and its canonical id assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasInfo {
    pub name: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tile_count: u32,
    pub columns: u32,
    pub image_source: String,
    pub declared_first_id: u32,
    pub canonical_first_id: u32,
    pub palette_bank: u8,
}

impl AtlasInfo {
    /// Whether `id` lies in `[canonical_first_id, canonical_first_id + tile_count)`.
    pub fn owns(&self, id: TileId) -> bool {
        id.0 >= self.canonical_first_id
            && u64::from(id.0) < u64::from(self.canonical_first_id) + u64::from(self.tile_count)
    }

    pub fn canonical_end(&self) -> u64 {
        u64::from(self.canonical_first_id) + u64::from(self.tile_count)
    }
}

/// ─────────────────────────────────────────────────────
/// Authored level
/// ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// A tile layer, generic over the numbering its cells currently hold.
/// Render metadata is kept as authored; the validator range-checks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLayer<T> {
    pub name: String,
    pub bg_layer: i64,
    pub priority: i64,
    pub tiles: Grid<T>,
}

/// Checked hardware placement of one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerRender {
    pub bg_layer: u8,
    pub priority: u8,
}

/// A placed entity exactly as found in the document.
/// Type and position are optional here; the validator rejects gaps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawObject {
    pub kind: Option<String>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub properties: BTreeMap<String, String>,
}

/// A validated placed entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntity {
    pub kind: String,
    pub x: i32,
    pub y: i32,
    pub properties: BTreeMap<String, String>,
}

/// Entire level as it comes out of the document parser (cells = `Gid`)
/// or out of the remapper (cells = `TileId`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelDocument<T> {
    pub name: String,
    pub author: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub tile_width: u32,
    pub tile_height: u32,
    pub atlases: Vec<AtlasReference>,
    pub layers: Vec<RawLayer<T>>,
    pub objects: Vec<RawObject>,
    pub spawn: Option<Point>,
    /// Number of spawn entities seen; only the last one is kept.
    pub spawn_candidates: usize,
}

impl<T: Copy> LevelDocument<T> {
    /// Rebuild the document with every layer grid relabelled by `f`.
    pub fn map_layers<U>(self, mut f: impl FnMut(&RawLayer<T>) -> Grid<U>) -> LevelDocument<U> {
        let layers = self
            .layers
            .iter()
            .map(|layer| RawLayer {
                name: layer.name.clone(),
                bg_layer: layer.bg_layer,
                priority: layer.priority,
                tiles: f(layer),
            })
            .collect();
        LevelDocument {
            name: self.name,
            author: self.author,
            width: self.width,
            height: self.height,
            tile_width: self.tile_width,
            tile_height: self.tile_height,
            atlases: self.atlases,
            layers,
            objects: self.objects,
            spawn: self.spawn,
            spawn_candidates: self.spawn_candidates,
        }
    }
}

/// Map geometry and entities that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelGeometry {
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub spawn: Point,
    pub objects: Vec<ObjectEntity>,
    /// One entry per layer, in document order.
    pub layers: Vec<LayerRender>,
}

/// ─────────────────────────────────────────────────────
/// Compiled level (handed to `writer`)
/// ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledLayer {
    pub name: String,
    pub bg_layer: u8,
    pub priority: u8,
    pub slots: Grid<Slot>,
}

/// Fixed 2048-bit solidity table addressed by VRAM slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionBitmap {
    pub words: [u32; COLLISION_WORDS],
}

impl Default for CollisionBitmap {
    fn default() -> Self {
        CollisionBitmap {
            words: [0; COLLISION_WORDS],
        }
    }
}

impl CollisionBitmap {
    /// Slot `s` lives at word `s / 32`, bit `s % 32`.
    pub fn set(&mut self, slot: Slot) {
        let s = usize::from(slot.0);
        self.words[s / 32] |= 1 << (s % 32);
    }

    pub fn is_solid(&self, slot: Slot) -> bool {
        let s = usize::from(slot.0);
        s < COLLISION_CAPACITY && self.words[s / 32] & (1 << (s % 32)) != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledLevel {
    pub name: String,
    pub author: Option<String>,
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    /// Sorted by canonical first id.
    pub atlases: Vec<AtlasInfo>,
    pub layers: Vec<CompiledLayer>,
    pub objects: Vec<ObjectEntity>,
    pub spawn: Point,
    /// Ascending, deduplicated canonical ids; index == VRAM slot.
    pub unique_tile_ids: Vec<TileId>,
    /// Parallel to `unique_tile_ids`.
    pub tile_palette_banks: Vec<u8>,
    pub collision: CollisionBitmap,
    /// Non-fatal findings, also logged when produced.
    pub warnings: Vec<String>,
}
