//! Structural and numeric checks over a remapped level.
//!
//! Every problem is collected before reporting so a designer can fix them
//! all in one pass. Only the VRAM budget check is a warning.

use std::collections::BTreeSet;
use std::path::Path;

use log::warn;

use crate::error::{LevelError, Result, Violation};
use crate::model::{
    AtlasInfo, LayerRender, LevelDocument, LevelGeometry, MAX_BG_LAYER, MAX_MAP_DIM,
    MAX_OBJECT_COORD, MAX_OBJECTS, MAX_PIXEL_EXTENT, MAX_PRIORITY, MAX_TILE_ID, ObjectEntity,
    TileId, VRAM_TILE_BUDGET,
};

/// Geometry that passed every check, plus non-fatal findings.
#[derive(Debug, Clone)]
pub struct Validated {
    pub geometry: LevelGeometry,
    pub warnings: Vec<String>,
}

pub fn validate(
    document: &LevelDocument<TileId>,
    atlases: &[AtlasInfo],
    path: &Path,
) -> Result<Validated> {
    let mut errors = Vec::new();

    // ── required fields ─────────────────────────────────────────────
    if document.width.is_none() {
        errors.push(Violation::schema("Missing required field: width"));
    }
    if document.height.is_none() {
        errors.push(Violation::schema("Missing required field: height"));
    }
    if document.layers.is_empty() {
        errors.push(Violation::schema("Missing required field: tiles (no tile layer)"));
    }
    if document.spawn.is_none() {
        errors.push(Violation::schema(if document.spawn_candidates > 0 {
            "playerSpawn must have x and y coordinates"
        } else {
            "Missing required field: playerSpawn"
        }));
    }

    // ── dimensions ──────────────────────────────────────────────────
    let width = document.width.filter(|&w| check_dim("width", w, &mut errors));
    let height = document.height.filter(|&h| check_dim("height", h, &mut errors));
    if document.tile_width == 0 || document.tile_height == 0 {
        errors.push(Violation::range(format!(
            "Invalid tile size: {}x{} (must be non-zero)",
            document.tile_width, document.tile_height
        )));
    }
    if let Some(w) = width {
        check_extent("width", w, document.tile_width, &mut errors);
    }
    if let Some(h) = height {
        check_extent("height", h, document.tile_height, &mut errors);
    }

    // ── layers ──────────────────────────────────────────────────────
    let mut renders = Vec::with_capacity(document.layers.len());
    for layer in &document.layers {
        if let (Some(w), Some(h)) = (width, height) {
            let rows = layer.tiles.rows.len();
            if rows != h as usize {
                errors.push(Violation::schema(format!(
                    "Layer '{}' has {rows} rows, expected {h}",
                    layer.name
                )));
            }
            for (i, row) in layer.tiles.rows.iter().enumerate() {
                if row.len() != w as usize {
                    errors.push(Violation::schema(format!(
                        "Layer '{}' row {i} has {} columns, expected {w}",
                        layer.name,
                        row.len()
                    )));
                }
            }
        }
        for (i, row) in layer.tiles.rows.iter().enumerate() {
            for (j, tile) in row.iter().enumerate() {
                if tile.0 > MAX_TILE_ID {
                    errors.push(Violation::range(format!(
                        "Invalid tile ID in layer '{}' at ({i},{j}): {} (max {MAX_TILE_ID})",
                        layer.name, tile.0
                    )));
                }
            }
        }
        let bg_layer =
            check_render(&layer.name, "bgLayer", layer.bg_layer, MAX_BG_LAYER, &mut errors);
        let priority =
            check_render(&layer.name, "priority", layer.priority, MAX_PRIORITY, &mut errors);
        if let (Some(bg_layer), Some(priority)) = (bg_layer, priority) {
            renders.push(LayerRender { bg_layer, priority });
        }
    }

    // ── atlases ─────────────────────────────────────────────────────
    check_atlases(atlases, &mut errors);

    // ── spawn point ─────────────────────────────────────────────────
    if let (Some(spawn), Some(w), Some(h)) = (document.spawn, width, height) {
        let width_px = i64::from(w) * i64::from(document.tile_width);
        let height_px = i64::from(h) * i64::from(document.tile_height);
        check_spawn_axis("x", spawn.x, width_px, &mut errors);
        check_spawn_axis("y", spawn.y, height_px, &mut errors);
    }

    // ── objects ─────────────────────────────────────────────────────
    let objects = check_objects(document, &mut errors);

    let (Some(width), Some(height), Some(spawn)) = (width, height, document.spawn) else {
        // a missing or out-of-range field always left a violation behind
        return Err(LevelError::Validation {
            path: path.to_path_buf(),
            violations: errors,
        });
    };
    if !errors.is_empty() {
        return Err(LevelError::Validation {
            path: path.to_path_buf(),
            violations: errors,
        });
    }

    // ── VRAM budget (warning only) ──────────────────────────────────
    let mut warnings = Vec::new();
    let distinct: BTreeSet<TileId> = document
        .layers
        .iter()
        .flat_map(|l| l.tiles.cells())
        .filter(|&id| id != TileId::EMPTY)
        .collect();
    if distinct.len() > VRAM_TILE_BUDGET {
        let message = format!(
            "level uses {} distinct tiles, more than the VRAM budget of {VRAM_TILE_BUDGET}",
            distinct.len()
        );
        warn!("{message}");
        warnings.push(message);
    }

    Ok(Validated {
        geometry: LevelGeometry {
            width,
            height,
            tile_width: document.tile_width,
            tile_height: document.tile_height,
            spawn,
            objects,
            layers: renders,
        },
        warnings,
    })
}

fn check_dim(field: &str, value: u32, errors: &mut Vec<Violation>) -> bool {
    let ok = (1..=MAX_MAP_DIM).contains(&value);
    if !ok {
        errors.push(Violation::range(format!(
            "Invalid {field}: {value} (must be 1-{MAX_MAP_DIM})"
        )));
    }
    ok
}

/// The map's pixel size along one axis must stay addressable by u16.
fn check_extent(field: &str, tiles: u32, tile_size: u32, errors: &mut Vec<Violation>) {
    let pixels = u64::from(tiles) * u64::from(tile_size);
    if pixels > MAX_PIXEL_EXTENT {
        errors.push(Violation::range(format!(
            "Map pixel {field} {pixels} ({tiles} tiles of {tile_size}px) exceeds {MAX_PIXEL_EXTENT}"
        )));
    }
}

fn check_render(
    layer: &str,
    key: &str,
    value: i64,
    max: u8,
    errors: &mut Vec<Violation>,
) -> Option<u8> {
    match u8::try_from(value) {
        Ok(v) if v <= max => Some(v),
        _ => {
            errors.push(Violation::range(format!(
                "Layer '{layer}' {key} {value} out of range (0-{max})"
            )));
            None
        }
    }
}

/// Bounded by the map's pixel size and by the u16 spawn fields.
fn check_spawn_axis(axis: &str, value: i32, limit: i64, errors: &mut Vec<Violation>) {
    let limit = limit.min(i64::from(MAX_OBJECT_COORD) + 1);
    if value < 0 || i64::from(value) >= limit {
        errors.push(Violation::range(format!(
            "playerSpawn.{axis} ({value}) out of bounds (0-{})",
            limit - 1
        )));
    }
}

/// Canonical ranges must be disjoint and addressable as 16-bit ids.
fn check_atlases(atlases: &[AtlasInfo], errors: &mut Vec<Violation>) {
    let mut sorted: Vec<&AtlasInfo> = atlases.iter().collect();
    sorted.sort_by_key(|a| a.canonical_first_id);

    for (i, a) in sorted.iter().enumerate() {
        if a.canonical_end() > u64::from(MAX_TILE_ID) + 1 {
            errors.push(Violation::range(format!(
                "Atlas '{}' range [{}, {}) exceeds tile id {MAX_TILE_ID}",
                a.name,
                a.canonical_first_id,
                a.canonical_end()
            )));
        }
        for b in &sorted[i + 1..] {
            if u64::from(b.canonical_first_id) >= a.canonical_end() {
                break;
            }
            errors.push(Violation::range(format!(
                "Atlas '{}' [{}, {}) overlaps atlas '{}' [{}, {})",
                a.name,
                a.canonical_first_id,
                a.canonical_end(),
                b.name,
                b.canonical_first_id,
                b.canonical_end()
            )));
        }
    }
}

fn check_objects(
    document: &LevelDocument<TileId>,
    errors: &mut Vec<Violation>,
) -> Vec<ObjectEntity> {
    if document.objects.len() > MAX_OBJECTS {
        errors.push(Violation::range(format!(
            "Too many objects: {} (max {MAX_OBJECTS})",
            document.objects.len()
        )));
    }

    let mut objects = Vec::with_capacity(document.objects.len());
    for (i, object) in document.objects.iter().enumerate() {
        if object.kind.is_none() {
            errors.push(Violation::schema(format!("Object {i} missing 'type' field")));
        }
        if object.x.is_none() || object.y.is_none() {
            errors.push(Violation::schema(format!("Object {i} missing position fields")));
        }
        if let (Some(x), Some(y)) = (object.x, object.y) {
            if !(0..=MAX_OBJECT_COORD).contains(&x) || !(0..=MAX_OBJECT_COORD).contains(&y) {
                errors.push(Violation::range(format!(
                    "Object {i} position ({x}, {y}) out of range (0-{MAX_OBJECT_COORD})"
                )));
            }
        }
        if let (Some(kind), Some(x), Some(y)) = (&object.kind, object.x, object.y) {
            objects.push(ObjectEntity {
                kind: kind.clone(),
                x,
                y,
                properties: object.properties.clone(),
            });
        }
    }
    objects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViolationKind;
    use crate::model::{Grid, Point, RawLayer, RawObject};

    fn level(width: u32, height: u32, tiles: Vec<Vec<u32>>) -> LevelDocument<TileId> {
        LevelDocument {
            name: "t".into(),
            author: None,
            width: Some(width),
            height: Some(height),
            tile_width: 8,
            tile_height: 8,
            atlases: Vec::new(),
            layers: vec![RawLayer {
                name: "Ground".into(),
                bg_layer: 2,
                priority: 1,
                tiles: Grid::new(
                    tiles
                        .into_iter()
                        .map(|r| r.into_iter().map(TileId).collect())
                        .collect(),
                ),
            }],
            objects: Vec::new(),
            spawn: Some(Point { x: 12, y: 20 }),
            spawn_candidates: 1,
        }
    }

    fn atlas(name: &str, first: u32, count: u32) -> AtlasInfo {
        AtlasInfo {
            name: name.into(),
            tile_width: 8,
            tile_height: 8,
            tile_count: count,
            columns: 1,
            image_source: String::new(),
            declared_first_id: first,
            canonical_first_id: first,
            palette_bank: 0,
        }
    }

    fn violations(document: &LevelDocument<TileId>, atlases: &[AtlasInfo]) -> Vec<Violation> {
        match validate(document, atlases, Path::new("t.tmx")) {
            Ok(_) => Vec::new(),
            Err(err) => err.violations().to_vec(),
        }
    }

    #[test]
    fn spawn_inside_pixel_bounds_passes() {
        let doc = level(4, 4, vec![vec![0; 4]; 4]);
        let ok = validate(&doc, &[], Path::new("t.tmx")).expect("valid");
        assert_eq!(ok.geometry.spawn, Point { x: 12, y: 20 });
        assert!(ok.warnings.is_empty());
    }

    #[test]
    fn spawn_outside_pixel_bounds_is_range_violation() {
        let mut doc = level(4, 4, vec![vec![0; 4]; 4]);
        doc.spawn = Some(Point { x: 40, y: 20 });
        let v = violations(&doc, &[]);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].kind, ViolationKind::Range);
        assert!(v[0].message.contains("playerSpawn.x"), "got {}", v[0]);
    }

    #[test]
    fn collects_every_violation_in_one_pass() {
        let mut doc = level(3, 2, vec![vec![0, 0, 70000], vec![0, 0]]);
        doc.layers[0].priority = 7;
        doc.spawn = Some(Point { x: -1, y: 99 });
        doc.objects.push(RawObject::default());

        let v = violations(&doc, &[]);
        let messages: Vec<_> = v.iter().map(|v| v.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("row 1 has 2 columns")), "{messages:?}");
        assert!(messages.iter().any(|m| m.contains("70000")), "{messages:?}");
        assert!(messages.iter().any(|m| m.contains("priority 7")), "{messages:?}");
        assert!(messages.iter().any(|m| m.contains("playerSpawn.x (-1)")), "{messages:?}");
        assert!(messages.iter().any(|m| m.contains("playerSpawn.y (99)")), "{messages:?}");
        assert!(messages.iter().any(|m| m.contains("Object 0 missing 'type'")), "{messages:?}");
        assert!(messages.iter().any(|m| m.contains("Object 0 missing position")), "{messages:?}");
        assert_eq!(v.len(), 7);
    }

    #[test]
    fn object_positions_must_fit_the_runtime_record() {
        let mut doc = level(1, 1, vec![vec![0]]);
        doc.spawn = Some(Point { x: 0, y: 0 });
        doc.objects.push(RawObject {
            kind: Some("Coin".into()),
            x: Some(-4),
            y: Some(2),
            ..RawObject::default()
        });
        let v = violations(&doc, &[]);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].message, "Object 0 position (-4, 2) out of range (0-65535)");
    }

    #[test]
    fn missing_fields_are_schema_violations() {
        let mut doc = level(1, 1, vec![vec![0]]);
        doc.width = None;
        doc.spawn = None;
        doc.spawn_candidates = 0;
        let v = violations(&doc, &[]);
        assert!(v.iter().all(|v| v.kind == ViolationKind::Schema));
        assert!(v.iter().any(|v| v.message == "Missing required field: width"));
        assert!(v.iter().any(|v| v.message == "Missing required field: playerSpawn"));
    }

    #[test]
    fn dimensions_must_be_in_range() {
        let doc = level(0, 300, vec![]);
        let v = violations(&doc, &[]);
        assert!(v.iter().any(|v| v.message == "Invalid width: 0 (must be 1-256)"));
        assert!(v.iter().any(|v| v.message == "Invalid height: 300 (must be 1-256)"));
    }

    #[test]
    fn overlapping_atlases_are_reported() {
        let mut doc = level(1, 1, vec![vec![0]]);
        doc.spawn = Some(Point { x: 0, y: 0 });
        let v = violations(&doc, &[atlas("a", 1, 10), atlas("b", 5, 10), atlas("c", 15, 1)]);
        assert_eq!(v.len(), 1);
        assert!(v[0].message.contains("'a'") && v[0].message.contains("'b'"));
    }

    #[test]
    fn too_many_objects_is_range_violation() {
        let mut doc = level(1, 1, vec![vec![0]]);
        doc.spawn = Some(Point { x: 0, y: 0 });
        doc.objects = vec![
            RawObject {
                kind: Some("Coin".into()),
                x: Some(0),
                y: Some(0),
                ..RawObject::default()
            };
            257
        ];
        let v = violations(&doc, &[]);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].message, "Too many objects: 257 (max 256)");
    }

    #[test]
    fn pixel_size_must_fit_the_runtime() {
        let mut doc = level(256, 1, vec![vec![0; 256]]);
        doc.tile_width = 20_000_000;
        doc.spawn = Some(Point { x: 0, y: 0 });
        let v = violations(&doc, &[]);
        assert_eq!(v.len(), 1, "{v:?}");
        assert_eq!(v[0].kind, ViolationKind::Range);
        assert!(v[0].message.starts_with("Map pixel width 5120000000"), "got {}", v[0]);
    }

    #[test]
    fn spawn_must_fit_the_u16_record() {
        let mut doc = level(256, 1, vec![vec![0; 256]]);
        doc.tile_width = 512;
        doc.spawn = Some(Point { x: 70000, y: 0 });
        let v = violations(&doc, &[]);
        let messages: Vec<_> = v.iter().map(|v| v.message.as_str()).collect();
        assert_eq!(messages.len(), 2, "{messages:?}");
        assert!(messages.iter().any(|m| m.starts_with("Map pixel width 131072")));
        assert!(messages.contains(&"playerSpawn.x (70000) out of bounds (0-65535)"));

        doc.tile_width = 256;
        doc.spawn = Some(Point { x: 65535, y: 0 });
        assert!(violations(&doc, &[]).is_empty());
    }

    #[test]
    fn render_metadata_out_of_range_is_collected_with_the_rest() {
        let mut doc = level(4, 4, vec![vec![0; 4]; 4]);
        doc.layers[0].bg_layer = 300;
        doc.layers[0].priority = -1;
        doc.spawn = Some(Point { x: -5, y: 0 });
        let v = violations(&doc, &[]);
        let messages: Vec<_> = v.iter().map(|v| v.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Layer 'Ground' bgLayer 300 out of range (0-3)",
                "Layer 'Ground' priority -1 out of range (0-3)",
                "playerSpawn.x (-5) out of bounds (0-31)",
            ]
        );
    }

    #[test]
    fn checked_render_metadata_is_handed_on() {
        let mut doc = level(4, 4, vec![vec![0; 4]; 4]);
        doc.layers[0].bg_layer = 3;
        doc.layers[0].priority = 0;
        let ok = validate(&doc, &[], Path::new("t.tmx")).expect("valid");
        assert_eq!(ok.geometry.layers, vec![LayerRender { bg_layer: 3, priority: 0 }]);
    }

    #[test]
    fn vram_budget_is_only_a_warning() {
        let row: Vec<u32> = (1..=256).collect();
        let tiles: Vec<Vec<u32>> = (0..4).map(|r| row.iter().map(|t| t + r * 256).collect()).collect();
        let doc = level(256, 4, tiles);
        let ok = validate(&doc, &[], Path::new("t.tmx")).expect("warnings never abort");
        assert_eq!(ok.warnings.len(), 1);
        assert!(ok.warnings[0].contains("1024 distinct tiles"));
    }
}
