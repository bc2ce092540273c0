//! Checks for the older single-atlas JSON levels.
//!
//! These levels index one atlas directly with byte-sized tile ids and have
//! no collision table, so there is nothing to remap or compact.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use crate::error::{LevelError, Result, Violation};
use crate::model::{
    DEFAULT_TILE_SIZE, MAX_MAP_DIM, MAX_OBJECT_COORD, MAX_OBJECTS, ObjectEntity, Point,
};
use crate::parser::json::{LegacyLevel, LegacyObject};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyCompiled {
    pub name: String,
    pub author: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Row-major.
    pub tiles: Vec<u8>,
    pub objects: Vec<ObjectEntity>,
    pub spawn: Point,
}

pub fn validate(level: &LegacyLevel, path: &Path) -> Result<LegacyCompiled> {
    let fail = |violations: Vec<Violation>| LevelError::Validation {
        path: path.to_path_buf(),
        violations,
    };

    // Required fields; nothing else can be checked without them.
    let mut errors = Vec::new();
    let required = [
        ("name", level.name.is_some()),
        ("width", level.width.is_some()),
        ("height", level.height.is_some()),
        ("tiles", level.tiles.is_some()),
        ("playerSpawn", level.player_spawn.is_some()),
    ];
    for (field, present) in required {
        if !present {
            errors.push(Violation::schema(format!("Missing required field: {field}")));
        }
    }
    let (Some(name), Some(width), Some(height), Some(tiles), Some(spawn)) = (
        &level.name,
        level.width,
        level.height,
        &level.tiles,
        &level.player_spawn,
    ) else {
        return Err(fail(errors));
    };

    let max = i64::from(MAX_MAP_DIM);
    if width <= 0 || width > max {
        errors.push(Violation::range(format!("Invalid width: {width} (must be 1-{max})")));
    }
    if height <= 0 || height > max {
        errors.push(Violation::range(format!("Invalid height: {height} (must be 1-{max})")));
    }

    if tiles.len() as i64 != height {
        errors.push(Violation::schema(format!(
            "Tiles array has {} rows, expected {height}",
            tiles.len()
        )));
    }
    let mut flat = Vec::with_capacity(tiles.iter().map(Vec::len).sum());
    for (i, row) in tiles.iter().enumerate() {
        if row.len() as i64 != width {
            errors.push(Violation::schema(format!(
                "Row {i} has {} columns, expected {width}",
                row.len()
            )));
        }
        for (j, &tile) in row.iter().enumerate() {
            match u8::try_from(tile) {
                Ok(t) => flat.push(t),
                Err(_) => errors.push(Violation::range(format!(
                    "Invalid tile ID at ({i},{j}): {tile}"
                ))),
            }
        }
    }

    let spawn_point = match (spawn.x, spawn.y) {
        (Some(x), Some(y)) => {
            let tile_width = level.tile_width.unwrap_or(i64::from(DEFAULT_TILE_SIZE));
            let tile_height = level.tile_height.unwrap_or(i64::from(DEFAULT_TILE_SIZE));
            let sx = spawn_axis("x", x, width.saturating_mul(tile_width), &mut errors);
            let sy = spawn_axis("y", y, height.saturating_mul(tile_height), &mut errors);
            sx.zip(sy).map(|(x, y)| Point { x, y })
        }
        _ => {
            errors.push(Violation::schema("playerSpawn must have x and y coordinates"));
            None
        }
    };

    let objects = level
        .objects
        .as_deref()
        .map(|objects| check_objects(objects, &mut errors))
        .unwrap_or_default();

    match spawn_point {
        Some(spawn) if errors.is_empty() => Ok(LegacyCompiled {
            name: name.clone(),
            author: level.author.clone(),
            width: width as u32,
            height: height as u32,
            tiles: flat,
            objects,
            spawn,
        }),
        _ => Err(fail(errors)),
    }
}

fn spawn_axis(axis: &str, value: i64, limit: i64, errors: &mut Vec<Violation>) -> Option<i32> {
    // the spawn fields of the runtime record are u16
    let limit = limit.min(i64::from(MAX_OBJECT_COORD) + 1);
    let in_bounds = value >= 0 && value < limit;
    match i32::try_from(value) {
        Ok(v) if in_bounds => Some(v),
        _ => {
            errors.push(Violation::range(format!(
                "playerSpawn.{axis} ({value}) out of bounds (0-{})",
                limit - 1
            )));
            None
        }
    }
}

fn check_objects(objects: &[LegacyObject], errors: &mut Vec<Violation>) -> Vec<ObjectEntity> {
    if objects.len() > MAX_OBJECTS {
        errors.push(Violation::range(format!(
            "Too many objects: {} (max {MAX_OBJECTS})",
            objects.len()
        )));
        return Vec::new();
    }

    let mut checked = Vec::with_capacity(objects.len());
    for (i, obj) in objects.iter().enumerate() {
        if obj.kind.is_none() {
            errors.push(Violation::schema(format!("Object {i} missing 'type' field")));
        }
        let position = match (obj.x, obj.y) {
            (Some(x), Some(y)) => {
                let limit = i64::from(MAX_OBJECT_COORD);
                if (0..=limit).contains(&x) && (0..=limit).contains(&y) {
                    Some((x as i32, y as i32))
                } else {
                    errors.push(Violation::range(format!(
                        "Object {i} position ({x}, {y}) out of range (0-{limit})"
                    )));
                    None
                }
            }
            _ => {
                errors.push(Violation::schema(format!("Object {i} missing position fields")));
                None
            }
        };
        if let (Some(kind), Some((x, y))) = (&obj.kind, position) {
            checked.push(ObjectEntity {
                kind: kind.clone(),
                x,
                y,
                properties: stringify(&obj.properties),
            });
        }
    }
    checked
}

fn stringify(properties: &serde_json::Map<String, Value>) -> BTreeMap<String, String> {
    properties
        .iter()
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), value)
        })
        .collect()
}
