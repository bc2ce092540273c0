//! Parser for Tiled `.tmx` level documents.
//!
//! Only orthogonal maps with CSV-encoded layers are accepted. Everything is
//! kept in authored numbering (`Gid`); later stages decide what they need.

use std::path::Path;

use log::{debug, info, warn};

use crate::error::{LevelError, Result};
use crate::model::{
    AtlasReference, DEFAULT_LEVEL_NAME, DEFAULT_TILE_SIZE, Gid, Grid, LevelDocument, Point,
    RawLayer, RawObject, SPAWN_TYPE,
};
use crate::parser::xml::{self, Element};

/// Render defaults by layer position: the first layer is the background
/// (BG2, priority 1), the second sits in front (BG1, priority 0). Further
/// layers reuse the first layer's defaults.
const LAYER_DEFAULTS: [(i64, i64); 2] = [(2, 1), (1, 0)];

pub fn parse_map(text: &str, path: &Path) -> Result<LevelDocument<Gid>> {
    let root = xml::parse(text).map_err(|e| LevelError::malformed(path, e))?;
    if root.name != "map" {
        return Err(LevelError::malformed(
            path,
            format!("root element is <{}>, expected <map>", root.name),
        ));
    }
    if let Some(orientation) = root.attr("orientation") {
        if orientation != "orthogonal" {
            return Err(LevelError::UnsupportedFormat(format!(
                "{orientation} maps (only orthogonal maps are supported)"
            )));
        }
    }

    let width = optional_number(&root, "width", path)?;
    let height = optional_number(&root, "height", path)?;
    let tile_width = optional_number(&root, "tilewidth", path)?.unwrap_or(DEFAULT_TILE_SIZE);
    let tile_height = optional_number(&root, "tileheight", path)?.unwrap_or(DEFAULT_TILE_SIZE);

    let atlases = root
        .children_named("tileset")
        .map(|ts| parse_tileset_ref(ts, path))
        .collect::<Result<Vec<_>>>()?;

    let mut layers = Vec::new();
    for (index, layer) in root.children_named("layer").enumerate() {
        layers.push(parse_layer(layer, index, width, path)?);
    }

    let mut objects = Vec::new();
    let mut spawn = None;
    let mut spawn_candidates = 0;
    for group in root.children_named("objectgroup") {
        for object in group.children_named("object") {
            let parsed = parse_object(object, path)?;
            if is_spawn(object) {
                spawn_candidates += 1;
                // last spawn entity in document order wins
                spawn = match (parsed.x, parsed.y) {
                    (Some(x), Some(y)) => Some(Point { x, y }),
                    _ => None,
                };
            } else {
                objects.push(parsed);
            }
        }
    }
    if spawn_candidates > 1 {
        warn!(
            "{}: {spawn_candidates} `{SPAWN_TYPE}` objects found, using the last one",
            path.display()
        );
    }

    let name = root
        .property("name")
        .unwrap_or_else(|| DEFAULT_LEVEL_NAME.to_string());
    let author = root.property("author");

    info!(
        "Parsed {}: {} tilesets, {} layers, {} objects",
        path.display(),
        atlases.len(),
        layers.len(),
        objects.len()
    );

    Ok(LevelDocument {
        name,
        author,
        width,
        height,
        tile_width,
        tile_height,
        atlases,
        layers,
        objects,
        spawn,
        spawn_candidates,
    })
}

fn optional_number(element: &Element, key: &str, path: &Path) -> Result<Option<u32>> {
    element
        .attr(key)
        .map(|raw| {
            raw.trim().parse().map_err(|_| {
                LevelError::malformed(
                    path,
                    format!("<{}> `{key}` = '{raw}' is not a non-negative integer", element.name),
                )
            })
        })
        .transpose()
}

fn parse_tileset_ref(tileset: &Element, path: &Path) -> Result<AtlasReference> {
    let declared_first_id = optional_number(tileset, "firstgid", path)?.ok_or_else(|| {
        LevelError::MissingField {
            path: path.to_path_buf(),
            field: "tileset.firstgid".to_string(),
        }
    })?;
    let descriptor_path = tileset
        .attr("source")
        .ok_or(LevelError::UnsupportedTileset {
            first_gid: declared_first_id,
        })?
        .to_string();
    Ok(AtlasReference {
        declared_first_id,
        descriptor_path,
    })
}

fn parse_layer(
    layer: &Element,
    index: usize,
    map_width: Option<u32>,
    path: &Path,
) -> Result<RawLayer<Gid>> {
    let name = layer
        .attr("name")
        .map(str::to_string)
        .unwrap_or_else(|| format!("Layer {}", index + 1));

    let data = layer.child("data").ok_or_else(|| LevelError::MissingField {
        path: path.to_path_buf(),
        field: format!("layer '{name}' <data>"),
    })?;
    // no encoding attribute means per-tile <tile> elements
    let encoding = data.attr("encoding").unwrap_or("xml");
    if encoding != "csv" || data.attr("compression").is_some() {
        return Err(LevelError::UnsupportedEncoding {
            layer: name,
            encoding: match data.attr("compression") {
                Some(c) => format!("{encoding}+{c}"),
                None => encoding.to_string(),
            },
        });
    }

    let cells = decode_csv(&data.text).map_err(|e| {
        LevelError::malformed(path, format!("layer '{name}': {e}"))
    })?;
    let row_width = match map_width {
        Some(w) => Some(w),
        None => optional_number(layer, "width", path)?,
    };
    let tiles = Grid::from_flat(
        cells.into_iter().map(Gid).collect(),
        row_width.unwrap_or(0) as usize,
    );

    let (default_bg, default_priority) = LAYER_DEFAULTS
        .get(index)
        .copied()
        .unwrap_or(LAYER_DEFAULTS[0]);
    let bg_layer = render_property(layer, "bgLayer", &name, path)?.unwrap_or(default_bg);
    let priority = render_property(layer, "priority", &name, path)?.unwrap_or(default_priority);

    debug!(
        "layer '{name}': {} cells, BG{bg_layer} priority {priority}",
        tiles.len()
    );

    Ok(RawLayer {
        name,
        bg_layer,
        priority,
        tiles,
    })
}

/// Out-of-range values are kept for the validator; only non-numbers fail here.
fn render_property(layer: &Element, key: &str, name: &str, path: &Path) -> Result<Option<i64>> {
    layer
        .property(key)
        .map(|raw| {
            raw.trim().parse().map_err(|_| {
                LevelError::malformed(
                    path,
                    format!("layer '{name}': property `{key}` = '{raw}' is not an integer"),
                )
            })
        })
        .transpose()
}

/// Decode a flat, row-major, comma-separated cell list. Newlines between
/// rows and one trailing comma are tolerated. Cells are read as `u64` so
/// oversized ids reach the remapper and degrade to the empty tile.
pub fn decode_csv(text: &str) -> Result<Vec<u64>, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let body = trimmed.strip_suffix(',').unwrap_or(trimmed);
    body.split(',')
        .enumerate()
        .map(|(i, cell)| {
            let cell = cell.trim();
            cell.parse::<u64>()
                .map_err(|_| format!("cell {i} = '{cell}' is not a non-negative integer"))
        })
        .collect()
}

fn is_spawn(object: &Element) -> bool {
    ["type", "class", "name"]
        .iter()
        .filter_map(|key| object.attr(key))
        .any(|v| v.eq_ignore_ascii_case(SPAWN_TYPE))
}

fn parse_object(object: &Element, path: &Path) -> Result<RawObject> {
    let kind = ["type", "class", "name"]
        .iter()
        .filter_map(|key| object.attr(key))
        .find(|v| !v.is_empty())
        .map(str::to_string);

    let coordinate = |key: &str| -> Result<Option<i32>> {
        object
            .attr(key)
            .map(|raw| {
                raw.trim()
                    .parse::<f64>()
                    .map(|v| v.floor() as i32)
                    .map_err(|_| {
                        LevelError::malformed(
                            path,
                            format!(
                                "object {}: `{key}` = '{raw}' is not a number",
                                object.attr("id").unwrap_or("?")
                            ),
                        )
                    })
            })
            .transpose()
    };

    Ok(RawObject {
        kind,
        x: coordinate("x")?,
        y: coordinate("y")?,
        properties: object.properties().into_iter().collect(),
    })
}
