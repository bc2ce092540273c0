//! Emit the compiled level as a self-contained C header.

use std::fmt::{self, Write};
use std::path::Path;

use log::info;

use crate::error::Result;
use crate::model::CompiledLevel;
use crate::writer::{c_string, comment_text, guard_token, sanitize_identifier, write_values};

pub fn emit(level: &CompiledLevel, output: &Path) -> Result<()> {
    let header = render(level, &guard_token(output));
    super::write_artifact(output, &header)?;
    info!("Wrote {} ({} bytes)", output.display(), header.len());
    Ok(())
}

/// Render the whole header; nothing is validated or transformed here.
pub fn render(level: &CompiledLevel, guard: &str) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = write_header(&mut out, level, guard);
    out
}

fn write_header(h: &mut String, level: &CompiledLevel, guard: &str) -> fmt::Result {
    let id = sanitize_identifier(&level.name);
    let unique = level.unique_tile_ids.len();

    writeln!(h, "#ifndef {guard}")?;
    writeln!(h, "#define {guard}")?;
    writeln!(h)?;
    writeln!(h, "#include \"gba.h\"")?;
    writeln!(h)?;
    writeln!(h, "// Auto-generated - DO NOT EDIT")?;

    // ---------------------------------------------------------------
    // 1. Metadata
    // ---------------------------------------------------------------
    writeln!(h, "// Level: {}", comment_text(&level.name))?;
    if let Some(author) = &level.author {
        writeln!(h, "// Author: {}", comment_text(author))?;
    }
    writeln!(
        h,
        "// Dimensions: {}x{} tiles ({}x{} pixels)",
        level.width,
        level.height,
        u64::from(level.width) * u64::from(level.tile_width),
        u64::from(level.height) * u64::from(level.tile_height)
    )?;
    writeln!(h, "// Tilesets: {}", level.atlases.len())?;
    for atlas in &level.atlases {
        writeln!(
            h,
            "//   {} : tiles {}-{}, palette bank {}",
            comment_text(&atlas.name),
            atlas.canonical_first_id,
            atlas.canonical_end().saturating_sub(1),
            atlas.palette_bank
        )?;
    }
    writeln!(h, "// Layers: {}", level.layers.len())?;
    writeln!(h, "// Unique tiles: {unique}")?;
    writeln!(h)?;

    // ---------------------------------------------------------------
    // 2. VRAM slot → canonical tile id / palette bank
    // ---------------------------------------------------------------
    let ids: Vec<u32> = level.unique_tile_ids.iter().map(|t| t.0).collect();
    writeln!(h, "static const u16 {id}_uniqueTileIds[{unique}] = {{")?;
    write_values(h, &ids, 16, 5)?;
    writeln!(h, "}};")?;
    writeln!(h)?;

    writeln!(h, "static const u8 {id}_tilePaletteBanks[{unique}] = {{")?;
    write_values(h, &level.tile_palette_banks, 16, 2)?;
    writeln!(h, "}};")?;
    writeln!(h)?;

    // ---------------------------------------------------------------
    // 3. Layers (VRAM slots, row-major)
    // ---------------------------------------------------------------
    for (i, layer) in level.layers.iter().enumerate() {
        let slots: Vec<u16> = layer.slots.cells().map(|s| s.0).collect();
        writeln!(
            h,
            "// Layer {i}: {} (BG{}, priority {})",
            comment_text(&layer.name),
            layer.bg_layer,
            layer.priority
        )?;
        writeln!(h, "static const u16 {id}_layer{i}_tiles[{}] = {{", slots.len())?;
        write_values(h, &slots, 16, 4)?;
        writeln!(h, "}};")?;
        writeln!(h)?;
    }

    // ---------------------------------------------------------------
    // 4. Collision bitmap (bit s of the table == slot s is solid)
    // ---------------------------------------------------------------
    let words: Vec<String> = level
        .collision
        .words
        .iter()
        .map(|w| format!("0x{w:08X}"))
        .collect();
    writeln!(
        h,
        "static const u32 {id}_collisionBitmap[{}] = {{",
        words.len()
    )?;
    write_values(h, &words, 8, 10)?;
    writeln!(h, "}};")?;
    writeln!(h)?;

    // ---------------------------------------------------------------
    // 5. Layer descriptors
    // ---------------------------------------------------------------
    writeln!(h, "#ifndef TILE_LAYER_DEFINED")?;
    writeln!(h, "#define TILE_LAYER_DEFINED")?;
    writeln!(h, "typedef struct {{")?;
    writeln!(h, "    const char* name;")?;
    writeln!(h, "    u8 bgLayer;")?;
    writeln!(h, "    u8 priority;")?;
    writeln!(h, "    const u16* tiles;")?;
    writeln!(h, "}} TileLayer;")?;
    writeln!(h, "#endif")?;
    writeln!(h)?;

    writeln!(
        h,
        "static const TileLayer {id}_layers[{}] = {{",
        level.layers.len()
    )?;
    for (i, layer) in level.layers.iter().enumerate() {
        let comma = if i + 1 < level.layers.len() { "," } else { "" };
        writeln!(
            h,
            "    {{{}, {}, {}, {id}_layer{i}_tiles}}{comma}",
            c_string(&layer.name),
            layer.bg_layer,
            layer.priority
        )?;
    }
    writeln!(h, "}};")?;
    writeln!(h)?;

    // ---------------------------------------------------------------
    // 6. Objects (never an empty array)
    // ---------------------------------------------------------------
    writeln!(h, "#ifndef LEVEL_OBJECT_DEFINED")?;
    writeln!(h, "#define LEVEL_OBJECT_DEFINED")?;
    writeln!(h, "typedef struct {{")?;
    writeln!(h, "    const char* type;")?;
    writeln!(h, "    u16 x;")?;
    writeln!(h, "    u16 y;")?;
    writeln!(h, "}} LevelObject;")?;
    writeln!(h, "#endif")?;
    writeln!(h)?;

    if level.objects.is_empty() {
        writeln!(
            h,
            "static const LevelObject {id}_objects[1] = {{{{\"none\", 0, 0}}}};"
        )?;
    } else {
        writeln!(
            h,
            "static const LevelObject {id}_objects[{}] = {{",
            level.objects.len()
        )?;
        for (i, obj) in level.objects.iter().enumerate() {
            let comma = if i + 1 < level.objects.len() { "," } else { "" };
            writeln!(
                h,
                "    {{{}, {}, {}}}{comma}",
                c_string(&obj.kind),
                obj.x,
                obj.y
            )?;
        }
        writeln!(h, "}};")?;
    }
    writeln!(h)?;

    // ---------------------------------------------------------------
    // 7. Aggregate level record
    // ---------------------------------------------------------------
    writeln!(h, "#ifndef LEVEL_STRUCT_DEFINED")?;
    writeln!(h, "#define LEVEL_STRUCT_DEFINED")?;
    writeln!(h, "typedef struct {{")?;
    writeln!(h, "    const char* name;")?;
    writeln!(h, "    u16 width;")?;
    writeln!(h, "    u16 height;")?;
    writeln!(h, "    u8 layerCount;")?;
    writeln!(h, "    const TileLayer* layers;")?;
    writeln!(h, "    u16 uniqueTileCount;")?;
    writeln!(h, "    const u16* uniqueTileIds;")?;
    writeln!(h, "    const u8* tilePaletteBanks;")?;
    writeln!(h, "    const u32* collisionBitmap;")?;
    writeln!(h, "    u16 objectCount;")?;
    writeln!(h, "    const LevelObject* objects;")?;
    writeln!(h, "    u16 playerSpawnX;")?;
    writeln!(h, "    u16 playerSpawnY;")?;
    writeln!(h, "}} Level;")?;
    writeln!(h, "#endif")?;
    writeln!(h)?;

    writeln!(h, "static const Level {id} = {{")?;
    writeln!(h, "    .name = {},", c_string(&level.name))?;
    writeln!(h, "    .width = {},", level.width)?;
    writeln!(h, "    .height = {},", level.height)?;
    writeln!(h, "    .layerCount = {},", level.layers.len())?;
    writeln!(h, "    .layers = {id}_layers,")?;
    writeln!(h, "    .uniqueTileCount = {unique},")?;
    writeln!(h, "    .uniqueTileIds = {id}_uniqueTileIds,")?;
    writeln!(h, "    .tilePaletteBanks = {id}_tilePaletteBanks,")?;
    writeln!(h, "    .collisionBitmap = {id}_collisionBitmap,")?;
    writeln!(h, "    .objectCount = {},", level.objects.len())?;
    writeln!(h, "    .objects = {id}_objects,")?;
    writeln!(h, "    .playerSpawnX = {},", level.spawn.x)?;
    writeln!(h, "    .playerSpawnY = {}", level.spawn.y)?;
    writeln!(h, "}};")?;
    writeln!(h)?;
    writeln!(h, "#endif // {guard}")?;

    Ok(())
}
