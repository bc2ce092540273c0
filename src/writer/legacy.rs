//! Emit a legacy JSON level as the older single-atlas header
//! (byte tile ids, no slot tables, no collision bitmap).

use std::fmt::{self, Write};
use std::path::Path;

use log::info;

use crate::error::Result;
use crate::processor::legacy::LegacyCompiled;
use crate::writer::{c_string, comment_text, guard_token, sanitize_identifier, write_values};

pub fn emit(level: &LegacyCompiled, output: &Path) -> Result<()> {
    let header = render(level, &guard_token(output));
    super::write_artifact(output, &header)?;
    info!("Wrote {} ({} bytes)", output.display(), header.len());
    Ok(())
}

pub fn render(level: &LegacyCompiled, guard: &str) -> String {
    let mut out = String::new();
    let _ = write_header(&mut out, level, guard);
    out
}

fn write_header(h: &mut String, level: &LegacyCompiled, guard: &str) -> fmt::Result {
    let id = sanitize_identifier(&level.name);

    writeln!(h, "#ifndef {guard}")?;
    writeln!(h, "#define {guard}")?;
    writeln!(h)?;
    writeln!(h, "#include \"gba.h\"")?;
    writeln!(h)?;
    writeln!(h, "// Level: {}", comment_text(&level.name))?;
    if let Some(author) = &level.author {
        writeln!(h, "// Author: {}", comment_text(author))?;
    }
    writeln!(
        h,
        "// Dimensions: {}x{} tiles ({}x{} pixels)",
        level.width,
        level.height,
        level.width * 8,
        level.height * 8
    )?;
    writeln!(h)?;

    writeln!(h, "static const u8 {id}_tiles[{}] = {{", level.tiles.len())?;
    write_values(h, &level.tiles, 16, 3)?;
    writeln!(h, "}};")?;
    writeln!(h)?;

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
            writeln!(h, "    {{{}, {}, {}}}{comma}", c_string(&obj.kind), obj.x, obj.y)?;
        }
        writeln!(h, "}};")?;
    }
    writeln!(h)?;

    writeln!(h, "#ifndef LEVEL_STRUCT_DEFINED")?;
    writeln!(h, "#define LEVEL_STRUCT_DEFINED")?;
    writeln!(h, "typedef struct {{")?;
    writeln!(h, "    const char* name;")?;
    writeln!(h, "    u16 width;")?;
    writeln!(h, "    u16 height;")?;
    writeln!(h, "    const u8* tiles;")?;
    writeln!(h, "    u16 objectCount;")?;
    writeln!(h, "    const LevelObject* objects;")?;
    writeln!(h, "    u16 playerSpawnX;")?;
    writeln!(h, "    u16 playerSpawnY;")?;
    writeln!(h, "}} Level;")?;
    writeln!(h, "#endif")?;
    writeln!(h)?;

    writeln!(h, "static const Level {id} = {{")?;
    writeln!(h, "    {},", c_string(&level.name))?;
    writeln!(h, "    {},", level.width)?;
    writeln!(h, "    {},", level.height)?;
    writeln!(h, "    {id}_tiles,")?;
    writeln!(h, "    {},", level.objects.len())?;
    writeln!(h, "    {id}_objects,")?;
    writeln!(h, "    {},", level.spawn.x)?;
    writeln!(h, "    {}", level.spawn.y)?;
    writeln!(h, "}};")?;
    writeln!(h)?;
    writeln!(h, "#endif // {guard}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Point;

    #[test]
    fn renders_byte_tiles_and_sentinel_object() {
        let level = LegacyCompiled {
            name: "Tutorial".into(),
            author: None,
            width: 2,
            height: 1,
            tiles: vec![3, 255],
            objects: Vec::new(),
            spawn: Point { x: 8, y: 0 },
        };
        let h = render(&level, "TUTORIAL_H");

        assert!(h.contains("// Dimensions: 2x1 tiles (16x8 pixels)"));
        assert!(h.contains("static const u8 Tutorial_tiles[2] = {\n      3, 255\n};"));
        assert!(h.contains("static const LevelObject Tutorial_objects[1] = {{\"none\", 0, 0}};"));
        assert!(h.contains("static const Level Tutorial = {\n    \"Tutorial\",\n    2,\n    1,\n    Tutorial_tiles,\n    0,"));
        assert!(!h.contains("collisionBitmap"));
    }
}
