//! Static-data emitters for the firmware build.
pub mod c;
pub mod legacy;

use std::fmt::{self, Display, Write};
use std::path::Path;

use crate::error::{LevelError, Result};

/// Write a fully rendered artifact in one truncate-and-create step.
pub(crate) fn write_artifact(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).map_err(|e| LevelError::io(path, e))
}

/// Turn a free-form name into a valid C identifier.
pub fn sanitize_identifier(name: &str) -> String {
    let mut result: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, '_');
    }
    if result.is_empty() {
        return "unnamed".to_string();
    }
    result
}

/// Include guard derived from the output file name, e.g. `level3.h` becomes
/// `LEVEL3_H`.
pub fn guard_token(output: &Path) -> String {
    let file = output
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut guard = sanitize_identifier(&file).to_ascii_uppercase();
    if !guard.ends_with("_H") {
        guard.push_str("_H");
    }
    guard
}

/// Escape text for use inside a C string literal.
pub fn c_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c if c.is_ascii_graphic() || c == ' ' => out.push(c),
            c => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    // octal escapes cannot swallow a following digit
                    let _ = write!(out, "\\{byte:03o}");
                }
            }
        }
    }
    out.push('"');
    out
}

/// Comment text must not close the comment or break the line.
pub fn comment_text(text: &str) -> String {
    text.replace(['\n', '\r'], " ").replace("*/", "* /")
}

/// Array initialiser body: `per_line` values per line, comma separated.
pub fn write_values<T: Display>(
    out: &mut String,
    values: &[T],
    per_line: usize,
    width: usize,
) -> fmt::Result {
    let lines: Vec<_> = values.chunks(per_line.max(1)).collect();
    for (i, chunk) in lines.iter().enumerate() {
        out.push_str("    ");
        for (j, v) in chunk.iter().enumerate() {
            if j > 0 {
                out.push_str(", ");
            }
            write!(out, "{v:>width$}")?;
        }
        if i + 1 < lines.len() {
            out.push(',');
        }
        out.push('\n');
    }
    Ok(())
}
