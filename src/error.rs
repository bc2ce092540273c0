use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Every failure the level compiler can report.
///
/// Validation problems are collected into [`LevelError::Validation`]; all
/// other variants abort the compilation as soon as they are hit.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("{}: malformed input: {message}", .path.display())]
    Malformed { path: PathBuf, message: String },

    #[error("{}: missing required `{field}`", .path.display())]
    MissingField { path: PathBuf, field: String },

    #[error("layer '{layer}': unsupported tile encoding `{encoding}` (only csv is supported)")]
    UnsupportedEncoding { layer: String, encoding: String },

    #[error("tileset with firstgid {first_gid}: inline tilesets are not supported, use an external .tsx")]
    UnsupportedTileset { first_gid: u32 },

    #[error("atlas descriptor {}: {reason}", .path.display())]
    Descriptor { path: PathBuf, reason: String },

    #[error("Validation errors in {}:\n{}", .path.display(), join_violations(.violations))]
    Validation {
        path: PathBuf,
        violations: Vec<Violation>,
    },

    #[error("level uses {count} distinct tiles, the collision table can address at most {capacity}")]
    CapacityExceeded { count: usize, capacity: usize },

    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LevelError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LevelError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        LevelError::Malformed {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Violations carried by a failed validation pass, empty for other kinds.
    pub fn violations(&self) -> &[Violation] {
        match self {
            LevelError::Validation { violations, .. } => violations,
            _ => &[],
        }
    }
}

pub type Result<T, E = LevelError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// A required field or structural element is absent or misshapen.
    Schema,
    /// A numeric value lies outside its documented bound.
    Range,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    pub fn schema(message: impl Into<String>) -> Self {
        Violation {
            kind: ViolationKind::Schema,
            message: message.into(),
        }
    }

    pub fn range(message: impl Into<String>) -> Self {
        Violation {
            kind: ViolationKind::Range,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_violation_on_its_own_line() {
        let err = LevelError::Validation {
            path: "levels/one.tmx".into(),
            violations: vec![
                Violation::range("Invalid width: 0 (must be 1-256)"),
                Violation::schema("Missing required field: playerSpawn"),
            ],
        };

        assert_eq!(
            err.to_string(),
            "Validation errors in levels/one.tmx:\n\
             Invalid width: 0 (must be 1-256)\n\
             Missing required field: playerSpawn"
        );
        assert_eq!(err.violations().len(), 2);
    }
}
