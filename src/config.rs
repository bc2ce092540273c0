//! Static registries the compiler consults: which canonical first id and
//! palette bank each atlas owns, and which canonical tiles are solid.
//!
//! Built once at start-up and passed by reference into every stage.

use std::ops::Range;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AtlasEntry {
    pub name: String,
    pub first_id: u32,
    #[serde(default)]
    pub palette_bank: u8,
}

/// Canonical atlas layout of the runtime.
///
/// The runtime concatenates atlases as grassy_stone, plants, decals, which
/// is not the order the level documents declare them in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompilerConfig {
    pub atlases: Vec<AtlasEntry>,
    /// Half-open `[start, end)` ranges of canonical ids that block movement.
    #[serde(default = "default_solid")]
    pub solid: Vec<(u32, u32)>,
}

fn default_solid() -> Vec<(u32, u32)> {
    // the structural atlas always comes first
    vec![(1, 56)]
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            atlases: vec![
                AtlasEntry {
                    name: "grassy_stone".into(),
                    first_id: 1,
                    palette_bank: 0,
                },
                AtlasEntry {
                    name: "plants".into(),
                    first_id: 56,
                    palette_bank: 2,
                },
                AtlasEntry {
                    name: "decals".into(),
                    first_id: 216,
                    palette_bank: 3,
                },
            ],
            solid: default_solid(),
        }
    }
}

impl CompilerConfig {
    /// Load a registry override from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Reading {}", path.display()))?;
        let config: CompilerConfig = serde_json::from_str(&text)
            .with_context(|| format!("Parsing registry config {}", path.display()))?;
        for &(start, end) in &config.solid {
            if start > end {
                return Err(anyhow!("solid range [{start}, {end}) is reversed"));
            }
        }
        Ok(config)
    }

    pub fn with_solid(mut self, ranges: Vec<Range<u32>>) -> Self {
        if !ranges.is_empty() {
            self.solid = ranges.into_iter().map(|r| (r.start, r.end)).collect();
        }
        self
    }

    pub fn atlas(&self, name: &str) -> Option<&AtlasEntry> {
        self.atlases.iter().find(|a| a.name == name)
    }
}

/// clap value parser for `START..END`.
pub fn parse_range(s: &str) -> Result<Range<u32>, String> {
    let (start, end) = s
        .split_once("..")
        .ok_or_else(|| format!("expected START..END, got `{s}`"))?;
    let start: u32 = start
        .trim()
        .parse()
        .map_err(|e| format!("bad range start `{start}`: {e}"))?;
    let end: u32 = end
        .trim()
        .parse()
        .map_err(|e| format!("bad range end `{end}`: {e}"))?;
    if start > end {
        return Err(format!("range {start}..{end} is reversed"));
    }
    Ok(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_matches_runtime_layout() {
        let config = CompilerConfig::default();
        assert_eq!(config.atlas("grassy_stone").map(|a| a.first_id), Some(1));
        assert_eq!(config.atlas("plants").map(|a| a.first_id), Some(56));
        assert_eq!(config.atlas("decals").map(|a| a.palette_bank), Some(3));
        assert!(config.atlas("unknown").is_none());
    }

    #[test]
    fn default_solid_set_is_structural_atlas() {
        let config = CompilerConfig::default();
        assert_eq!(config.solid, vec![(1, 56)]);
    }

    #[test]
    fn override_file_defaults_solid_set() {
        let config: CompilerConfig =
            serde_json::from_str(r#"{ "atlases": [{ "name": "stone", "first_id": 1 }] }"#)
                .expect("valid config");
        assert_eq!(config.atlases[0].palette_bank, 0);
        assert_eq!(config.solid, vec![(1, 56)]);
    }

    #[test]
    fn cli_solid_ranges_replace_defaults() {
        let config = CompilerConfig::default().with_solid(vec![10..12, 40..41]);
        assert_eq!(config.solid, vec![(10, 12), (40, 41)]);
    }

    #[test]
    fn parse_range_accepts_and_rejects() {
        assert_eq!(parse_range("1..56"), Ok(1..56));
        assert!(parse_range("56..1").is_err());
        assert!(parse_range("12").is_err());
        assert!(parse_range("a..3").is_err());
    }
}
