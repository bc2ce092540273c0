pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod processor;
pub mod writer;

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use log::info;

use crate::config::CompilerConfig;

pub fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    match args.command {
        cli::Command::Convert {
            input,
            output,
            config,
            solid,
        } => {
            let config = match config {
                Some(path) => CompilerConfig::load(&path)?,
                None => CompilerConfig::default(),
            }
            .with_solid(solid);
            convert(&input, &output, &config)
        }
    }
}

/// Convert one level file, choosing the pipeline by extension.
///
/// The output is only written once every stage has succeeded.
pub fn convert(input: &Path, output: &Path, config: &CompilerConfig) -> anyhow::Result<()> {
    let extension = input
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());

    match extension.as_deref() {
        Some("tmx") => {
            // 1. ── Parse ──────────────────────────────────────────────────
            let loaded = parser::load_tmx(input, config)
                .with_context(|| format!("Loading {}", input.display()))?;

            // 2. ── Process ────────────────────────────────────────────────
            let level = processor::compile(loaded, config, input)
                .with_context(|| format!("Compiling {}", input.display()))?;

            // 3. ── Write outputs ──────────────────────────────────────────
            writer::c::emit(&level, output).with_context(|| "Writing C header")?;
        }
        Some("json") => {
            let raw = parser::load_json(input)
                .with_context(|| format!("Loading {}", input.display()))?;
            let level = processor::legacy::validate(&raw, input)
                .with_context(|| format!("Compiling {}", input.display()))?;
            writer::legacy::emit(&level, output).with_context(|| "Writing C header")?;
        }
        other => {
            return Err(error::LevelError::UnsupportedFormat(format!(
                "`{}` (expected .tmx or .json)",
                other.unwrap_or("")
            ))
            .into());
        }
    }

    info!("Successfully converted {} to {}", input.display(), output.display());
    Ok(())
}
