use clap::{Parser, Subcommand};
use std::ops::Range;
use std::path::PathBuf;

use crate::config::parse_range;

#[derive(Parser, Debug)]
#[command(author, version, about = "Compile Tiled levels into GBA static data")]
pub struct Cli {
    /// Log every stage (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert a .tmx level (or a legacy .json level) into a C header.
    Convert {
        /// Input .tmx map or legacy .json level
        input: PathBuf,
        /// Output header file
        output: PathBuf,
        /// JSON file replacing the built-in atlas registry and solid set
        #[arg(long)]
        config: Option<PathBuf>,
        /// Solid canonical tile range START..END (repeatable)
        #[arg(long = "solid", value_parser = parse_range)]
        solid: Vec<Range<u32>>,
    },
}
