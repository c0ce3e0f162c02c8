//! texloc - locate LaTeX entities on rendered PDF pages
//!
//! Each subcommand exposes one stage of the locator so that it can be driven
//! from scripts around an external TeX compiler and PDF rasterizer:
//!
//! ```bash
//! texloc scan main.tex --entity equations
//! texloc colorize main.tex --entity citations --out colorized/
//! texloc diff baseline-1.png colorized-1.png --out diff-1.png
//! texloc decode diff-1.png --hues colorized/hues.csv --page 0 --iteration 0
//! texloc evaluate hue_locations.csv --expected labels.csv
//! texloc plan symbols definitions
//! ```

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use texloc_core::LocatorConfig;

mod commands;

use commands::colorize::ColorizeCommand;
use commands::decode::DecodeCommand;
use commands::diff::DiffCommand;
use commands::evaluate::EvaluateCommand;
use commands::plan::PlanCommand;
use commands::scan::ScanCommand;

#[derive(Parser)]
#[command(
    name = "texloc",
    version,
    about = "Locate LaTeX entities on rendered PDF pages",
    after_help = "Set RUST_LOG=debug for per-iteration and per-page details."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Locator configuration (TOML); missing keys take their defaults
    #[arg(long, global = true, value_name = "TOML")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the entities found in a TeX file as JSON
    Scan(ScanCommand),

    /// Write colorized iterations of a TeX file and their hue records
    Colorize(ColorizeCommand),

    /// Diff a baseline page image against a colorized one
    Diff(DiffCommand),

    /// Decode entity boxes from a page diff
    Decode(DecodeCommand),

    /// Score located boxes against hand-labelled ones
    Evaluate(EvaluateCommand),

    /// Show the commands needed to locate some entity types
    Plan(PlanCommand),
}

/// Entity types the scanner can extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntityKind {
    Equations,
    Citations,
    Bibitems,
}

fn load_config(path: Option<&PathBuf>) -> Result<LocatorConfig> {
    match path {
        Some(path) => LocatorConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(LocatorConfig::default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Scan(cmd) => cmd.execute(),
        Commands::Colorize(cmd) => cmd.execute(&config),
        Commands::Diff(cmd) => cmd.execute(),
        Commands::Decode(cmd) => cmd.execute(&config),
        Commands::Evaluate(cmd) => cmd.execute(&config),
        Commands::Plan(cmd) => cmd.execute(),
    }
}
