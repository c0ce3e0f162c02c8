//! `texloc diff`

use anyhow::{Context as _, Result};
use clap::Args;
use std::path::PathBuf;
use texloc_raster::{diff_images, load_rgb};

#[derive(Args)]
pub struct DiffCommand {
    /// Page image of the uncolored document
    #[arg(value_name = "BASELINE")]
    baseline: PathBuf,

    /// Same page of a colorized iteration
    #[arg(value_name = "COLORIZED")]
    colorized: PathBuf,

    /// Where to write the diff (PNG)
    #[arg(short, long, value_name = "PNG")]
    out: PathBuf,
}

impl DiffCommand {
    pub fn execute(self) -> Result<()> {
        let baseline = load_rgb(&self.baseline)
            .with_context(|| format!("Failed to load {}", self.baseline.display()))?;
        let colorized = load_rgb(&self.colorized)
            .with_context(|| format!("Failed to load {}", self.colorized.display()))?;
        let diff = diff_images(&baseline, &colorized)?;
        diff.save(&self.out)
            .with_context(|| format!("Failed to write {}", self.out.display()))?;
        log::info!("Wrote diff to {}", self.out.display());
        Ok(())
    }
}
