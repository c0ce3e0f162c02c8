//! `texloc decode`

use anyhow::{Context as _, Result};
use clap::Args;
use std::path::PathBuf;
use texloc_core::{
    append_records, read_records, Hue, HueLocationRecord, HueRecord, LocatorConfig,
    LocatorConfigBuilder,
};
use texloc_raster::{decode_hues, detect_layout_shift, load_rgb, DecodeParams};

#[derive(Args)]
pub struct DecodeCommand {
    /// Page diff image
    #[arg(value_name = "DIFF")]
    diff: PathBuf,

    /// Hue records written by `texloc colorize`
    #[arg(long, value_name = "CSV")]
    hues: PathBuf,

    /// Page number of the diff, recorded with every box
    #[arg(long)]
    page: usize,

    /// Colorization iteration the diff was rendered from
    #[arg(long, default_value = "0")]
    iteration: usize,

    /// Append located boxes to this CSV instead of printing them
    #[arg(short, long, value_name = "CSV")]
    out: Option<PathBuf>,

    /// Do not check the diff for layout shifts
    #[arg(long)]
    skip_visual_validation: bool,
}

impl DecodeCommand {
    pub fn execute(self, config: &LocatorConfig) -> Result<()> {
        let config = LocatorConfigBuilder::from_config(config.clone())
            .skip_visual_validation(self.skip_visual_validation || config.skip_visual_validation)
            .build()?;
        let params = DecodeParams::from(&config);

        let diff = load_rgb(&self.diff)
            .with_context(|| format!("Failed to load {}", self.diff.display()))?;
        let records: Vec<HueRecord> = read_records(&self.hues)
            .with_context(|| format!("Failed to read hue records from {}", self.hues.display()))?;
        let records: Vec<HueRecord> = records
            .into_iter()
            .filter(|record| record.iteration == self.iteration)
            .collect();
        if records.is_empty() {
            log::warn!("No hue records for iteration {}", self.iteration);
        }

        let hues: Vec<Hue> = records.iter().map(|record| record.hue).collect();
        if !config.skip_visual_validation {
            detect_layout_shift(&diff, self.page, &hues, &params)
                .context("Boxes from this diff cannot be trusted")?;
        }

        let locations: Vec<HueLocationRecord> = records
            .iter()
            .zip(decode_hues(&diff, self.page, &hues, &params))
            .flat_map(|(record, (_, boxes))| {
                boxes
                    .into_iter()
                    .map(move |bbox| HueLocationRecord::new(record, &bbox))
            })
            .collect();
        log::info!(
            "Located {} boxes for {} entities",
            locations.len(),
            records.len()
        );

        match &self.out {
            Some(out) => append_records(out, &locations)?,
            None => {
                let mut writer = csv::WriterBuilder::new()
                    .has_headers(false)
                    .from_writer(std::io::stdout().lock());
                for location in &locations {
                    writer.serialize(location)?;
                }
                writer.flush()?;
            }
        }
        Ok(())
    }
}
