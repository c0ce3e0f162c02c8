//! `texloc evaluate`

use anyhow::{Context as _, Result};
use clap::Args;
use std::path::PathBuf;
use texloc_core::{read_records, HueLocationRecord, LocatorConfig, LocatorConfigBuilder};
use texloc_pipeline::{evaluate_locations, ExpectedLocation};

#[derive(Args)]
pub struct EvaluateCommand {
    /// Located boxes, as written by `texloc decode`
    #[arg(value_name = "CSV")]
    locations: PathBuf,

    /// Hand-labelled boxes: entity_id, page, left, top, width, height
    #[arg(long, value_name = "CSV")]
    expected: PathBuf,

    /// Smallest IOU counted as a match
    #[arg(long)]
    minimum_iou: Option<f64>,
}

impl EvaluateCommand {
    pub fn execute(self, config: &LocatorConfig) -> Result<()> {
        let config = LocatorConfigBuilder::from_config(config.clone())
            .minimum_iou(self.minimum_iou.unwrap_or(config.minimum_iou))
            .build()?;
        let locations: Vec<HueLocationRecord> = read_records(&self.locations)
            .with_context(|| format!("Failed to read {}", self.locations.display()))?;
        let expected: Vec<ExpectedLocation> = read_records(&self.expected)
            .with_context(|| format!("Failed to read {}", self.expected.display()))?;

        let accuracy = evaluate_locations(
            &locations,
            &expected,
            config.minimum_iou,
            config.cluster_vertical_split,
        );
        println!("{}", serde_json::to_string_pretty(&accuracy)?);
        Ok(())
    }
}
