//! `texloc scan`

use crate::EntityKind;
use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use texloc_tex::{BibitemExtractor, CitationExtractor, EntityExtractor, EquationExtractor};

#[derive(Args)]
pub struct ScanCommand {
    /// TeX file to scan
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Kind of entity to extract
    #[arg(short, long, value_enum)]
    entity: EntityKind,
}

fn to_json<X>(extractor: &X, tex: &str) -> Result<String>
where
    X: EntityExtractor,
    X::Entity: Serialize,
{
    let entities = extractor.parse(tex)?;
    log::info!("Found {} entities", entities.len());
    Ok(serde_json::to_string_pretty(&entities)?)
}

impl ScanCommand {
    pub fn execute(self) -> Result<()> {
        let tex = std::fs::read_to_string(&self.input)
            .with_context(|| format!("Failed to read {}", self.input.display()))?;
        let json = match self.entity {
            EntityKind::Equations => to_json(&EquationExtractor::new()?, &tex)?,
            EntityKind::Citations => to_json(&CitationExtractor::new()?, &tex)?,
            EntityKind::Bibitems => to_json(&BibitemExtractor::new()?, &tex)?,
        };
        println!("{json}");
        Ok(())
    }
}
