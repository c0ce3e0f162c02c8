//! `texloc colorize`

use crate::EntityKind;
use anyhow::{bail, Context as _, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use texloc_core::{append_records, reset_records, LocatorConfig, LocatorConfigBuilder};
use texloc_pipeline::{prepare_iteration_dir, HUES_FILE};
use texloc_tex::{
    colorize, CitationExtractor, Colorizable, ColorizeOptions, EntityExtractor, EquationExtractor,
};

#[derive(Args)]
pub struct ColorizeCommand {
    /// TeX file to colorize
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Kind of entity to colorize
    #[arg(short, long, value_enum)]
    entity: EntityKind,

    /// Output directory; iteration N is written to <OUT>/iteration-N/
    #[arg(short, long, value_name = "DIR")]
    out: PathBuf,

    /// Colorize one entity per iteration, to pinpoint compile failures
    #[arg(long)]
    one_entity_at_a_time: bool,
}

impl ColorizeCommand {
    pub fn execute(self, config: &LocatorConfig) -> Result<()> {
        let config = LocatorConfigBuilder::from_config(config.clone())
            .one_entity_at_a_time(self.one_entity_at_a_time || config.one_entity_at_a_time)
            .build()?;
        let tex = std::fs::read_to_string(&self.input)
            .with_context(|| format!("Failed to read {}", self.input.display()))?;
        let file_name = self
            .input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .context("Input path has no file name")?;
        std::fs::create_dir_all(&self.out)
            .with_context(|| format!("Failed to create {}", self.out.display()))?;

        let iterations = match self.entity {
            EntityKind::Equations => {
                let entities = EquationExtractor::new()?.parse(&tex)?;
                write_iterations(&tex, &entities, &file_name, &self.out, &config)?
            }
            EntityKind::Citations => {
                let entities = CitationExtractor::new()?.parse(&tex)?;
                write_iterations(&tex, &entities, &file_name, &self.out, &config)?
            }
            EntityKind::Bibitems => bail!("bibliography entries are not colorized"),
        };

        println!(
            "Wrote {iterations} iterations to {} (hue records in {})",
            self.out.display(),
            self.out.join(HUES_FILE).display()
        );
        Ok(())
    }
}

fn write_iterations<E: Colorizable + Clone>(
    tex: &str,
    entities: &[E],
    file_name: &str,
    out: &Path,
    config: &LocatorConfig,
) -> Result<usize> {
    reset_records(out.join(HUES_FILE))?;
    let mut count = 0;
    for iteration in colorize(tex, entities, &ColorizeOptions::from(config))? {
        let dir = out.join(format!("iteration-{}", iteration.index));
        prepare_iteration_dir(&dir)?;
        std::fs::write(dir.join(file_name), &iteration.tex)?;
        append_records(out.join(HUES_FILE), &iteration.records(file_name))?;
        log::debug!(
            "Iteration {}: {} entities",
            iteration.index,
            iteration.hues.len()
        );
        count += 1;
    }
    Ok(count)
}
