//! `texloc plan`

use anyhow::{Context as _, Result};
use clap::Args;
use serde::Deserialize;
use std::path::PathBuf;
use texloc_pipeline::{EntityPipeline, PipelineRegistry};

#[derive(Args)]
pub struct PlanCommand {
    /// Entity types to locate
    #[arg(value_name = "ENTITY", required = true)]
    entities: Vec<String>,

    /// Pipeline definitions (TOML with [[pipeline]] tables) replacing the built-in set
    #[arg(long, value_name = "TOML")]
    pipelines: Option<PathBuf>,
}

#[derive(Deserialize)]
struct PipelineFile {
    pipeline: Vec<EntityPipeline>,
}

/// Extract, colorize and locate one entity type.
fn standard(name: &str) -> EntityPipeline {
    ["extract", "colorize", "compile", "raster", "diff", "locate"]
        .iter()
        .fold(EntityPipeline::new(name), |pipeline, stage| {
            pipeline.step(format!("{stage}-{name}"))
        })
}

fn builtin_pipelines() -> Vec<EntityPipeline> {
    vec![
        standard("citations"),
        standard("equations"),
        standard("symbols").depends_on("equations"),
        standard("sentences"),
        standard("abbreviations").optionally_depends_on("sentences"),
        standard("definitions")
            .depends_on("sentences")
            .optionally_depends_on("symbols"),
        standard("glossary-terms").optionally_depends_on("definitions"),
    ]
}

impl PlanCommand {
    pub fn execute(self) -> Result<()> {
        let pipelines = match &self.pipelines {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let file: PipelineFile = toml::from_str(&contents)
                    .with_context(|| format!("Failed to parse {}", path.display()))?;
                file.pipeline
            }
            None => builtin_pipelines(),
        };
        let registry = PipelineRegistry::new(pipelines)?;

        let requested: Vec<&str> = self.entities.iter().map(String::as_str).collect();
        for (number, command) in registry.commands_for(&requested)?.iter().enumerate() {
            println!("{:>3}. {command}", number + 1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_pipelines_are_acyclic() {
        let registry = PipelineRegistry::new(builtin_pipelines()).unwrap();
        let order: Vec<&str> = registry.order().iter().map(|p| p.name.as_str()).collect();
        let position = |name: &str| order.iter().position(|n| *n == name).unwrap();
        assert!(position("equations") < position("symbols"));
        assert!(position("symbols") < position("definitions"));
        assert!(position("definitions") < position("glossary-terms"));
    }

    #[test]
    fn test_symbols_plan_starts_with_equations() {
        let registry = PipelineRegistry::new(builtin_pipelines()).unwrap();
        let commands = registry.commands_for(&["symbols"]).unwrap();
        assert_eq!(commands.len(), 12);
        assert_eq!(commands[0], "extract-equations");
        assert_eq!(commands[11], "locate-symbols");
    }
}
