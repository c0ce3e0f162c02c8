//! Entity pipelines and their dependency order.
//!
//! Each entity type (citations, equations, symbols, ...) is located by a
//! pipeline: an ordered list of batch command names. Pipelines may need the
//! output of other pipelines (`depends_on`) or merely prefer to run after them
//! when they are present (`optional_depends_on`). The registry orders every
//! pipeline once at startup and is read-only afterwards.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use texloc_core::{LocatorError, Result};

/// Descriptor of the commands that locate one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityPipeline {
    pub name: String,
    /// Command names, run in this order
    pub steps: Vec<String>,
    /// Pipelines whose output this one consumes
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Pipelines that must run first when they are registered
    #[serde(default)]
    pub optional_depends_on: Vec<String>,
}

impl EntityPipeline {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            depends_on: Vec::new(),
            optional_depends_on: Vec::new(),
        }
    }

    #[must_use]
    pub fn step(mut self, command: impl Into<String>) -> Self {
        self.steps.push(command.into());
        self
    }

    #[must_use]
    pub fn depends_on(mut self, pipeline: impl Into<String>) -> Self {
        self.depends_on.push(pipeline.into());
        self
    }

    #[must_use]
    pub fn optionally_depends_on(mut self, pipeline: impl Into<String>) -> Self {
        self.optional_depends_on.push(pipeline.into());
        self
    }
}

/// Dependency-ordered set of [`EntityPipeline`]s.
#[derive(Debug, Clone)]
pub struct PipelineRegistry {
    /// Pipelines in dependency order
    pipelines: Vec<EntityPipeline>,
}

impl PipelineRegistry {
    /// Register `pipelines` and compute their order.
    ///
    /// The order is built by a fixpoint: every pass admits the pipelines whose
    /// hard dependencies, and registered optional dependencies, are already
    /// ordered. Ties keep registration order.
    ///
    /// # Errors
    ///
    /// - [`LocatorError::ConfigError`] if two pipelines share a name
    /// - [`LocatorError::UnknownDependency`] if a hard dependency is not registered
    /// - [`LocatorError::DependencyCycle`] if a pass admits nothing
    pub fn new(pipelines: Vec<EntityPipeline>) -> Result<Self> {
        let mut names: FxHashSet<String> = FxHashSet::default();
        for pipeline in &pipelines {
            log::info!("Registering pipeline: {}", pipeline.name);
            if !names.insert(pipeline.name.clone()) {
                return Err(LocatorError::config(format!(
                    "pipeline '{}' registered twice",
                    pipeline.name
                )));
            }
        }

        for pipeline in &pipelines {
            if let Some(missing) = pipeline.depends_on.iter().find(|d| !names.contains(d.as_str())) {
                return Err(LocatorError::UnknownDependency {
                    pipeline: pipeline.name.clone(),
                    dependency: missing.clone(),
                });
            }
            for skipped in pipeline
                .optional_depends_on
                .iter()
                .filter(|d| !names.contains(d.as_str()))
            {
                log::debug!(
                    "Pipeline '{}': optional dependency '{skipped}' not registered",
                    pipeline.name
                );
            }
        }

        let mut ordered: FxHashSet<String> = FxHashSet::default();
        let mut remaining = pipelines;
        let mut order = Vec::with_capacity(remaining.len());

        while !remaining.is_empty() {
            let (ready, blocked): (Vec<_>, Vec<_>) = remaining.into_iter().partition(|pipeline| {
                pipeline.depends_on.iter().all(|d| ordered.contains(d))
                    && pipeline
                        .optional_depends_on
                        .iter()
                        .filter(|d| names.contains(d.as_str()))
                        .all(|d| ordered.contains(d))
            });
            if ready.is_empty() {
                return Err(LocatorError::DependencyCycle {
                    pipelines: blocked.into_iter().map(|p| p.name).collect(),
                });
            }
            ordered.extend(ready.iter().map(|p| p.name.clone()));
            order.extend(ready);
            remaining = blocked;
        }

        log::debug!(
            "Pipeline order: {}",
            order.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(" -> ")
        );
        Ok(Self { pipelines: order })
    }

    /// Every pipeline, dependencies first.
    #[inline]
    #[must_use]
    pub fn order(&self) -> &[EntityPipeline] {
        &self.pipelines
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&EntityPipeline> {
        self.pipelines.iter().find(|p| p.name == name)
    }

    /// Pipelines needed to locate the `requested` entity types: the requested
    /// pipelines and, transitively, their hard dependencies, in dependency
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::ConfigError`] for a name that is not registered.
    pub fn pipelines_for(&self, requested: &[&str]) -> Result<Vec<&EntityPipeline>> {
        let mut needed: FxHashSet<&str> = FxHashSet::default();
        for name in requested {
            let pipeline = self
                .get(name)
                .ok_or_else(|| LocatorError::config(format!("unknown entity type '{name}'")))?;
            needed.insert(pipeline.name.as_str());
        }

        // Grow the closure until a pass adds nothing.
        loop {
            let additions: Vec<&str> = self
                .pipelines
                .iter()
                .filter(|p| needed.contains(p.name.as_str()))
                .flat_map(|p| p.depends_on.iter().map(String::as_str))
                .filter(|d| !needed.contains(d))
                .collect();
            if additions.is_empty() {
                break;
            }
            needed.extend(additions);
        }

        Ok(self
            .pipelines
            .iter()
            .filter(|p| needed.contains(p.name.as_str()))
            .collect())
    }

    /// Command names to run, in order, to locate the `requested` entity types.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::ConfigError`] for a name that is not registered.
    pub fn commands_for(&self, requested: &[&str]) -> Result<Vec<&str>> {
        Ok(self
            .pipelines_for(requested)?
            .into_iter()
            .flat_map(|p| p.steps.iter().map(String::as_str))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn pipeline(name: &str) -> EntityPipeline {
        EntityPipeline::new(name)
            .step(format!("colorize-{name}"))
            .step(format!("locate-{name}"))
    }

    fn names(registry: &PipelineRegistry) -> Vec<&str> {
        registry.order().iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_dependencies_come_first() {
        let registry = PipelineRegistry::new(vec![
            pipeline("symbols").depends_on("equations"),
            pipeline("definitions").optionally_depends_on("symbols"),
            pipeline("equations"),
        ])
        .unwrap();
        assert_eq!(names(&registry), ["equations", "symbols", "definitions"]);
    }

    #[test]
    fn test_unregistered_optional_dependency_is_ignored() {
        let registry = PipelineRegistry::new(vec![
            pipeline("terms").optionally_depends_on("abbreviations"),
        ])
        .unwrap();
        assert_eq!(names(&registry), ["terms"]);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let err = PipelineRegistry::new(vec![
            pipeline("citations"),
            pipeline("a").depends_on("b"),
            pipeline("b").optionally_depends_on("a"),
        ])
        .unwrap_err();
        match err {
            LocatorError::DependencyCycle { pipelines } => assert_eq!(pipelines, ["a", "b"]),
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            PipelineRegistry::new(vec![pipeline("self").depends_on("self")]),
            Err(LocatorError::DependencyCycle { .. })
        ));
    }

    #[test]
    fn test_unknown_and_duplicate_pipelines() {
        assert!(matches!(
            PipelineRegistry::new(vec![pipeline("symbols").depends_on("equations")]),
            Err(LocatorError::UnknownDependency { .. })
        ));
        assert!(matches!(
            PipelineRegistry::new(vec![pipeline("equations"), pipeline("equations")]),
            Err(LocatorError::ConfigError { .. })
        ));
    }

    #[rstest]
    #[case(&["equations"], &["equations"])]
    #[case(&["sentences"], &["equations", "symbols", "sentences"])]
    #[case(&["citations", "symbols"], &["equations", "symbols", "citations"])]
    fn test_pipelines_for_closure(#[case] requested: &[&str], #[case] expected: &[&str]) {
        let registry = PipelineRegistry::new(vec![
            pipeline("equations"),
            pipeline("symbols").depends_on("equations"),
            pipeline("sentences").depends_on("symbols"),
            pipeline("citations").optionally_depends_on("sentences"),
        ])
        .unwrap();
        let found: Vec<&str> = registry
            .pipelines_for(requested)
            .unwrap()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_commands_for_flattens_steps() {
        let registry = PipelineRegistry::new(vec![
            pipeline("equations"),
            pipeline("symbols").depends_on("equations"),
        ])
        .unwrap();
        assert_eq!(
            registry.commands_for(&["symbols"]).unwrap(),
            [
                "colorize-equations",
                "locate-equations",
                "colorize-symbols",
                "locate-symbols"
            ]
        );
        assert!(registry.commands_for(&["glossary"]).is_err());
    }
}
