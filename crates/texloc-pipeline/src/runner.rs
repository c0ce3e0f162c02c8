//! The colorize, compile, diff and decode loop for one paper.
//!
//! ```text
//! colorize ─► iteration dir ─► compile ─► raster ─► diff vs baseline
//!                                │                      │
//!                   driver / compile failure     layout shift check
//!                                │                      │
//!                         discard iteration        decode hues ─► hue_locations.csv
//!                                                         │
//!                                               cluster ─► entity_locations.csv
//! ```
//!
//! A failed iteration costs only its own entities. Nothing is written to
//! `hue_locations.csv` for an iteration until every one of its pages passed
//! the layout check. Record files of an earlier run of the same paper are
//! replaced, not extended.

use crate::collaborators::{Compiler, ImageDiffer, Rasterizer};
use crate::workspace::{baseline_dir, copy_dir_all, iteration_dir, paper_dir, prepare_iteration_dir};
use image::RgbImage;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use texloc_core::{
    append_records, cluster_locations, reset_records, EntityLocationRecord, Hue,
    HueLocationRecord, HueRecord, LocatorConfig, LocatorError, Result,
};
use texloc_raster::{decode_hues, detect_layout_shift, DecodeParams};
use texloc_tex::{
    colorize, last_colorized_entity, Colorizable, ColorizeOptions, ColorizedIteration,
    DRIVER_NOT_IMPLEMENTED,
};

/// Hue to entity records, one row per colorized entity.
pub const HUES_FILE: &str = "hues.csv";
/// Located boxes, one row per box.
pub const HUE_LOCATIONS_FILE: &str = "hue_locations.csv";
/// Clustered appearances, one row per appearance of an entity.
pub const ENTITY_LOCATIONS_FILE: &str = "entity_locations.csv";
/// Entities that broke compilation when colorized on their own.
pub const COMPILE_ERRORS_FILE: &str = "compile_errors.log";

/// Sources of one paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperSource {
    pub paper_id: String,
    /// Directory holding the unpacked sources
    pub source_dir: PathBuf,
    /// Main TeX file, relative to `source_dir`
    pub tex_path: String,
}

impl PaperSource {
    #[must_use]
    pub fn tex_file(&self) -> PathBuf {
        self.source_dir.join(&self.tex_path)
    }
}

/// Outcome of locating entities in one paper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperReport {
    pub paper_id: String,
    /// Entities handed to the colorizer
    pub entities: usize,
    /// Entities that received a hue in some iteration
    pub colorized: usize,
    /// Entities with at least one located box
    pub located: usize,
    pub iterations: usize,
    /// Iterations discarded after a recoverable failure
    pub discarded_iterations: usize,
    /// Boxes written to [`HUE_LOCATIONS_FILE`]
    pub boxes: usize,
    /// Appearances written to [`ENTITY_LOCATIONS_FILE`]
    pub appearances: usize,
}

/// Runs every colorization iteration of a paper through the collaborators.
pub struct IterationRunner<'a> {
    compiler: &'a dyn Compiler,
    rasterizer: &'a dyn Rasterizer,
    differ: &'a dyn ImageDiffer,
    config: &'a LocatorConfig,
    output_root: PathBuf,
}

impl<'a> IterationRunner<'a> {
    pub fn new(
        compiler: &'a dyn Compiler,
        rasterizer: &'a dyn Rasterizer,
        differ: &'a dyn ImageDiffer,
        config: &'a LocatorConfig,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            compiler,
            rasterizer,
            differ,
            config,
            output_root: output_root.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Compile and raster the uncolored sources.
    ///
    /// Returns `None`, with a warning, when the sources do not compile: the
    /// paper cannot be processed at all.
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory cannot be prepared or a
    /// collaborator fails to run.
    pub fn render_baseline(&self, paper: &PaperSource) -> Result<Option<Vec<RgbImage>>> {
        let dir = baseline_dir(&self.output_root, &paper.paper_id);
        prepare_iteration_dir(&dir)?;
        copy_dir_all(&paper.source_dir, &dir)?;

        let result = self.compiler.compile(&dir)?;
        let output = match result.main_output() {
            Some(output) if result.success => output,
            _ => {
                log::warn!(
                    "Paper {}: uncolored sources do not compile, skipping",
                    paper.paper_id
                );
                return Ok(None);
            }
        };
        let pages = self.rasterizer.raster(output)?;
        log::debug!("Paper {}: baseline has {} pages", paper.paper_id, pages.len());
        Ok(Some(pages))
    }

    /// Colorize `entities` in `tex` and locate them against `baseline`.
    ///
    /// Hue records of every iteration go to [`HUES_FILE`]. Boxes of iterations
    /// that made it through decoding go to [`HUE_LOCATIONS_FILE`], and their
    /// clustered appearances to [`ENTITY_LOCATIONS_FILE`]. Files left by an
    /// earlier run of the paper are removed first.
    ///
    /// # Errors
    ///
    /// Returns fatal errors, and errors writing the output files. Recoverable
    /// failures of an iteration only discard that iteration.
    pub fn run<E: Colorizable + Clone>(
        &self,
        paper: &PaperSource,
        tex: &str,
        entities: &[E],
        baseline: &[RgbImage],
    ) -> Result<PaperReport> {
        let out_dir = paper_dir(&self.output_root, &paper.paper_id);
        fs::create_dir_all(&out_dir)?;
        for name in [HUES_FILE, HUE_LOCATIONS_FILE, ENTITY_LOCATIONS_FILE, COMPILE_ERRORS_FILE] {
            reset_records(out_dir.join(name))?;
        }
        let options = ColorizeOptions::from(self.config);
        let params = DecodeParams::from(self.config);

        let mut report = PaperReport {
            paper_id: paper.paper_id.clone(),
            entities: entities.len(),
            ..PaperReport::default()
        };
        let mut located: FxHashSet<String> = FxHashSet::default();

        for iteration in colorize(tex, entities, &options)? {
            report.iterations += 1;
            report.colorized += iteration.hues.len();
            let hue_records = iteration.records(&paper.tex_path);
            append_records(out_dir.join(HUES_FILE), &hue_records)?;

            match self.run_iteration(paper, &iteration, &hue_records, baseline, &params) {
                Ok(locations) => {
                    located.extend(locations.iter().map(|r| r.entity_id.clone()));
                    report.boxes += locations.len();
                    append_records(out_dir.join(HUE_LOCATIONS_FILE), &locations)?;
                    let appearances: Vec<EntityLocationRecord> =
                        cluster_locations(&locations, self.config.cluster_vertical_split)
                            .into_iter()
                            .map(|(record, _)| record)
                            .collect();
                    report.appearances += appearances.len();
                    append_records(out_dir.join(ENTITY_LOCATIONS_FILE), &appearances)?;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    log::warn!(
                        "Paper {}: discarding iteration {}: {e}",
                        paper.paper_id,
                        iteration.index
                    );
                    if matches!(e, LocatorError::CompilationFailure { entity_id: Some(_), .. }) {
                        append_compile_error(&out_dir, &e)?;
                    }
                    report.discarded_iterations += 1;
                }
            }
        }

        report.located = located.len();
        log::info!(
            "Paper {}: located {}/{} entities ({} appearances) in {} iterations ({} discarded)",
            paper.paper_id,
            report.located,
            report.entities,
            report.appearances,
            report.iterations,
            report.discarded_iterations
        );
        Ok(report)
    }

    /// Render the baseline, then [`run`](Self::run). `None` when the
    /// uncolored sources do not compile.
    ///
    /// # Errors
    ///
    /// See [`render_baseline`](Self::render_baseline) and [`run`](Self::run).
    pub fn locate<E: Colorizable + Clone>(
        &self,
        paper: &PaperSource,
        tex: &str,
        entities: &[E],
    ) -> Result<Option<PaperReport>> {
        let Some(baseline) = self.render_baseline(paper)? else {
            return Ok(None);
        };
        self.run(paper, tex, entities, &baseline).map(Some)
    }

    fn run_iteration<E: Colorizable>(
        &self,
        paper: &PaperSource,
        iteration: &ColorizedIteration<E>,
        hue_records: &[HueRecord],
        baseline: &[RgbImage],
        params: &DecodeParams,
    ) -> Result<Vec<HueLocationRecord>> {
        let dir = iteration_dir(&self.output_root, &paper.paper_id, iteration.index);
        prepare_iteration_dir(&dir)?;
        copy_dir_all(&paper.source_dir, &dir)?;
        fs::write(dir.join(&paper.tex_path), &iteration.tex)?;

        let result = self.compiler.compile(&dir)?;
        if result.stdout.contains(DRIVER_NOT_IMPLEMENTED) {
            return Err(LocatorError::DriverUnimplemented {
                tex_path: paper.tex_path.clone(),
                iteration: iteration.index,
            });
        }
        let compilation_failure = |entity_id| LocatorError::CompilationFailure {
            tex_path: paper.tex_path.clone(),
            iteration: iteration.index,
            entity_id,
        };
        if !result.success {
            let entity_id = match iteration.hues.as_slice() {
                [(_, only)] => Some(only.entity_id()),
                _ => {
                    if let Some(last) = last_colorized_entity(&result.stdout) {
                        log::debug!("Compilation stopped after colorizing '{last}'");
                    }
                    None
                }
            };
            return Err(compilation_failure(entity_id));
        }
        let Some(output) = result.main_output() else {
            return Err(compilation_failure(None));
        };

        let pages = self.rasterizer.raster(output)?;
        if pages.len() != baseline.len() {
            log::debug!(
                "Iteration {} has {} pages, baseline has {}",
                iteration.index,
                pages.len(),
                baseline.len()
            );
            return Err(LocatorError::VisualShiftDetected {
                page: pages.len().min(baseline.len()),
                residual_pixels: 0,
            });
        }

        let hues: Vec<Hue> = hue_records.iter().map(|record| record.hue).collect();
        let mut locations = Vec::new();
        for (page, (before, after)) in baseline.iter().zip(&pages).enumerate() {
            let diff = self.differ.diff(before, after)?;
            if !self.config.skip_visual_validation {
                detect_layout_shift(&diff, page, &hues, params)?;
            }
            let decoded = decode_hues(&diff, page, &hues, params);
            for (record, (_, boxes)) in hue_records.iter().zip(decoded) {
                locations.extend(boxes.iter().map(|bbox| HueLocationRecord::new(record, bbox)));
            }
        }
        Ok(locations)
    }
}

fn append_compile_error(out_dir: &Path, error: &LocatorError) -> Result<()> {
    let mut log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(out_dir.join(COMPILE_ERRORS_FILE))?;
    writeln!(log_file, "{error}")?;
    Ok(())
}
