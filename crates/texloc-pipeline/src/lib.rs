//! # texloc-pipeline
//!
//! Orchestration of entity location over batches of papers.
//!
//! - [`command`]: load / process / save batch commands and their driver
//! - [`registry`]: entity pipelines ordered by their dependencies
//! - [`runner`]: the colorize, compile, diff and decode loop for one paper
//! - [`collaborators`]: compiler, rasterizer and image diff interfaces
//! - [`fetch`] and [`retry`]: source downloads with bounded retries
//! - [`digest`]: per entity type counts
//! - [`evaluate`]: precision and recall against hand-labelled boxes
//!
//! ## Example
//!
//! ```
//! use texloc_pipeline::{EntityPipeline, PipelineRegistry};
//!
//! let registry = PipelineRegistry::new(vec![
//!     EntityPipeline::new("symbols")
//!         .step("colorize-symbols")
//!         .depends_on("equations"),
//!     EntityPipeline::new("equations").step("colorize-equations"),
//! ])
//! .unwrap();
//!
//! assert_eq!(
//!     registry.commands_for(&["symbols"]).unwrap(),
//!     ["colorize-equations", "colorize-symbols"]
//! );
//! ```

pub mod collaborators;
pub mod command;
pub mod digest;
pub mod evaluate;
pub mod fetch;
pub mod locate;
pub mod registry;
pub mod retry;
pub mod runner;
pub mod workspace;

pub use collaborators::{
    CompilationResult, Compiler, ImageDiffer, PageImageRasterizer, PixelDiffer, Rasterizer,
};
pub use command::{run_command, run_command_observed, BatchState, BatchStats, Command};
pub use digest::{Digest, EntityCounts};
pub use evaluate::{evaluate_locations, ExpectedLocation};
pub use fetch::{fetch_with_retry, FetchSources, Fetcher};
pub use locate::LocateEntities;
pub use registry::{EntityPipeline, PipelineRegistry};
pub use retry::retry_with_backoff;
pub use runner::{
    IterationRunner, PaperReport, PaperSource, COMPILE_ERRORS_FILE, ENTITY_LOCATIONS_FILE,
    HUES_FILE, HUE_LOCATIONS_FILE,
};
pub use workspace::{copy_dir_all, iteration_dir, prepare_iteration_dir};
