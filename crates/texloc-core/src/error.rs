//! Error types for entity location.
//!
//! Every stage of the locator reports failures through [`LocatorError`]. The
//! variants are split by [`Severity`]: fatal errors indicate a bug in a grammar
//! or a broken pipeline registry and must stop the process, recoverable errors
//! are isolated to one entity, one colorization iteration or one batch item.
//!
//! # Examples
//!
//! ```
//! use texloc_core::{LocatorError, Severity};
//!
//! let err = LocatorError::VisualShiftDetected {
//!     page: 3,
//!     residual_pixels: 412,
//! };
//! assert_eq!(err.severity(), Severity::Recoverable);
//! assert!(!err.is_fatal());
//! ```

use std::fmt;
use thiserror::Error;

/// How far an error is allowed to propagate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Abort immediately, nothing downstream can be trusted.
    Fatal,
    /// Log, drop the affected unit of work and continue.
    Recoverable,
}

impl fmt::Display for Severity {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fatal => write!(f, "fatal"),
            Self::Recoverable => write!(f, "recoverable"),
        }
    }
}

/// Errors raised while scanning, colorizing, decoding or orchestrating.
#[derive(Error, Debug)]
pub enum LocatorError {
    /// Two scanner patterns matched at the same position.
    ///
    /// This is a grammar definition bug, never a property of the input.
    #[error("ambiguous scanner grammar at byte {position}: patterns {patterns:?} all match")]
    ParseAmbiguity {
        /// Byte offset where the patterns collided
        position: usize,
        /// Names of the colliding patterns
        patterns: Vec<String>,
    },

    /// An entity has no usable character range in the TeX source.
    #[error("entity '{entity_id}' has no resolvable span: {reason}")]
    UnresolvableSpan {
        /// Identifier of the skipped entity
        entity_id: String,
        /// Why the span could not be used
        reason: String,
    },

    /// The TeX engine has no color stack under the active driver.
    #[error("color driver not implemented for {tex_path} (iteration {iteration})")]
    DriverUnimplemented {
        /// TeX file that was compiled
        tex_path: String,
        /// Colorization iteration that was abandoned
        iteration: usize,
    },

    /// Compilation of a colorized iteration failed.
    #[error("compilation failed for {tex_path} (iteration {iteration}){}", offending_suffix(.entity_id))]
    CompilationFailure {
        /// TeX file that was compiled
        tex_path: String,
        /// Colorization iteration that was discarded
        iteration: usize,
        /// Entity that broke compilation, known when colorizing one entity at a time
        entity_id: Option<String>,
    },

    /// Residual non-target pixels in a diff suggest the layout moved.
    #[error("layout shift detected on page {page}: {residual_pixels} residual pixels")]
    VisualShiftDetected {
        /// Page whose diff carried residual pixels
        page: usize,
        /// Number of pixels not explained by the iteration's hues
        residual_pixels: usize,
    },

    /// A remote fetch failed after all attempts were used.
    #[error("failed to fetch '{item}' after {attempts} attempts: {reason}")]
    FetchFailure {
        /// Item that was being fetched (e.g. an arXiv identifier)
        item: String,
        /// Number of attempts made
        attempts: u32,
        /// Last error reported by the fetcher
        reason: String,
    },

    /// Entity pipelines declare cyclic dependencies.
    #[error("dependency cycle among pipelines: {}", .pipelines.join(", "))]
    DependencyCycle {
        /// Pipelines that could not be ordered
        pipelines: Vec<String>,
    },

    /// An entity pipeline depends on a pipeline that was never registered.
    #[error("pipeline '{pipeline}' depends on unknown pipeline '{dependency}'")]
    UnknownDependency {
        /// Pipeline declaring the dependency
        pipeline: String,
        /// Missing dependency name
        dependency: String,
    },

    /// Invalid configuration or grammar definition.
    #[error("invalid configuration: {reason}")]
    ConfigError {
        /// What is invalid
        reason: String,
    },

    /// File system error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image could not be read, written or compared.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Record file could not be read or written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration file could not be parsed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

fn offending_suffix(entity_id: &Option<String>) -> String {
    entity_id
        .as_ref()
        .map(|id| format!(", offending entity '{id}'"))
        .unwrap_or_default()
}

impl LocatorError {
    /// Severity of this error.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::ParseAmbiguity { .. }
            | Self::DependencyCycle { .. }
            | Self::UnknownDependency { .. }
            | Self::ConfigError { .. } => Severity::Fatal,
            Self::UnresolvableSpan { .. }
            | Self::DriverUnimplemented { .. }
            | Self::CompilationFailure { .. }
            | Self::VisualShiftDetected { .. }
            | Self::FetchFailure { .. }
            | Self::Io(_)
            | Self::Image(_)
            | Self::Csv(_)
            | Self::Toml(_) => Severity::Recoverable,
        }
    }

    /// Returns true if this error must abort the process.
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self.severity(), Severity::Fatal)
    }

    /// Shorthand for a [`LocatorError::ConfigError`].
    #[must_use]
    pub fn config(reason: impl Into<String>) -> Self {
        Self::ConfigError {
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the locator crates.
pub type Result<T> = std::result::Result<T, LocatorError>;
