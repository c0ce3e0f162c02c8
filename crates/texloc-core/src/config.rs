//! Locator configuration.
//!
//! [`LocatorConfig`] carries every tunable used by colorization, hue decoding,
//! layout-shift detection, clustering and fetching. Use
//! [`LocatorConfigBuilder`] to customize values with validation, or load a TOML
//! file with [`LocatorConfig::from_toml_file`].
//!
//! ```
//! use texloc_core::LocatorConfigBuilder;
//!
//! # fn main() -> texloc_core::Result<()> {
//! let config = LocatorConfigBuilder::new()
//!     .one_entity_at_a_time(true)
//!     .skip_visual_validation(true)
//!     .build()?;
//! assert_eq!(config.batch_size(), Some(1));
//! # Ok(())
//! # }
//! ```

use crate::error::{LocatorError, Result};
use crate::geometry::CoordOrigin;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default number of hues on the palette.
pub const DEFAULT_NUM_HUES: usize = 30;

/// Tunables shared by the locator stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Size of the hue palette, and the maximum number of entities per iteration
    pub num_hues: usize,
    /// Circular distance on the 0..1 hue wheel accepted as a match
    pub hue_tolerance: f64,
    /// Pixels at or below this saturation are not considered colored
    pub saturation_threshold: f64,
    /// Largest vertical gap (pixels) that still continues a merged rectangle
    pub max_vertical_break: u32,
    /// Origin of the coordinate system boxes are reported in
    pub coord_origin: CoordOrigin,
    /// Colorize one entity per iteration, to pinpoint compile failures
    pub one_entity_at_a_time: bool,
    /// Disable the residual-pixel layout shift check
    pub skip_visual_validation: bool,
    /// Residual pixels tolerated on a page before declaring a layout shift
    pub residual_pixel_limit: usize,
    /// Unsaturated pixels darker than this value count as residual
    pub residual_value_threshold: f64,
    /// Attempts made by remote fetches
    pub fetch_attempts: u32,
    /// Fixed delay between fetch attempts, in milliseconds
    pub fetch_backoff_ms: u64,
    /// Largest vertical gap (page ratio) joining two boxes into one cluster
    pub cluster_vertical_split: f64,
    /// Minimum IOU for a located box to count as matching an expected box
    pub minimum_iou: f64,
}

impl Default for LocatorConfig {
    #[inline]
    fn default() -> Self {
        Self {
            num_hues: DEFAULT_NUM_HUES,
            hue_tolerance: 0.01,
            saturation_threshold: 0.5,
            max_vertical_break: 1,
            coord_origin: CoordOrigin::TopLeft,
            one_entity_at_a_time: false,
            skip_visual_validation: false,
            residual_pixel_limit: 10,
            residual_value_threshold: 0.6,
            fetch_attempts: 3,
            fetch_backoff_ms: 2000,
            cluster_vertical_split: 0.005,
            minimum_iou: 0.35,
        }
    }
}

impl LocatorConfig {
    /// Load a configuration from a TOML file. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a value is
    /// out of range.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        log::debug!("Loaded locator configuration from {}", path.display());
        Ok(config)
    }

    /// Entities colorized per iteration; `None` means "as many as there are hues".
    #[inline]
    #[must_use]
    pub const fn batch_size(&self) -> Option<usize> {
        if self.one_entity_at_a_time {
            Some(1)
        } else {
            None
        }
    }

    /// Delay between fetch attempts.
    #[inline]
    #[must_use]
    pub const fn fetch_backoff(&self) -> Duration {
        Duration::from_millis(self.fetch_backoff_ms)
    }

    /// Check that every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::ConfigError`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.num_hues == 0 {
            return Err(LocatorError::config("num_hues must be at least 1"));
        }
        let hue_step = 1.0 / self.num_hues as f64;
        if !(0.0..hue_step / 2.0).contains(&self.hue_tolerance) {
            return Err(LocatorError::config(format!(
                "hue_tolerance {} must be in [0, {}) so that neighboring hues stay distinct",
                self.hue_tolerance,
                hue_step / 2.0
            )));
        }
        if !(0.0..1.0).contains(&self.saturation_threshold) {
            return Err(LocatorError::config(format!(
                "saturation_threshold {} must be in [0, 1)",
                self.saturation_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.residual_value_threshold) {
            return Err(LocatorError::config(format!(
                "residual_value_threshold {} must be in [0, 1]",
                self.residual_value_threshold
            )));
        }
        if self.fetch_attempts == 0 {
            return Err(LocatorError::config("fetch_attempts must be at least 1"));
        }
        if self.cluster_vertical_split < 0.0 {
            return Err(LocatorError::config("cluster_vertical_split must be >= 0"));
        }
        if !(0.0..=1.0).contains(&self.minimum_iou) {
            return Err(LocatorError::config(format!(
                "minimum_iou {} must be in [0, 1]",
                self.minimum_iou
            )));
        }
        Ok(())
    }
}

/// Fluent builder for [`LocatorConfig`].
#[derive(Debug, Clone, Default)]
pub struct LocatorConfigBuilder {
    config: LocatorConfig,
}

impl LocatorConfigBuilder {
    /// Start from the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    #[must_use]
    pub const fn from_config(config: LocatorConfig) -> Self {
        Self { config }
    }

    /// Set the palette size.
    #[must_use]
    pub const fn num_hues(mut self, num_hues: usize) -> Self {
        self.config.num_hues = num_hues;
        self
    }

    /// Set the hue matching tolerance.
    #[must_use]
    pub fn hue_tolerance(mut self, tolerance: f64) -> Self {
        self.config.hue_tolerance = tolerance;
        self
    }

    /// Set the "definitely colored" saturation threshold.
    #[must_use]
    pub fn saturation_threshold(mut self, threshold: f64) -> Self {
        self.config.saturation_threshold = threshold;
        self
    }

    /// Set the vertical break used by the pixel merger.
    #[must_use]
    pub const fn max_vertical_break(mut self, pixels: u32) -> Self {
        self.config.max_vertical_break = pixels;
        self
    }

    /// Set the origin of reported coordinates.
    #[must_use]
    pub const fn coord_origin(mut self, origin: CoordOrigin) -> Self {
        self.config.coord_origin = origin;
        self
    }

    /// Colorize one entity per iteration.
    #[must_use]
    pub const fn one_entity_at_a_time(mut self, enabled: bool) -> Self {
        self.config.one_entity_at_a_time = enabled;
        self
    }

    /// Skip the layout-shift check.
    #[must_use]
    pub const fn skip_visual_validation(mut self, skip: bool) -> Self {
        self.config.skip_visual_validation = skip;
        self
    }

    /// Set the residual pixel limit for layout-shift detection.
    #[must_use]
    pub const fn residual_pixel_limit(mut self, limit: usize) -> Self {
        self.config.residual_pixel_limit = limit;
        self
    }

    /// Set fetch attempts and backoff.
    #[must_use]
    pub const fn fetch_retry(mut self, attempts: u32, backoff_ms: u64) -> Self {
        self.config.fetch_attempts = attempts;
        self.config.fetch_backoff_ms = backoff_ms;
        self
    }

    /// Set the clustering vertical split.
    #[must_use]
    pub fn cluster_vertical_split(mut self, split: f64) -> Self {
        self.config.cluster_vertical_split = split;
        self
    }

    /// Set the IOU threshold used by accuracy computations.
    #[must_use]
    pub fn minimum_iou(mut self, iou: f64) -> Self {
        self.config.minimum_iou = iou;
        self
    }

    /// Validate and return the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::ConfigError`] if a value is out of range.
    pub fn build(self) -> Result<LocatorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        let config = LocatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.num_hues, 30);
        assert_eq!(config.batch_size(), None);
        assert_eq!(config.fetch_backoff(), Duration::from_secs(2));
    }

    #[test]
    fn test_builder_rejects_overlapping_hues() {
        let result = LocatorConfigBuilder::new()
            .num_hues(30)
            .hue_tolerance(0.05)
            .build();
        assert!(matches!(result, Err(LocatorError::ConfigError { .. })));
    }

    #[test]
    fn test_builder_rejects_zero_hues() {
        let err = LocatorConfigBuilder::new().num_hues(0).build().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_from_toml_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "num_hues = 10").unwrap();
        writeln!(file, "one_entity_at_a_time = true").unwrap();
        writeln!(file, "coord_origin = \"BOTTOMLEFT\"").unwrap();

        let config = LocatorConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.num_hues, 10);
        assert_eq!(config.batch_size(), Some(1));
        assert_eq!(config.coord_origin, CoordOrigin::BottomLeft);
        assert_eq!(config.max_vertical_break, 1);
    }

    #[test]
    fn test_from_toml_file_invalid_value() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fetch_attempts = 0").unwrap();
        let err = LocatorConfig::from_toml_file(file.path()).unwrap_err();
        assert!(matches!(err, LocatorError::ConfigError { .. }));
    }
}
