//! Core types shared by the texloc crates.
//!
//! - [`error`]: the [`LocatorError`] enum and its [`Severity`] split
//! - [`config`]: [`LocatorConfig`] tunables and their builder
//! - [`hue`]: the cyclic [`Hue`] palette
//! - [`geometry`]: page boxes, rectangle algebra, IOU, accuracy and clustering
//! - [`records`]: the headerless CSV formats written by a batch run

pub mod config;
pub mod error;
pub mod geometry;
pub mod hue;
pub mod records;

pub use config::{LocatorConfig, LocatorConfigBuilder, DEFAULT_NUM_HUES};
pub use error::{LocatorError, Result, Severity};
pub use geometry::{
    area, cluster_boxes, compute_accuracy, intersect, iou, iou_boxes, subtract, union, Accuracy,
    BoundingBox, Cluster, CoordOrigin, FloatRectangle, PixelRect,
};
pub use hue::{hue_to_rgb, Hue, HueCycle};
pub use records::{
    append_records, cluster_locations, read_records, reset_records, EntityLocationRecord,
    HueLocationRecord, HueRecord,
};
