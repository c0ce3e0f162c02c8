//! Rectangle geometry: page boxes, exact rectangle algebra, IOU, accuracy
//! against ground truth, and clustering of boxes into entity appearances.

pub mod accuracy;
pub mod algebra;
pub mod cluster;
pub mod rectangle;

pub use accuracy::{compute_accuracy, Accuracy};
pub use algebra::{area, intersect, iou, iou_boxes, subtract, union};
pub use cluster::{cluster_boxes, Cluster, DEFAULT_VERTICAL_SPLIT};
pub use rectangle::{BoundingBox, FloatRectangle, PixelRect};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate origin for page boxes.
///
/// Raster images put the origin at the top-left corner; PDF user space puts it
/// at the bottom-left. Boxes always store the minimum corner along both axes of
/// their coordinate system, so the algebra works identically in either.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoordOrigin {
    /// Top-left origin (y increases downward)
    #[default]
    #[serde(rename = "TOPLEFT")]
    TopLeft,
    /// Bottom-left origin (y increases upward)
    #[serde(rename = "BOTTOMLEFT")]
    BottomLeft,
}

impl fmt::Display for CoordOrigin {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TopLeft => write!(f, "top-left"),
            Self::BottomLeft => write!(f, "bottom-left"),
        }
    }
}

impl std::str::FromStr for CoordOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .to_lowercase()
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();

        match normalized.as_str() {
            "topleft" | "top-left" | "tl" => Ok(Self::TopLeft),
            "bottomleft" | "bottom-left" | "bl" => Ok(Self::BottomLeft),
            _ => Err(format!(
                "unknown coord origin: '{s}' (expected: top-left, bottom-left)"
            )),
        }
    }
}
