//! Axis-aligned rectangles in pixel and page-ratio space.

use super::CoordOrigin;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Axis-aligned rectangle with float coordinates.
///
/// `left`/`top` is the minimum corner, `width`/`height` are non-negative
/// extents. Equality and hashing go through [`OrderedFloat`] so rectangles can
/// live in hash sets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FloatRectangle {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl FloatRectangle {
    /// Create a rectangle from its minimum corner and extents.
    #[inline]
    #[must_use]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Create a rectangle from its edges.
    #[inline]
    #[must_use]
    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    #[inline]
    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    #[inline]
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// True when the rectangle covers no area.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Overlapping region, or `None` when the rectangles share no area.
    ///
    /// Rectangles that only touch along an edge do not intersect.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right > left && bottom > top {
            Some(Self::from_edges(left, top, right, bottom))
        } else {
            None
        }
    }

    /// True when `other` lies entirely inside this rectangle.
    #[inline]
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Smallest rectangle covering both.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        Self::from_edges(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    fn key(&self) -> [OrderedFloat<f64>; 4] {
        [
            OrderedFloat(self.left),
            OrderedFloat(self.top),
            OrderedFloat(self.width),
            OrderedFloat(self.height),
        ]
    }
}

impl PartialEq for FloatRectangle {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for FloatRectangle {}

impl Hash for FloatRectangle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for FloatRectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.4}, {:.4}, {:.4}x{:.4})",
            self.left, self.top, self.width, self.height
        )
    }
}

/// A rectangle on a specific page, normally in page-ratio coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Zero-based page index
    pub page: usize,
    pub rect: FloatRectangle,
}

impl BoundingBox {
    #[inline]
    #[must_use]
    pub const fn new(page: usize, left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            page,
            rect: FloatRectangle::new(left, top, width, height),
        }
    }

    #[inline]
    #[must_use]
    pub const fn left(&self) -> f64 {
        self.rect.left
    }

    #[inline]
    #[must_use]
    pub const fn top(&self) -> f64 {
        self.rect.top
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> f64 {
        self.rect.width
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> f64 {
        self.rect.height
    }
}

/// Rectangle in raster pixel space, top-left origin, inclusive of its edge pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    #[inline]
    #[must_use]
    pub const fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Convert to page-ratio coordinates for an image of the given size.
    ///
    /// With [`CoordOrigin::BottomLeft`] the vertical axis is flipped, and `top`
    /// holds the rectangle's lower edge measured from the bottom of the page.
    #[must_use]
    pub fn to_ratio(
        &self,
        page: usize,
        image_width: u32,
        image_height: u32,
        origin: CoordOrigin,
    ) -> BoundingBox {
        let image_width = f64::from(image_width.max(1));
        let image_height = f64::from(image_height.max(1));
        let left = f64::from(self.left) / image_width;
        let width = f64::from(self.width) / image_width;
        let height = f64::from(self.height) / image_height;
        let top = match origin {
            CoordOrigin::TopLeft => f64::from(self.top) / image_height,
            CoordOrigin::BottomLeft => {
                (image_height - f64::from(self.top) - f64::from(self.height)) / image_height
            }
        };
        BoundingBox::new(page, left, top, width, height)
    }

    /// Clamp a page-ratio box (top-left origin) to pixel space of the given image.
    #[must_use]
    pub fn from_ratio(bbox: &BoundingBox, image_width: u32, image_height: u32) -> Self {
        let to_px = |ratio: f64, extent: u32| -> u32 {
            let value = (ratio * f64::from(extent)).clamp(0.0, f64::from(extent));
            // Bounded by `extent` above, so the cast cannot truncate.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let value = value as u32;
            value
        };
        let left = to_px(bbox.left(), image_width);
        let top = to_px(bbox.top(), image_height);
        let right = to_px(bbox.left() + bbox.width(), image_width).max(left);
        let bottom = to_px(bbox.top() + bbox.height(), image_height).max(top);
        Self::new(left, top, right - left, bottom - top)
    }

    #[inline]
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.left + self.width
    }

    #[inline]
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.top + self.height
    }
}
