//! The finite hue palette used to tag entities.
//!
//! A palette of `H` hues spaces values evenly on the unit hue wheel, `i / H`
//! for `i` in `0..H`. One colorization iteration draws from a fresh
//! [`HueCycle`], so hues are pairwise distinct inside an iteration and repeat
//! across iterations; `(hue, iteration)` identifies an entity.

use crate::config::DEFAULT_NUM_HUES;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A position on the unit hue wheel, in `[0, 1)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hue(f64);

impl Hue {
    /// Wrap a raw hue value into `[0, 1)`.
    #[must_use]
    pub fn new(value: f64) -> Self {
        let wrapped = value.rem_euclid(1.0);
        // rem_euclid can round up to exactly 1.0 for tiny negative inputs
        Self(if wrapped >= 1.0 { 0.0 } else { wrapped })
    }

    /// The `index`-th hue of a palette with `num_hues` entries.
    #[must_use]
    pub fn from_palette(index: usize, num_hues: usize) -> Self {
        Self::new(index as f64 / num_hues.max(1) as f64)
    }

    #[inline]
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Fully saturated, full-value RGB color for this hue, channels in `[0, 1]`.
    #[must_use]
    pub fn to_rgb(self) -> [f64; 3] {
        hue_to_rgb(self.0)
    }

    /// Like [`Hue::to_rgb`], quantized to 8-bit channels.
    #[must_use]
    pub fn to_rgb8(self) -> [u8; 3] {
        self.to_rgb().map(|channel| {
            // Clamped to [0, 255] first, so the cast is exact.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let byte = (channel * 255.0).round().clamp(0.0, 255.0) as u8;
            byte
        })
    }
}

impl PartialEq for Hue {
    fn eq(&self, other: &Self) -> bool {
        OrderedFloat(self.0) == OrderedFloat(other.0)
    }
}

impl Eq for Hue {}

impl Hash for Hue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        OrderedFloat(self.0).hash(state);
    }
}

impl PartialOrd for Hue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Hue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        OrderedFloat(self.0).cmp(&OrderedFloat(other.0))
    }
}

impl fmt::Display for Hue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// Convert a hue in `[0, 1)` at full saturation and value to RGB in `[0, 1]`.
#[must_use]
pub fn hue_to_rgb(hue: f64) -> [f64; 3] {
    let h = hue.rem_euclid(1.0) * 6.0;
    let x = 1.0 - ((h % 2.0) - 1.0).abs();
    match h {
        h if h < 1.0 => [1.0, x, 0.0],
        h if h < 2.0 => [x, 1.0, 0.0],
        h if h < 3.0 => [0.0, 1.0, x],
        h if h < 4.0 => [0.0, x, 1.0],
        h if h < 5.0 => [x, 0.0, 1.0],
        _ => [1.0, 0.0, x],
    }
}

/// Hands out each hue of a palette once, in order, then runs dry.
#[derive(Debug, Clone)]
pub struct HueCycle {
    num_hues: usize,
    next: usize,
}

impl HueCycle {
    #[must_use]
    pub const fn new(num_hues: usize) -> Self {
        Self { num_hues, next: 0 }
    }

    /// Hues left before the palette is exhausted.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.num_hues.saturating_sub(self.next)
    }
}

impl Default for HueCycle {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_HUES)
    }
}

impl Iterator for HueCycle {
    type Item = Hue;

    fn next(&mut self) -> Option<Hue> {
        if self.next >= self.num_hues {
            return None;
        }
        let hue = Hue::from_palette(self.next, self.num_hues);
        self.next += 1;
        Some(hue)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

impl ExactSizeIterator for HueCycle {}
