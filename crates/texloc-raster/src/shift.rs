//! Layout shift detection.
//!
//! Coloring an entity should change only the color of its own glyphs. If
//! anything else shows up in the diff, the colorized page reflowed and none of
//! the boxes decoded from it can be trusted.

use crate::decode::DecodeParams;
use crate::hsv::{hue_distance, rgb_to_hsv};
use image::RgbImage;
use texloc_core::{Hue, LocatorError, Result};

/// Count diff pixels not explained by the iteration's hues.
///
/// A pixel is residual when it is saturated but far from every hue in `hues`,
/// or unsaturated and darker than `residual_value_threshold` (text that moved).
#[must_use]
pub fn count_residual_pixels(diff: &RgbImage, hues: &[Hue], params: &DecodeParams) -> usize {
    diff.pixels()
        .filter(|pixel| {
            let hsv = rgb_to_hsv(pixel.0);
            if hsv.saturation > params.saturation_threshold {
                !hues
                    .iter()
                    .any(|hue| hue_distance(hsv.hue, hue.value()) <= params.hue_tolerance)
            } else {
                hsv.value < params.residual_value_threshold
            }
        })
        .count()
}

/// Fail with [`LocatorError::VisualShiftDetected`] when page `page` of a diff
/// has more residual pixels than `residual_pixel_limit`.
///
/// # Errors
///
/// See above.
pub fn detect_layout_shift(
    diff: &RgbImage,
    page: usize,
    hues: &[Hue],
    params: &DecodeParams,
) -> Result<()> {
    let residual_pixels = count_residual_pixels(diff, hues, params);
    if residual_pixels > params.residual_pixel_limit {
        return Err(LocatorError::VisualShiftDetected {
            page,
            residual_pixels,
        });
    }
    if residual_pixels > 0 {
        log::debug!("Page {page}: {residual_pixels} residual pixels, within limit");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn diff_with(pixels: &[(u32, u32, [u8; 3])]) -> RgbImage {
        let mut image = RgbImage::from_pixel(20, 20, Rgb([255, 255, 255]));
        for &(x, y, rgb) in pixels {
            image.put_pixel(x, y, Rgb(rgb));
        }
        image
    }

    #[test]
    fn test_iteration_hues_are_not_residual() {
        let hue = Hue::from_palette(0, 30);
        let diff = diff_with(&[(1, 1, hue.to_rgb8()), (2, 1, hue.to_rgb8())]);
        assert_eq!(count_residual_pixels(&diff, &[hue], &DecodeParams::default()), 0);
    }

    #[test]
    fn test_foreign_hues_and_dark_pixels_are_residual() {
        let hue = Hue::from_palette(0, 30);
        let diff = diff_with(&[
            (1, 1, Hue::from_palette(15, 30).to_rgb8()),
            (2, 2, [0, 0, 0]),
            (3, 3, [230, 230, 230]),
        ]);
        assert_eq!(count_residual_pixels(&diff, &[hue], &DecodeParams::default()), 2);
    }

    #[test]
    fn test_limit_triggers_shift() {
        let moved: Vec<(u32, u32, [u8; 3])> = (0..11).map(|x| (x, 5, [0, 0, 0])).collect();
        let diff = diff_with(&moved);
        let params = DecodeParams::default();

        let err = detect_layout_shift(&diff, 2, &[], &params).unwrap_err();
        assert!(matches!(
            err,
            LocatorError::VisualShiftDetected {
                page: 2,
                residual_pixels: 11
            }
        ));
        assert!(!err.is_fatal());

        let relaxed = DecodeParams {
            residual_pixel_limit: 11,
            ..params
        };
        assert!(detect_layout_shift(&diff, 2, &[], &relaxed).is_ok());
    }
}
