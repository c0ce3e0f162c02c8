//! Pixelwise difference of two renderings of the same page.

use image::error::{ParameterError, ParameterErrorKind};
use image::{ImageError, Rgb, RgbImage};
use std::path::Path;
use texloc_core::Result;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Difference of a baseline page `a` and a colorized page `b`.
///
/// Pixels equal in both images become white; every other pixel keeps its color
/// from `b`. What remains is the colored entities, plus anything that moved.
///
/// # Errors
///
/// Returns [`texloc_core::LocatorError::Image`] if the images differ in size.
pub fn diff_images(a: &RgbImage, b: &RgbImage) -> Result<RgbImage> {
    if a.dimensions() != b.dimensions() {
        log::warn!(
            "Cannot diff pages of different sizes: {:?} vs {:?}",
            a.dimensions(),
            b.dimensions()
        );
        return Err(ImageError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::DimensionMismatch,
        ))
        .into());
    }

    let (width, height) = b.dimensions();
    Ok(RgbImage::from_fn(width, height, |x, y| {
        let after = *b.get_pixel(x, y);
        if *a.get_pixel(x, y) == after {
            WHITE
        } else {
            after
        }
    }))
}

/// Load an image from disk as 8-bit RGB.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded.
pub fn load_rgb(path: impl AsRef<Path>) -> Result<RgbImage> {
    Ok(image::open(path.as_ref())?.to_rgb8())
}
