//! # texloc-raster
//!
//! Image-side half of entity location. Given the diff between a page rendered
//! from the original TeX and the same page rendered from a colorized iteration,
//! find where each hue landed.
//!
//! ```
//! use image::{Rgb, RgbImage};
//! use texloc_core::{Hue, PixelRect};
//! use texloc_raster::{find_pixel_boxes, DecodeParams};
//!
//! let hue = Hue::from_palette(7, 30);
//! let mut diff = RgbImage::from_pixel(40, 40, Rgb([255, 255, 255]));
//! for y in 10..20 {
//!     for x in 10..20 {
//!         diff.put_pixel(x, y, Rgb(hue.to_rgb8()));
//!     }
//! }
//! let boxes = find_pixel_boxes(&diff, hue, &DecodeParams::default(), None);
//! assert_eq!(boxes, vec![PixelRect::new(10, 10, 10, 10)]);
//! ```

pub mod decode;
pub mod diff;
pub mod hsv;
pub mod merge;
pub mod shift;

pub use decode::{decode, decode_hues, find_pixel_boxes, DecodeParams};
pub use diff::{diff_images, load_rgb};
pub use hsv::{hue_distance, rgb_to_hsv, Hsv};
pub use merge::merge_pixels;
pub use shift::{count_residual_pixels, detect_layout_shift};
pub use texloc_core::hue_to_rgb;
