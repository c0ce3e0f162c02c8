//! Locating a hue in a page diff.

use crate::hsv::{hue_distance, rgb_to_hsv};
use crate::merge::merge_pixels;
use image::RgbImage;
use texloc_core::{BoundingBox, CoordOrigin, Hue, LocatorConfig, PixelRect};

/// Thresholds for deciding which diff pixels carry a hue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeParams {
    /// Largest circular hue distance accepted as a match
    pub hue_tolerance: f64,
    /// Pixels at or below this saturation are not colored
    pub saturation_threshold: f64,
    pub max_vertical_break: u32,
    /// Origin of the returned ratio coordinates, and of any masks passed in
    pub coord_origin: CoordOrigin,
    /// Unsaturated pixels darker than this count as residual
    pub residual_value_threshold: f64,
    /// Residual pixels tolerated before a layout shift is declared
    pub residual_pixel_limit: usize,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self::from(&LocatorConfig::default())
    }
}

impl From<&LocatorConfig> for DecodeParams {
    fn from(config: &LocatorConfig) -> Self {
        Self {
            hue_tolerance: config.hue_tolerance,
            saturation_threshold: config.saturation_threshold,
            max_vertical_break: config.max_vertical_break,
            coord_origin: config.coord_origin,
            residual_value_threshold: config.residual_value_threshold,
            residual_pixel_limit: config.residual_pixel_limit,
        }
    }
}

impl DecodeParams {
    /// Whether a pixel is saturated and within tolerance of `hue`.
    #[must_use]
    pub fn matches(&self, rgb: [u8; 3], hue: Hue) -> bool {
        let hsv = rgb_to_hsv(rgb);
        hsv.saturation > self.saturation_threshold
            && hue_distance(hsv.hue, hue.value()) <= self.hue_tolerance
    }
}

fn clip(region: &PixelRect, width: u32, height: u32) -> PixelRect {
    let left = region.left.min(width);
    let top = region.top.min(height);
    PixelRect::new(
        left,
        top,
        region.right().min(width) - left,
        region.bottom().min(height) - top,
    )
}

/// Pixel rectangles covered by `hue` in `diff`.
///
/// With `masks`, only pixels inside each mask are considered and rectangles are
/// merged per mask, so one mask never extends a rectangle from another.
#[must_use]
pub fn find_pixel_boxes(
    diff: &RgbImage,
    hue: Hue,
    params: &DecodeParams,
    masks: Option<&[PixelRect]>,
) -> Vec<PixelRect> {
    let (width, height) = diff.dimensions();
    let whole_page = [PixelRect::new(0, 0, width, height)];
    let regions = masks.unwrap_or(&whole_page);

    let mut boxes = Vec::new();
    for region in regions {
        let region = clip(region, width, height);
        let pixels: Vec<(u32, u32)> = (region.top..region.bottom())
            .flat_map(|y| (region.left..region.right()).map(move |x| (x, y)))
            .filter(|&(x, y)| params.matches(diff.get_pixel(x, y).0, hue))
            .collect();
        boxes.extend(merge_pixels(&pixels, params.max_vertical_break));
    }
    boxes
}

/// Convert a ratio mask in `origin` coordinates to pixels of a top-left image.
fn mask_to_pixels(mask: &BoundingBox, origin: CoordOrigin, width: u32, height: u32) -> PixelRect {
    let top_left = match origin {
        CoordOrigin::TopLeft => *mask,
        CoordOrigin::BottomLeft => BoundingBox::new(
            mask.page,
            mask.left(),
            1.0 - mask.top() - mask.height(),
            mask.width(),
            mask.height(),
        ),
    };
    PixelRect::from_ratio(&top_left, width, height)
}

/// Page-ratio boxes covered by `hue` on page `page` of a diff image.
///
/// Masks on other pages are ignored; when every mask is on another page
/// nothing is found. No matching pixels gives an empty result.
#[must_use]
pub fn decode(
    diff: &RgbImage,
    page: usize,
    hue: Hue,
    params: &DecodeParams,
    masks: Option<&[BoundingBox]>,
) -> Vec<BoundingBox> {
    let (width, height) = diff.dimensions();
    let pixel_masks: Option<Vec<PixelRect>> = masks.map(|masks| {
        masks
            .iter()
            .filter(|mask| mask.page == page)
            .map(|mask| mask_to_pixels(mask, params.coord_origin, width, height))
            .collect()
    });

    let boxes: Vec<BoundingBox> = find_pixel_boxes(diff, hue, params, pixel_masks.as_deref())
        .iter()
        .map(|rect| rect.to_ratio(page, width, height, params.coord_origin))
        .collect();
    log::debug!("Hue {hue} on page {page}: {} boxes", boxes.len());
    boxes
}

/// Page-ratio boxes of every hue in `hues` on page `page`, in one pass.
///
/// Each pixel is converted to HSV once and assigned to the nearest hue within
/// tolerance, so a pixel never lands in two hues' boxes. The result lists the
/// hues in input order, each with the boxes [`decode`] would find for it when
/// tolerance windows do not overlap.
#[must_use]
pub fn decode_hues(
    diff: &RgbImage,
    page: usize,
    hues: &[Hue],
    params: &DecodeParams,
) -> Vec<(Hue, Vec<BoundingBox>)> {
    let (width, height) = diff.dimensions();
    let mut pixels: Vec<Vec<(u32, u32)>> = vec![Vec::new(); hues.len()];

    if !hues.is_empty() {
        for (x, y, pixel) in diff.enumerate_pixels() {
            let hsv = rgb_to_hsv(pixel.0);
            if hsv.saturation <= params.saturation_threshold {
                continue;
            }
            let nearest = hues
                .iter()
                .map(|hue| hue_distance(hsv.hue, hue.value()))
                .enumerate()
                .filter(|(_, distance)| *distance <= params.hue_tolerance)
                .min_by(|(_, a), (_, b)| a.total_cmp(b));
            if let Some((index, _)) = nearest {
                pixels[index].push((x, y));
            }
        }
    }

    let decoded: Vec<(Hue, Vec<BoundingBox>)> = hues
        .iter()
        .zip(&pixels)
        .map(|(hue, hue_pixels)| {
            let boxes = merge_pixels(hue_pixels, params.max_vertical_break)
                .iter()
                .map(|rect| rect.to_ratio(page, width, height, params.coord_origin))
                .collect();
            (*hue, boxes)
        })
        .collect();
    log::debug!(
        "Page {page}: decoded {} hues, {} boxes",
        hues.len(),
        decoded.iter().map(|(_, boxes)| boxes.len()).sum::<usize>()
    );
    decoded
}
