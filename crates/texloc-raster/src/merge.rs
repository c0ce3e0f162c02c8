//! Merging matched pixels into line rectangles.

use std::collections::BTreeMap;
use texloc_core::PixelRect;

/// Merge `(x, y)` pixels into one rectangle per vertically contiguous run.
///
/// Rows are visited top to bottom. A row more than `max_vertical_break`
/// pixels below the previous matched row starts a new rectangle; otherwise
/// the current rectangle grows to cover the row's leftmost and rightmost
/// pixels. On a page of text this approximates one rectangle per line.
#[must_use]
pub fn merge_pixels(pixels: &[(u32, u32)], max_vertical_break: u32) -> Vec<PixelRect> {
    let mut rows: BTreeMap<u32, (u32, u32)> = BTreeMap::new();
    for &(x, y) in pixels {
        rows.entry(y)
            .and_modify(|(min_x, max_x)| {
                *min_x = (*min_x).min(x);
                *max_x = (*max_x).max(x);
            })
            .or_insert((x, x));
    }

    let mut rects = Vec::new();
    // (top, bottom, min_x, max_x), edges inclusive
    let mut current: Option<(u32, u32, u32, u32)> = None;
    for (y, (min_x, max_x)) in rows {
        current = match current {
            Some((top, bottom, left, right)) if y - bottom <= max_vertical_break => {
                Some((top, y, left.min(min_x), right.max(max_x)))
            }
            Some(done) => {
                rects.push(to_rect(done));
                Some((y, y, min_x, max_x))
            }
            None => Some((y, y, min_x, max_x)),
        };
    }
    rects.extend(current.map(to_rect));
    rects
}

fn to_rect((top, bottom, left, right): (u32, u32, u32, u32)) -> PixelRect {
    PixelRect::new(left, top, right - left + 1, bottom - top + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(left: u32, top: u32, width: u32, height: u32) -> Vec<(u32, u32)> {
        (top..top + height)
            .flat_map(|y| (left..left + width).map(move |x| (x, y)))
            .collect()
    }

    #[test]
    fn test_contiguous_run_is_one_rectangle() {
        let mut pixels = block(3, 5, 4, 2);
        pixels.extend(block(1, 7, 2, 3));
        assert_eq!(merge_pixels(&pixels, 1), vec![PixelRect::new(1, 5, 6, 5)]);
    }

    #[test]
    fn test_gap_splits_runs() {
        let mut pixels = block(0, 0, 5, 3);
        pixels.extend(block(2, 6, 5, 3));
        let rects = merge_pixels(&pixels, 1);
        assert_eq!(
            rects,
            vec![PixelRect::new(0, 0, 5, 3), PixelRect::new(2, 6, 5, 3)]
        );
    }

    #[test]
    fn test_break_tolerance() {
        // Rows 0 and 2 are two apart.
        let pixels = vec![(0, 0), (0, 2)];
        assert_eq!(merge_pixels(&pixels, 1).len(), 2);
        assert_eq!(merge_pixels(&pixels, 2).len(), 1);
    }

    #[test]
    fn test_no_pixels() {
        assert!(merge_pixels(&[], 1).is_empty());
    }
}
