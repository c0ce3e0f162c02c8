//! Exact set operations on axis-aligned rectangles.
//!
//! Collections of rectangles are decomposed into disjoint pieces before areas
//! are summed, so overlapping inputs are never counted twice.

use super::{BoundingBox, FloatRectangle};
use rustc_hash::FxHashMap;

/// Cover `a` minus `a ∩ b` with at most four disjoint rectangles.
///
/// Returns `[a]` when the rectangles share no area and `[]` when `b` covers `a`.
/// Pieces are the full-width bands above and below the intersection, then the
/// left and right remainders beside it.
#[must_use]
pub fn subtract(a: &FloatRectangle, b: &FloatRectangle) -> Vec<FloatRectangle> {
    let Some(overlap) = a.intersection(b) else {
        return vec![*a];
    };

    let pieces = [
        FloatRectangle::from_edges(a.left, a.top, a.right(), overlap.top),
        FloatRectangle::from_edges(a.left, overlap.bottom(), a.right(), a.bottom()),
        FloatRectangle::from_edges(a.left, overlap.top, overlap.left, overlap.bottom()),
        FloatRectangle::from_edges(overlap.right(), overlap.top, a.right(), overlap.bottom()),
    ];
    pieces.into_iter().filter(|p| !p.is_empty()).collect()
}

/// Decompose the union of `rects` into disjoint rectangles.
#[must_use]
pub fn union(rects: &[FloatRectangle]) -> Vec<FloatRectangle> {
    let mut disjoint: Vec<FloatRectangle> = Vec::with_capacity(rects.len());
    for rect in rects.iter().filter(|r| !r.is_empty()) {
        let mut remainder = vec![*rect];
        for existing in &disjoint {
            remainder = remainder
                .iter()
                .flat_map(|piece| subtract(piece, existing))
                .collect();
            if remainder.is_empty() {
                break;
            }
        }
        disjoint.extend(remainder);
    }
    disjoint
}

/// Decompose the intersection of two rectangle collections into disjoint rectangles.
#[must_use]
pub fn intersect(first: &[FloatRectangle], second: &[FloatRectangle]) -> Vec<FloatRectangle> {
    let first = union(first);
    let second = union(second);
    first
        .iter()
        .flat_map(|a| second.iter().filter_map(move |b| a.intersection(b)))
        .collect()
}

/// Area covered by a collection of rectangles, overlaps counted once.
#[must_use]
pub fn area(rects: &[FloatRectangle]) -> f64 {
    union(rects).iter().map(FloatRectangle::area).sum()
}

/// Intersection over union of two rectangle collections.
///
/// Returns 0.0 when neither collection covers any area.
#[must_use]
pub fn iou(actual: &[FloatRectangle], expected: &[FloatRectangle]) -> f64 {
    let intersection: f64 = intersect(actual, expected)
        .iter()
        .map(FloatRectangle::area)
        .sum();
    let combined: Vec<FloatRectangle> = actual.iter().chain(expected).copied().collect();
    let union_area = area(&combined);
    if union_area > 0.0 {
        intersection / union_area
    } else {
        0.0
    }
}

/// Intersection over union of two page-box collections.
///
/// Boxes on different pages never overlap; areas are accumulated per page.
#[must_use]
pub fn iou_boxes(actual: &[BoundingBox], expected: &[BoundingBox]) -> f64 {
    let mut pages: FxHashMap<usize, (Vec<FloatRectangle>, Vec<FloatRectangle>)> =
        FxHashMap::default();
    for bbox in actual {
        pages.entry(bbox.page).or_default().0.push(bbox.rect);
    }
    for bbox in expected {
        pages.entry(bbox.page).or_default().1.push(bbox.rect);
    }

    let mut intersection = 0.0;
    let mut union_area = 0.0;
    for (page_actual, page_expected) in pages.values() {
        intersection += intersect(page_actual, page_expected)
            .iter()
            .map(FloatRectangle::area)
            .sum::<f64>();
        let combined: Vec<FloatRectangle> =
            page_actual.iter().chain(page_expected).copied().collect();
        union_area += area(&combined);
    }

    if union_area > 0.0 {
        intersection / union_area
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(left: f64, top: f64, width: f64, height: f64) -> FloatRectangle {
        FloatRectangle::new(left, top, width, height)
    }

    fn total_area(rects: &[FloatRectangle]) -> f64 {
        rects.iter().map(FloatRectangle::area).sum()
    }

    #[test]
    fn test_subtract_inner_rectangle_gives_four_pieces() {
        let a = rect(0.0, 0.0, 20.0, 20.0);
        let b = rect(5.0, 5.0, 10.0, 10.0);
        let pieces = subtract(&a, &b);
        assert_eq!(pieces.len(), 4);
        assert_eq!(total_area(&pieces), a.area() - b.area());
        for piece in &pieces {
            assert!(a.contains(piece));
            assert!(piece.intersection(&b).is_none());
        }
    }

    #[test]
    fn test_subtract_self_is_empty() {
        let a = rect(1.0, 2.0, 3.0, 4.0);
        assert!(subtract(&a, &a).is_empty());
    }

    #[test]
    fn test_subtract_disjoint_returns_original() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(20.0, 20.0, 5.0, 5.0);
        assert_eq!(subtract(&a, &b), vec![a]);
    }

    #[test]
    fn test_subtract_covering_rectangle() {
        let a = rect(2.0, 2.0, 2.0, 2.0);
        let b = rect(0.0, 0.0, 10.0, 10.0);
        assert!(subtract(&a, &b).is_empty());
    }

    #[test]
    fn test_subtract_edge_overlap() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(5.0, -5.0, 10.0, 20.0);
        let pieces = subtract(&a, &b);
        assert_eq!(pieces, vec![rect(0.0, 0.0, 5.0, 10.0)]);
    }

    #[test]
    fn test_union_counts_overlap_once() {
        let rects = [rect(0.0, 0.0, 10.0, 10.0), rect(5.0, 5.0, 10.0, 10.0)];
        let pieces = union(&rects);
        assert_eq!(total_area(&pieces), 175.0);
        for (i, a) in pieces.iter().enumerate() {
            for b in &pieces[i + 1..] {
                assert!(a.intersection(b).is_none());
            }
        }
    }

    #[test]
    fn test_intersect_collections() {
        let first = [rect(0.0, 0.0, 10.0, 10.0), rect(20.0, 0.0, 10.0, 10.0)];
        let second = [rect(5.0, 0.0, 20.0, 5.0)];
        assert_eq!(total_area(&intersect(&first, &second)), 25.0 + 25.0);
    }

    #[test]
    fn test_iou_identity_and_empty() {
        let x = [rect(0.0, 0.0, 4.0, 4.0), rect(2.0, 2.0, 4.0, 4.0)];
        assert!((iou(&x, &x) - 1.0).abs() < 1e-12);
        assert_eq!(iou(&[], &x), 0.0);
        assert_eq!(iou(&[], &[]), 0.0);
    }

    #[test]
    fn test_iou_half_overlap() {
        let a = [rect(0.0, 0.0, 10.0, 10.0)];
        let b = [rect(5.0, 0.0, 10.0, 10.0)];
        assert!((iou(&a, &b) - 50.0 / 150.0).abs() < 1e-12);
    }

    #[test]
    fn test_iou_boxes_ignores_other_pages() {
        let a = [BoundingBox::new(0, 0.0, 0.0, 0.5, 0.5)];
        let b = [BoundingBox::new(1, 0.0, 0.0, 0.5, 0.5)];
        assert_eq!(iou_boxes(&a, &b), 0.0);
        assert!((iou_boxes(&a, &a) - 1.0).abs() < 1e-12);
    }
}
