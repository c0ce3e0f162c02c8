//! Precision and recall of located boxes against ground truth.

use super::{iou_boxes, BoundingBox};
use serde::{Deserialize, Serialize};

/// Result of [`compute_accuracy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accuracy {
    /// Matched groups over all actual groups (0.0 when there are none)
    pub precision: f64,
    /// Matched expected boxes over all expected boxes (0.0 when there are none)
    pub recall: f64,
    /// `(actual group index, expected box index)` pairs, in expected order
    pub matches: Vec<(usize, usize)>,
}

/// Match expected boxes against groups of located boxes.
///
/// Each group holds the rectangles of one logical instance. For every expected
/// box in order, the first unmatched group whose IOU with it reaches
/// `minimum_iou` is taken. The assignment is greedy, not globally optimal.
#[must_use]
pub fn compute_accuracy(
    actual_groups: &[Vec<BoundingBox>],
    expected: &[BoundingBox],
    minimum_iou: f64,
) -> Accuracy {
    let mut taken = vec![false; actual_groups.len()];
    let mut matches = Vec::with_capacity(expected.len().min(actual_groups.len()));

    for (expected_index, expected_box) in expected.iter().enumerate() {
        let target = std::slice::from_ref(expected_box);
        let found = actual_groups
            .iter()
            .enumerate()
            .find(|(index, group)| !taken[*index] && iou_boxes(group, target) >= minimum_iou);
        if let Some((actual_index, _)) = found {
            taken[actual_index] = true;
            matches.push((actual_index, expected_index));
        }
    }

    let ratio = |count: usize, total: usize| {
        if total == 0 {
            0.0
        } else {
            count as f64 / total as f64
        }
    };
    let accuracy = Accuracy {
        precision: ratio(matches.len(), actual_groups.len()),
        recall: ratio(matches.len(), expected.len()),
        matches,
    };
    log::debug!(
        "Accuracy: precision {:.3}, recall {:.3} ({} matches)",
        accuracy.precision,
        accuracy.recall,
        accuracy.matches.len()
    );
    accuracy
}
