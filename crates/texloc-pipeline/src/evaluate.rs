//! Scoring located entities against hand-labelled boxes.

use serde::{Deserialize, Serialize};
use texloc_core::{cluster_locations, compute_accuracy, Accuracy, BoundingBox, HueLocationRecord};

/// A hand-labelled appearance of an entity.
///
/// Stored as headerless CSV: `entity_id, page, left, top, width, height`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedLocation {
    pub entity_id: String,
    pub page: usize,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ExpectedLocation {
    #[must_use]
    pub const fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(self.page, self.left, self.top, self.width, self.height)
    }
}

/// Precision and recall of located boxes against `expected`.
///
/// Located boxes are clustered into appearances with `vertical_split`, then
/// matched per entity: an appearance only counts for an expected box of the
/// same entity, and only when their IOU reaches `minimum_iou`. Indices in the
/// returned matches refer to the appearance order of [`cluster_locations`]
/// and to `expected`.
#[must_use]
pub fn evaluate_locations(
    locations: &[HueLocationRecord],
    expected: &[ExpectedLocation],
    minimum_iou: f64,
    vertical_split: f64,
) -> Accuracy {
    let appearances = cluster_locations(locations, vertical_split);

    let mut entity_ids: Vec<&str> = Vec::new();
    for id in appearances
        .iter()
        .map(|(record, _)| record.entity_id.as_str())
        .chain(expected.iter().map(|e| e.entity_id.as_str()))
    {
        if !entity_ids.contains(&id) {
            entity_ids.push(id);
        }
    }

    let mut matches = Vec::new();
    for entity_id in entity_ids {
        let (group_indices, groups): (Vec<usize>, Vec<Vec<BoundingBox>>) = appearances
            .iter()
            .enumerate()
            .filter(|(_, (record, _))| record.entity_id == entity_id)
            .map(|(index, (_, boxes))| (index, boxes.clone()))
            .unzip();
        let (expected_indices, targets): (Vec<usize>, Vec<BoundingBox>) = expected
            .iter()
            .enumerate()
            .filter(|(_, e)| e.entity_id == entity_id)
            .map(|(index, e)| (index, e.bounding_box()))
            .unzip();
        if groups.is_empty() || targets.is_empty() {
            continue;
        }
        let accuracy = compute_accuracy(&groups, &targets, minimum_iou);
        matches.extend(
            accuracy
                .matches
                .into_iter()
                .map(|(group, target)| (group_indices[group], expected_indices[target])),
        );
    }
    matches.sort_by_key(|&(_, target)| target);

    let ratio = |count: usize, total: usize| {
        if total == 0 {
            0.0
        } else {
            count as f64 / total as f64
        }
    };
    let accuracy = Accuracy {
        precision: ratio(matches.len(), appearances.len()),
        recall: ratio(matches.len(), expected.len()),
        matches,
    };
    log::info!(
        "Evaluated {} appearances against {} expected boxes: precision {:.3}, recall {:.3}",
        appearances.len(),
        expected.len(),
        accuracy.precision,
        accuracy.recall
    );
    accuracy
}

#[cfg(test)]
mod tests {
    use super::*;
    use texloc_core::{Hue, HueRecord};

    fn located(entity_id: &str, left: f64, top: f64) -> HueLocationRecord {
        let record = HueRecord {
            tex_path: "main.tex".to_string(),
            iteration: 0,
            hue: Hue::from_palette(0, 30),
            entity_id: entity_id.to_string(),
        };
        HueLocationRecord::new(&record, &BoundingBox::new(0, left, top, 0.2, 0.01))
    }

    fn expected(entity_id: &str, left: f64, top: f64, height: f64) -> ExpectedLocation {
        ExpectedLocation {
            entity_id: entity_id.to_string(),
            page: 0,
            left,
            top,
            width: 0.2,
            height,
        }
    }

    #[test]
    fn test_wrapped_entity_matches_one_label() {
        let locations = [located("equation-0", 0.1, 0.100), located("equation-0", 0.1, 0.112)];
        let labels = [expected("equation-0", 0.1, 0.100, 0.022)];

        let accuracy = evaluate_locations(&locations, &labels, 0.35, 0.005);

        assert_eq!(accuracy.matches, vec![(0, 0)]);
        assert_eq!(accuracy.precision, 1.0);
        assert_eq!(accuracy.recall, 1.0);
    }

    #[test]
    fn test_unclustered_lines_halve_precision() {
        let locations = [located("equation-0", 0.1, 0.100), located("equation-0", 0.1, 0.112)];
        let labels = [expected("equation-0", 0.1, 0.100, 0.022)];

        let accuracy = evaluate_locations(&locations, &labels, 0.35, 0.0);

        assert_eq!(accuracy.precision, 0.5);
        assert_eq!(accuracy.recall, 1.0);
    }

    #[test]
    fn test_boxes_only_match_their_own_entity() {
        let locations = [located("citation-0", 0.1, 0.5)];
        let labels = [expected("citation-1", 0.1, 0.5, 0.01)];

        let accuracy = evaluate_locations(&locations, &labels, 0.35, 0.005);

        assert!(accuracy.matches.is_empty());
        assert_eq!(accuracy.precision, 0.0);
        assert_eq!(accuracy.recall, 0.0);
    }

    #[test]
    fn test_minimum_iou_is_honored() {
        let locations = [located("citation-0", 0.1, 0.5)];
        let labels = [expected("citation-0", 0.2, 0.5, 0.01)];

        let loose = evaluate_locations(&locations, &labels, 0.3, 0.005);
        let strict = evaluate_locations(&locations, &labels, 0.5, 0.005);

        assert_eq!(loose.matches, vec![(0, 0)]);
        assert!(strict.matches.is_empty());
    }
}
