//! Grouping of located boxes into single entity appearances.
//!
//! One hue can light up several places on a page: an entity that wraps across
//! lines, or a macro expanded in more than one spot. Boxes on the same page
//! that sit within a small vertical gap of each other are treated as one
//! appearance; everything farther apart becomes a separate cluster.

use super::{BoundingBox, FloatRectangle};
use serde::{Deserialize, Serialize};

/// Default vertical gap, as a fraction of page height, joining two boxes.
pub const DEFAULT_VERTICAL_SPLIT: f64 = 0.005;

/// Boxes believed to be one logical appearance of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub page: usize,
    /// Member boxes sorted top to bottom, then left to right
    pub boxes: Vec<BoundingBox>,
}

impl Cluster {
    /// Smallest rectangle covering every member box.
    #[must_use]
    pub fn bounds(&self) -> Option<FloatRectangle> {
        let mut rects = self.boxes.iter().map(|b| b.rect);
        let first = rects.next()?;
        Some(rects.fold(first, |acc, rect| acc.merge(&rect)))
    }
}

/// Union-find over box indices, with path compression and union by rank.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            let root = self.find(self.parent[x]);
            self.parent[x] = root;
        }
        self.parent[x]
    }

    fn union(&mut self, x: usize, y: usize) {
        let root_x = self.find(x);
        let root_y = self.find(y);
        if root_x == root_y {
            return;
        }

        match self.rank[root_x].cmp(&self.rank[root_y]) {
            std::cmp::Ordering::Greater => self.parent[root_y] = root_x,
            std::cmp::Ordering::Less => self.parent[root_x] = root_y,
            std::cmp::Ordering::Equal => {
                self.parent[root_y] = root_x;
                self.rank[root_x] += 1;
            }
        }
    }
}

fn vertical_gap(a: &FloatRectangle, b: &FloatRectangle) -> f64 {
    (a.top.max(b.top) - a.bottom().min(b.bottom())).max(0.0)
}

/// Cluster same-page boxes whose vertical gap is at most `vertical_split`
/// (defaults to [`DEFAULT_VERTICAL_SPLIT`]). Joining is transitive.
///
/// Clusters are returned ordered by page, then by their topmost box.
#[must_use]
pub fn cluster_boxes(boxes: &[BoundingBox], vertical_split: Option<f64>) -> Vec<Cluster> {
    let split = vertical_split.unwrap_or(DEFAULT_VERTICAL_SPLIT);
    let mut union_find = UnionFind::new(boxes.len());

    for (i, a) in boxes.iter().enumerate() {
        for (j, b) in boxes.iter().enumerate().skip(i + 1) {
            if a.page == b.page && vertical_gap(&a.rect, &b.rect) <= split {
                union_find.union(i, j);
            }
        }
    }

    let mut groups: Vec<(usize, Vec<BoundingBox>)> = Vec::new();
    let mut group_of_root: Vec<Option<usize>> = vec![None; boxes.len()];
    for (i, bbox) in boxes.iter().enumerate() {
        let root = union_find.find(i);
        let slot = *group_of_root[root].get_or_insert_with(|| {
            groups.push((bbox.page, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(*bbox);
    }

    let by_position = |a: &BoundingBox, b: &BoundingBox| {
        a.top()
            .total_cmp(&b.top())
            .then_with(|| a.left().total_cmp(&b.left()))
    };
    let mut clusters: Vec<Cluster> = groups
        .into_iter()
        .map(|(page, mut members)| {
            members.sort_by(by_position);
            Cluster {
                page,
                boxes: members,
            }
        })
        .collect();
    clusters.sort_by(|a, b| a.page.cmp(&b.page).then_with(|| by_position(&a.boxes[0], &b.boxes[0])));
    clusters
}
