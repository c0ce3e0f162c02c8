//! Persisted record formats.
//!
//! All formats are headerless CSV with a significant column order, so files
//! written by one batch run can be appended to by the next.
//!
//! | format                | columns                                                               |
//! |-----------------------|-----------------------------------------------------------------------|
//! | [`HueRecord`]         | `tex_path, iteration, hue, entity_id`                                 |
//! | [`HueLocationRecord`] | `tex_path, iteration, hue, entity_id, page, left, top, width, height` |
//! | [`EntityLocationRecord`] | `tex_path, entity_id, appearance, page, left, top, width, height` |

use crate::error::Result;
use crate::geometry::{cluster_boxes, BoundingBox};
use crate::hue::Hue;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;

/// Which hue an entity was colored with in one iteration of one TeX file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HueRecord {
    pub tex_path: String,
    pub iteration: usize,
    pub hue: Hue,
    pub entity_id: String,
}

/// One box where an entity's hue was found on a rendered page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HueLocationRecord {
    pub tex_path: String,
    pub iteration: usize,
    pub hue: Hue,
    pub entity_id: String,
    pub page: usize,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl HueLocationRecord {
    /// Attach a located box to the hue record it was decoded for.
    #[must_use]
    pub fn new(record: &HueRecord, bbox: &BoundingBox) -> Self {
        Self {
            tex_path: record.tex_path.clone(),
            iteration: record.iteration,
            hue: record.hue,
            entity_id: record.entity_id.clone(),
            page: bbox.page,
            left: bbox.left(),
            top: bbox.top(),
            width: bbox.width(),
            height: bbox.height(),
        }
    }

    #[must_use]
    pub const fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(self.page, self.left, self.top, self.width, self.height)
    }
}

/// The bounds of one clustered appearance of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityLocationRecord {
    pub tex_path: String,
    pub entity_id: String,
    /// Index of the appearance among the entity's clusters, page order
    pub appearance: usize,
    pub page: usize,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl EntityLocationRecord {
    #[must_use]
    pub const fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(self.page, self.left, self.top, self.width, self.height)
    }
}

/// Group located boxes by entity and cluster each entity's boxes into
/// appearances, joining boxes at most `vertical_split` apart.
///
/// Entities keep the order of their first located box. Each returned group
/// holds the member boxes of one appearance alongside its bounds record.
#[must_use]
pub fn cluster_locations(
    locations: &[HueLocationRecord],
    vertical_split: f64,
) -> Vec<(EntityLocationRecord, Vec<BoundingBox>)> {
    let mut entities: Vec<(&str, &str, Vec<BoundingBox>)> = Vec::new();
    for location in locations {
        let position = entities.iter().position(|(tex_path, entity_id, _)| {
            *tex_path == location.tex_path && *entity_id == location.entity_id
        });
        let slot = position.unwrap_or_else(|| {
            entities.push((location.tex_path.as_str(), location.entity_id.as_str(), Vec::new()));
            entities.len() - 1
        });
        entities[slot].2.push(location.bounding_box());
    }

    let mut appearances = Vec::new();
    for (tex_path, entity_id, boxes) in entities {
        let clusters = cluster_boxes(&boxes, Some(vertical_split));
        for (appearance, cluster) in clusters.into_iter().enumerate() {
            let Some(bounds) = cluster.bounds() else {
                continue;
            };
            let record = EntityLocationRecord {
                tex_path: tex_path.to_string(),
                entity_id: entity_id.to_string(),
                appearance,
                page: cluster.page,
                left: bounds.left,
                top: bounds.top,
                width: bounds.width,
                height: bounds.height,
            };
            appearances.push((record, cluster.boxes));
        }
    }
    appearances
}

/// Remove a record file left by an earlier run, if there is one.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn reset_records(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Removed stale records {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Append records to a headerless CSV file, creating it if needed.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or a record cannot be written.
pub fn append_records<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> Result<()> {
    let path = path.as_ref();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    log::debug!("Appended {} records to {}", records.len(), path.display());
    Ok(())
}

/// Read every record of a headerless CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a row does not parse.
pub fn read_records<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path.as_ref())?;
    let records = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()?;
    Ok(records)
}
