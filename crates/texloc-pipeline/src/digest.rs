//! Per entity type counts of a locator run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Counts for one entity type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
    pub extracted: usize,
    pub colorized: usize,
    /// Entities with at least one located box
    pub located: usize,
}

impl EntityCounts {
    /// Share of extracted entities that were located.
    #[must_use]
    pub fn located_ratio(&self) -> f64 {
        if self.extracted == 0 {
            0.0
        } else {
            self.located as f64 / self.extracted as f64
        }
    }
}

/// Counts keyed by entity type, in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digest {
    entities: BTreeMap<String, EntityCounts>,
}

impl Digest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn counts_mut(&mut self, entity_type: &str) -> &mut EntityCounts {
        self.entities.entry(entity_type.to_string()).or_default()
    }

    pub fn record_extracted(&mut self, entity_type: &str, count: usize) {
        self.counts_mut(entity_type).extracted += count;
    }

    pub fn record_colorized(&mut self, entity_type: &str, count: usize) {
        self.counts_mut(entity_type).colorized += count;
    }

    pub fn record_located(&mut self, entity_type: &str, count: usize) {
        self.counts_mut(entity_type).located += count;
    }

    #[must_use]
    pub fn get(&self, entity_type: &str) -> Option<&EntityCounts> {
        self.entities.get(entity_type)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Add the counts of another digest, e.g. from another paper.
    pub fn merge(&mut self, other: &Self) {
        for (entity_type, counts) in &other.entities {
            let mine = self.counts_mut(entity_type);
            mine.extracted += counts.extracted;
            mine.colorized += counts.colorized;
            mine.located += counts.located;
        }
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .entities
            .keys()
            .map(String::len)
            .chain(std::iter::once("entity".len()))
            .max()
            .unwrap_or_default();
        writeln!(
            f,
            "{:<width$}  {:>9}  {:>9}  {:>7}  {:>7}",
            "entity", "extracted", "colorized", "located", "ratio"
        )?;
        for (entity_type, counts) in &self.entities {
            writeln!(
                f,
                "{:<width$}  {:>9}  {:>9}  {:>7}  {:>6.1}%",
                entity_type,
                counts.extracted,
                counts.colorized,
                counts.located,
                counts.located_ratio() * 100.0
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_adds_counts() {
        let mut a = Digest::new();
        a.record_extracted("equations", 10);
        a.record_located("equations", 7);

        let mut b = Digest::new();
        b.record_extracted("equations", 2);
        b.record_colorized("citations", 4);

        a.merge(&b);
        assert_eq!(
            a.get("equations"),
            Some(&EntityCounts {
                extracted: 12,
                colorized: 0,
                located: 7
            })
        );
        assert_eq!(a.get("citations").map(|c| c.colorized), Some(4));
    }

    #[test]
    fn test_table_rows_in_name_order() {
        let mut digest = Digest::new();
        digest.record_extracted("equations", 4);
        digest.record_located("equations", 3);
        digest.record_extracted("citations", 0);

        let table = digest.to_string();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("entity"));
        assert!(lines[1].starts_with("citations"));
        assert!(lines[2].starts_with("equations"));
        assert!(lines[2].ends_with("75.0%"));
    }
}
