use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::feature::{AmenityKey, PolygonFeature};

/// Snapshot of every feature available to one query cycle.
///
/// A store is built once from a fetched dataset and never mutated
/// afterwards; refreshing the data means building a new store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureStore {
    features: Vec<PolygonFeature>,
    source: String,
    loaded_at: DateTime<Utc>,
}

impl FeatureStore {
    pub fn new(source: impl Into<String>, features: Vec<PolygonFeature>) -> Self {
        Self {
            features,
            source: source.into(),
            loaded_at: Utc::now(),
        }
    }

    pub fn features(&self) -> &[PolygonFeature] {
        &self.features
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PolygonFeature> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Where the snapshot came from (file path or feed URL)
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Number of features offering each amenity
    pub fn amenity_counts(&self) -> BTreeMap<AmenityKey, usize> {
        let mut counts: BTreeMap<AmenityKey, usize> =
            AmenityKey::ALL.iter().map(|key| (*key, 0)).collect();
        for feature in &self.features {
            for amenity in feature.attributes.present_amenities() {
                *counts.entry(amenity).or_insert(0) += 1;
            }
        }
        counts
    }
}

impl<'a> IntoIterator for &'a FeatureStore {
    type Item = &'a PolygonFeature;
    type IntoIter = std::slice::Iter<'a, PolygonFeature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeatureAttributes, PolygonGeometry};

    fn park(id: &str, amenities: &[AmenityKey]) -> PolygonFeature {
        let mut attributes = FeatureAttributes::default();
        for amenity in amenities {
            attributes.amenities.insert(*amenity, true);
        }
        PolygonFeature::new(id, format!("Park {}", id), PolygonGeometry::default())
            .with_attributes(attributes)
    }

    #[test]
    fn test_store_preserves_order() {
        let store = FeatureStore::new("test", vec![park("2", &[]), park("1", &[])]);
        let ids: Vec<&str> = store.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.source(), "test");
    }

    #[test]
    fn test_amenity_counts() {
        let store = FeatureStore::new(
            "test",
            vec![
                park("1", &[AmenityKey::Playground, AmenityKey::Washrooms]),
                park("2", &[AmenityKey::Playground]),
                park("3", &[]),
            ],
        );
        let counts = store.amenity_counts();
        assert_eq!(counts[&AmenityKey::Playground], 2);
        assert_eq!(counts[&AmenityKey::Washrooms], 1);
        assert_eq!(counts[&AmenityKey::Trails], 0);
        assert_eq!(counts.len(), AmenityKey::ALL.len());
    }
}
