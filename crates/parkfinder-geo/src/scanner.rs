//! Nearest-feature scan over a feature store.
//!
//! One linear pass: every feature gets a centroid and a distance from the
//! origin, degenerate features are set aside, and the ranking is sorted
//! ascending. A feature is degenerate when any of its rings, holes
//! included, fails `validate_polygon`, the same rule ingest applies. Distances within a micrometer of each other count as ties
//! and are ordered by feature id, then by position in the store.

use parkfinder_core::models::{
    DistanceAnnotatedFeature, FeatureStore, GeoPoint, NearestResult, PolygonFeature, SkippedFeature,
};
use parkfinder_core::{ParkfinderError, Result};

use crate::centroid::centroid;
use crate::distance::DistanceEngine;
use crate::validation::validate_polygon;

/// Scanner bound to a distance engine
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestFeatureScanner {
    engine: DistanceEngine,
}

impl NearestFeatureScanner {
    pub fn new(engine: DistanceEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &DistanceEngine {
        &self.engine
    }

    /// Rank every usable feature in `store` by distance from `origin`.
    ///
    /// Fails with `InvalidOrigin` before any distance is computed when the
    /// origin is out of range, and with `EmptyStore` when no feature could
    /// be ranked.
    pub fn find_nearest<'a>(
        &self,
        origin: &GeoPoint,
        store: &'a FeatureStore,
    ) -> Result<NearestResult<'a>> {
        origin.validate()?;

        let mut ranked: Vec<(usize, DistanceAnnotatedFeature<'a>)> = Vec::with_capacity(store.len());
        let mut skipped = Vec::new();

        for (index, feature) in store.iter().enumerate() {
            match usable_centroid(feature) {
                Ok(center) => {
                    let distance_meters = self.engine.distance_meters(origin, &center);
                    ranked.push((
                        index,
                        DistanceAnnotatedFeature { feature, centroid: center, distance_meters },
                    ));
                }
                Err(ParkfinderError::DegenerateGeometry { feature_id, reason }) => {
                    tracing::warn!(feature_id = %feature_id, reason = %reason, "Skipping degenerate feature");
                    skipped.push(SkippedFeature { id: feature.id.clone(), reason });
                }
                Err(e) => return Err(e),
            }
        }

        // Quantized to micrometers so near-equal distances compare as ties
        // while the ordering stays total.
        ranked.sort_by(|(ia, a), (ib, b)| {
            micrometers(a.distance_meters)
                .cmp(&micrometers(b.distance_meters))
                .then_with(|| a.feature.id.cmp(&b.feature.id))
                .then_with(|| ia.cmp(ib))
        });

        let all: Vec<_> = ranked.into_iter().map(|(_, annotated)| annotated).collect();
        let skipped_count = skipped.len();

        let result = NearestResult::from_ranking(all, skipped)
            .ok_or(ParkfinderError::EmptyStore { skipped: skipped_count })?;

        let best = result.best();
        tracing::debug!(
            origin = %origin,
            ranked = result.all().len(),
            skipped = skipped_count,
            best_id = %best.feature.id,
            best_distance_m = best.distance_meters,
            "Nearest-feature scan complete"
        );

        Ok(result)
    }
}

/// Scan with the default engine (Vincenty)
pub fn find_nearest<'a>(origin: &GeoPoint, store: &'a FeatureStore) -> Result<NearestResult<'a>> {
    NearestFeatureScanner::default().find_nearest(origin, store)
}

/// Centroid of a feature whose every ring passes validation
fn usable_centroid(feature: &PolygonFeature) -> Result<GeoPoint> {
    let validation = validate_polygon(&feature.geometry);
    if let Some(reason) = validation.summary().filter(|_| !validation.is_valid) {
        return Err(ParkfinderError::DegenerateGeometry { feature_id: feature.id.to_string(), reason });
    }
    centroid(feature)
}

fn micrometers(meters: f64) -> i64 {
    (meters * 1e6).round() as i64
}
