//! GeoJSON map of a lookup: origin, nearest park, route

use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use parkfinder_core::models::GeoPoint;
use parkfinder_lookup::LookupOutcome;
use serde_json::Value as JsonValue;
use std::path::Path;

/// Build a FeatureCollection for one lookup: origin marker, nearest park
/// centroid marker, nearest park polygon and, when known, the route line
pub fn build_map(outcome: &LookupOutcome<'_>) -> FeatureCollection {
    let best = outcome.nearest.best();
    let mut features = Vec::with_capacity(4);

    let mut origin = JsonObject::new();
    origin.insert("role".to_string(), JsonValue::from("origin"));
    origin.insert("marker-color".to_string(), JsonValue::from("#d62728"));
    features.push(feature(point(&outcome.origin), origin));

    let mut centroid = JsonObject::new();
    centroid.insert("role".to_string(), JsonValue::from("nearest"));
    centroid.insert("name".to_string(), JsonValue::from(best.feature.name.clone()));
    centroid.insert("distance_meters".to_string(), JsonValue::from(best.distance_meters));
    centroid.insert("marker-color".to_string(), JsonValue::from("#2ca02c"));
    features.push(feature(point(&best.centroid), centroid));

    let rings = best
        .feature
        .geometry
        .to_geojson_coordinates()
        .into_iter()
        .map(|ring| ring.into_iter().map(|[lon, lat]| vec![lon, lat]).collect())
        .collect();
    let mut polygon = JsonObject::new();
    polygon.insert("role".to_string(), JsonValue::from("park"));
    polygon.insert("id".to_string(), JsonValue::from(best.feature.id.as_str()));
    polygon.insert("name".to_string(), JsonValue::from(best.feature.name.clone()));
    polygon.insert("fill".to_string(), JsonValue::from("#2ca02c"));
    features.push(feature(Geometry::new(Value::Polygon(rings)), polygon));

    if let Some(path) = outcome.route.as_ref().and_then(|r| r.path.as_ref()) {
        if path.len() >= 2 {
            let line = path.iter().map(|p| vec![p.longitude, p.latitude]).collect();
            let mut route = JsonObject::new();
            route.insert("role".to_string(), JsonValue::from("route"));
            route.insert("mode".to_string(), JsonValue::from(outcome.mode.to_string()));
            if let Some(minutes) = outcome.duration_minutes() {
                route.insert("duration_minutes".to_string(), JsonValue::from(minutes));
            }
            features.push(feature(Geometry::new(Value::LineString(line)), route));
        }
    }

    FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    }
}

/// Write the map, replacing any previous export
pub fn write_map(path: &Path, outcome: &LookupOutcome<'_>) -> Result<()> {
    let collection = build_map(outcome);
    std::fs::write(path, collection.to_string())
        .with_context(|| format!("Failed to write map to {}", path.display()))?;
    tracing::debug!(path = %path.display(), features = collection.features.len(), "Wrote map");
    Ok(())
}

fn point(p: &GeoPoint) -> Geometry {
    Geometry::new(Value::Point(vec![p.longitude, p.latitude]))
}

fn feature(geometry: Geometry, properties: JsonObject) -> Feature {
    Feature {
        geometry: Some(geometry),
        properties: Some(properties),
        id: None,
        bbox: None,
        foreign_members: None,
    }
}
