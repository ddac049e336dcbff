//! Raw dataset to feature store.
//!
//! Ingest reprojects to WGS 84, closes open rings, drops features that have
//! no polygon or carry out-of-range coordinates, and maps raw fields onto
//! typed attributes. Degenerate rings are kept; the scanner skips them.

use std::collections::HashMap;

use parkfinder_core::config::FieldMapping;
use parkfinder_core::formats::{FormatDataset, FormatFeature};
use parkfinder_core::models::{
    Crs, FeatureAttributes, FeatureStore, GeoPoint, PolygonFeature, PolygonGeometry, Ring,
};
use parkfinder_core::Result;
use serde_json::Value;

use crate::transform::reproject_dataset;
use crate::validation::validate_polygon;

/// What happened to the features of one dataset during ingest
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    /// Features in the raw dataset
    pub total: usize,
    /// Features that made it into the store
    pub loaded: usize,
    /// Features dropped at load time
    pub rejected: Vec<RejectedFeature>,
    /// Loaded features whose geometry will not be ranked
    pub degenerate: usize,
    /// Rings that were closed by appending their first vertex
    pub closed_rings: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFeature {
    pub id: String,
    pub reason: String,
}

/// Build a feature store from a raw dataset.
///
/// Fails only when the dataset as a whole cannot be reprojected; individual
/// bad features are reported in the [`IngestReport`].
pub fn build_store(
    dataset: FormatDataset,
    fields: &FieldMapping,
    source: impl Into<String>,
) -> Result<(FeatureStore, IngestReport)> {
    let dataset = reproject_dataset(dataset, &Crs::wgs84())?;

    let mut report = IngestReport { total: dataset.features.len(), ..Default::default() };
    let mut features = Vec::with_capacity(dataset.features.len());

    for raw in dataset.features {
        match convert_feature(raw, fields, &mut report) {
            Ok(feature) => features.push(feature),
            Err(rejected) => {
                tracing::warn!(
                    feature_id = %rejected.id,
                    reason = %rejected.reason,
                    "Rejected feature"
                );
                report.rejected.push(rejected);
            }
        }
    }

    report.loaded = features.len();
    let store = FeatureStore::new(source, features);

    tracing::info!(
        source = %store.source(),
        total = report.total,
        loaded = report.loaded,
        rejected = report.rejected.len(),
        degenerate = report.degenerate,
        "Built feature store"
    );

    Ok((store, report))
}

fn convert_feature(
    raw: FormatFeature,
    fields: &FieldMapping,
    report: &mut IngestReport,
) -> std::result::Result<PolygonFeature, RejectedFeature> {
    let id = fields
        .id
        .as_ref()
        .and_then(|field| raw.properties.get(field))
        .and_then(value_as_string)
        .unwrap_or_else(|| raw.id.clone());

    let reject = |reason: String| RejectedFeature { id: id.clone(), reason };

    if !raw.is_polygonal() {
        return Err(reject(format!("no polygonal geometry ({})", raw.geometry_type)));
    }

    let mut rings = Vec::with_capacity(raw.rings.len());
    for raw_ring in &raw.rings {
        let points = raw_ring
            .iter()
            .map(|&[x, y]| {
                GeoPoint::from_lon_lat([x, y])
                    .map_err(|_| reject(format!("invalid coordinate [{}, {}]", x, y)))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut ring = Ring::new(points);
        if !ring.is_empty() && !ring.is_closed() {
            ring.close();
            report.closed_rings += 1;
        }
        rings.push(ring);
    }
    let geometry = PolygonGeometry::new(rings);

    let validation = validate_polygon(&geometry);
    if !validation.is_valid {
        report.degenerate += 1;
        tracing::debug!(
            feature_id = %id,
            reason = %validation.summary().unwrap_or_default(),
            "Loaded degenerate feature"
        );
    }

    let name = raw
        .properties
        .get(&fields.name)
        .and_then(value_as_string)
        .unwrap_or_else(|| format!("Unnamed park {}", id));

    let attributes = map_attributes(raw.properties, fields);

    Ok(PolygonFeature::new(id, name, geometry).with_attributes(attributes))
}

/// Split raw properties into amenity flags, measurements, and the rest
fn map_attributes(properties: HashMap<String, Value>, fields: &FieldMapping) -> FeatureAttributes {
    let mut attributes = FeatureAttributes::default();

    for (field, value) in properties {
        if fields.id.as_deref() == Some(field.as_str()) || field == fields.name {
            continue;
        }
        if fields.area.as_deref() == Some(field.as_str()) {
            attributes.area_sq_m = value_as_f64(&value);
        } else if fields.perimeter.as_deref() == Some(field.as_str()) {
            attributes.perimeter_m = value_as_f64(&value);
        } else if let Some(key) = fields.amenities.get(&field) {
            attributes.amenities.insert(*key, coerce_flag(&value));
        } else {
            attributes.other.insert(field, value);
        }
    }

    attributes
}

/// "Yes", "Y", "True", "1", 1 and true are set; anything else is not
pub fn coerce_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(s) => {
            matches!(s.trim().to_ascii_lowercase().as_str(), "yes" | "y" | "true" | "1")
        }
        _ => false,
    }
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(match n.as_f64() {
            // dBase numerics arrive as floats; 17.0 should read as "17"
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        }),
        _ => None,
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number.filter(|f| f.is_finite())
}
