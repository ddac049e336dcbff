//! Representative point of a polygon feature.
//!
//! The centroid is the area-weighted (shoelace) centroid of the outer ring,
//! computed in planar longitude/latitude. Holes are ignored; for park-sized
//! polygons the difference is far below the distances being compared.

use std::collections::HashSet;

use parkfinder_core::models::{BoundingBox, GeoPoint, PolygonFeature};
use parkfinder_core::{ParkfinderError, Result};

/// Twice-area magnitudes below this fraction of the summed cross terms are
/// treated as zero area.
const ZERO_AREA_EPSILON: f64 = 1e-12;

/// Compute the centroid of a feature's outer ring.
///
/// Falls back to the mean of the distinct vertices when the ring has no
/// area (collinear or self-cancelling) or when the shoelace result lands
/// outside the ring's bounding box. Fails with `DegenerateGeometry` when
/// there is no ring or fewer than three distinct vertices.
pub fn centroid(feature: &PolygonFeature) -> Result<GeoPoint> {
    let degenerate = |reason: String| ParkfinderError::DegenerateGeometry {
        feature_id: feature.id.to_string(),
        reason,
    };

    let outer = feature
        .geometry
        .outer()
        .ok_or_else(|| degenerate("feature has no rings".to_string()))?;

    let vertices = outer.open_vertices();
    let distinct = distinct_vertices(vertices);
    if distinct.len() < 3 {
        return Err(degenerate(format!(
            "outer ring has {} distinct vertices, need at least 3",
            distinct.len()
        )));
    }

    let bbox = BoundingBox::of(outer.points())
        .ok_or_else(|| degenerate("outer ring is empty".to_string()))?;
    let mean = clamp(vertex_mean(&distinct), &bbox);
    let point = match shoelace(vertices) {
        Some(point) => {
            if bbox.contains(&point) {
                point
            } else {
                tracing::debug!(
                    feature_id = %feature.id,
                    "Shoelace centroid outside bounding box, using vertex mean"
                );
                mean
            }
        }
        None => {
            tracing::debug!(feature_id = %feature.id, "Zero-area ring, using vertex mean");
            mean
        }
    };

    GeoPoint::new(point.latitude, point.longitude).map_err(|e| degenerate(e.to_string()))
}

/// Shoelace centroid; `None` when the signed area is numerically zero.
///
/// Coordinates are taken relative to the first vertex to keep the cross
/// products small.
fn shoelace(vertices: &[GeoPoint]) -> Option<GeoPoint> {
    let origin = vertices.first()?;
    let n = vertices.len();

    let mut twice_area = 0.0;
    let mut magnitude = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;

    for i in 0..n {
        let a = &vertices[i];
        let b = &vertices[(i + 1) % n];
        let (xa, ya) = (a.longitude - origin.longitude, a.latitude - origin.latitude);
        let (xb, yb) = (b.longitude - origin.longitude, b.latitude - origin.latitude);

        let cross = xa * yb - xb * ya;
        twice_area += cross;
        magnitude += (xa * yb).abs() + (xb * ya).abs();
        cx += (xa + xb) * cross;
        cy += (ya + yb) * cross;
    }

    if !twice_area.is_finite() || twice_area.abs() <= magnitude * ZERO_AREA_EPSILON {
        return None;
    }

    Some(GeoPoint {
        latitude: origin.latitude + cy / (3.0 * twice_area),
        longitude: origin.longitude + cx / (3.0 * twice_area),
    })
}

fn distinct_vertices(vertices: &[GeoPoint]) -> Vec<GeoPoint> {
    let mut seen = HashSet::new();
    vertices
        .iter()
        .filter(|p| {
            // + 0.0 folds -0.0 into 0.0
            seen.insert(((p.latitude + 0.0).to_bits(), (p.longitude + 0.0).to_bits()))
        })
        .copied()
        .collect()
}

fn vertex_mean(points: &[GeoPoint]) -> GeoPoint {
    let n = points.len() as f64;
    let (lat, lon) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lon), p| (lat + p.latitude, lon + p.longitude));
    GeoPoint { latitude: lat / n, longitude: lon / n }
}

/// Summation rounding can push the mean of equal coordinates a hair past them
fn clamp(point: GeoPoint, bbox: &BoundingBox) -> GeoPoint {
    GeoPoint {
        latitude: point.latitude.clamp(bbox.min_latitude, bbox.max_latitude),
        longitude: point.longitude.clamp(bbox.min_longitude, bbox.max_longitude),
    }
}
