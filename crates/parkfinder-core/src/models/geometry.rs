//! Canonical geometry types used across all parkfinder crates.
//!
//! Coordinates are geographic (WGS 84) once they enter these types. Raw
//! dataset coordinates in other reference systems are reprojected during
//! ingest before a [`GeoPoint`] is ever built from them.

use serde::{Deserialize, Serialize};

use crate::error::{ParkfinderError, Result};

/// Coordinate Reference System identified by EPSG code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: u32,
    pub name: String,
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Crs {
    pub fn new(epsg: u32, name: impl Into<String>) -> Self {
        Self { epsg, name: name.into() }
    }

    /// WGS 84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::new(4326, "WGS 84")
    }

    /// Build a CRS from a bare EPSG code, naming the common ones
    pub fn from_epsg(epsg: u32) -> Self {
        match epsg {
            4326 => Self::wgs84(),
            3857 => Self::new(3857, "Web Mercator"),
            26910 => Self::new(26910, "NAD83 / UTM zone 10N"),
            _ => Self::new(epsg, format!("EPSG:{}", epsg)),
        }
    }

    pub fn is_geographic_wgs84(&self) -> bool {
        self.epsg == 4326
    }
}

/// A latitude/longitude pair in decimal degrees.
///
/// Both coordinates must be finite, latitude within [-90, 90] and longitude
/// within [-180, 180]. Use [`GeoPoint::new`] to build a checked point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a validated point
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let point = Self { latitude, longitude };
        point.validate()?;
        Ok(point)
    }

    /// Check the range invariant
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(ParkfinderError::InvalidOrigin {
                reason: format!(
                    "coordinates must be finite, got ({}, {})",
                    self.latitude, self.longitude
                ),
            });
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ParkfinderError::InvalidOrigin {
                reason: format!("latitude {} is outside [-90, 90]", self.latitude),
            });
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ParkfinderError::InvalidOrigin {
                reason: format!("longitude {} is outside [-180, 180]", self.longitude),
            });
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Build from an `[x, y]` (longitude, latitude) position
    pub fn from_lon_lat(position: [f64; 2]) -> Result<Self> {
        Self::new(position[1], position[0])
    }

    /// `[longitude, latitude]`, the GeoJSON position order
    pub fn to_lon_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    pub fn to_geo_point(&self) -> geo::Point<f64> {
        geo::Point::new(self.longitude, self.latitude)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(point: GeoPoint) -> Self {
        point.to_geo_point()
    }
}

/// Closed ring of vertices (first == last)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ring(pub Vec<GeoPoint>);

impl Ring {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self(points)
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        match (self.0.first(), self.0.last()) {
            (Some(first), Some(last)) => first == last,
            _ => false,
        }
    }

    /// Append the first vertex if the ring is not already closed
    pub fn close(&mut self) {
        if !self.is_closed() {
            if let Some(first) = self.0.first().copied() {
                self.0.push(first);
            }
        }
    }

    /// Vertices without the closing duplicate
    pub fn open_vertices(&self) -> &[GeoPoint] {
        if self.is_closed() && self.0.len() > 1 {
            &self.0[..self.0.len() - 1]
        } else {
            &self.0
        }
    }
}

/// Polygon as an ordered list of rings. Ring 0 is the outer boundary,
/// any further rings are holes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PolygonGeometry {
    pub rings: Vec<Ring>,
}

impl PolygonGeometry {
    pub fn new(rings: Vec<Ring>) -> Self {
        Self { rings }
    }

    pub fn outer(&self) -> Option<&Ring> {
        self.rings.first()
    }

    pub fn holes(&self) -> &[Ring] {
        self.rings.get(1..).unwrap_or(&[])
    }

    /// Axis-aligned bounding box of the outer ring
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::of(self.outer()?.points())
    }

    /// GeoJSON `coordinates` array for a Polygon
    pub fn to_geojson_coordinates(&self) -> Vec<Vec<[f64; 2]>> {
        self.rings
            .iter()
            .map(|ring| ring.points().iter().map(GeoPoint::to_lon_lat).collect())
            .collect()
    }
}

/// Latitude/longitude extent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub min_longitude: f64,
    pub max_latitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    pub fn of(points: &[GeoPoint]) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            min_latitude: first.latitude,
            min_longitude: first.longitude,
            max_latitude: first.latitude,
            max_longitude: first.longitude,
        };
        Some(points.iter().skip(1).fold(init, |bbox, p| Self {
            min_latitude: bbox.min_latitude.min(p.latitude),
            min_longitude: bbox.min_longitude.min(p.longitude),
            max_latitude: bbox.max_latitude.max(p.latitude),
            max_longitude: bbox.max_longitude.max(p.longitude),
        }))
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&point.latitude)
            && (self.min_longitude..=self.max_longitude).contains(&point.longitude)
    }
}
