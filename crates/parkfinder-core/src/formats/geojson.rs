//! GeoJSON format reader implementation

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{ParkfinderError, Result};
use crate::formats::validation::FormatValidator;
use crate::formats::{largest_part, FormatDataset, FormatFeature, FormatReader, FormatValidation, RawRing};
use crate::models::Crs;

/// GeoJSON format reader
pub struct GeoJsonReader;

impl FormatReader for GeoJsonReader {
    fn read(&self, path: &Path) -> Result<FormatDataset> {
        let content = fs::read_to_string(path)?;

        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed");

        self.parse_str(&content, name)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json", "geojson"]
    }

    fn format_name(&self) -> &str {
        "GeoJSON"
    }

    fn validate(&self, path: &Path) -> FormatValidation {
        let validation = FormatValidator::validate_file_exists(path);
        if !validation.is_valid() {
            return validation;
        }

        let json_validation = FormatValidator::validate_json_structure(path);
        FormatValidator::merge_validations(vec![validation, json_validation])
    }
}

impl GeoJsonReader {
    /// Parse a GeoJSON document held in memory (e.g. a live feed response)
    pub fn parse_str(&self, content: &str, name: &str) -> Result<FormatDataset> {
        let geojson: geojson::GeoJson =
            content.parse().map_err(|e: geojson::Error| ParkfinderError::ParseError {
                format: "GeoJSON".to_string(),
                reason: e.to_string(),
            })?;

        let (features, crs) = self.extract_features_and_crs(geojson);

        Ok(FormatDataset {
            name: name.to_string(),
            format_name: "GeoJSON".to_string(),
            crs,
            features,
        })
    }

    /// Extract features and CRS from GeoJSON
    fn extract_features_and_crs(&self, geojson: geojson::GeoJson) -> (Vec<FormatFeature>, Crs) {
        match geojson {
            geojson::GeoJson::FeatureCollection(fc) => {
                // Legacy "crs" member; RFC 7946 documents are always WGS 84
                let crs = fc
                    .foreign_members
                    .as_ref()
                    .and_then(|fm| fm.get("crs"))
                    .and_then(extract_epsg_from_crs)
                    .map(Crs::from_epsg)
                    .unwrap_or_default();

                let features = fc
                    .features
                    .into_iter()
                    .enumerate()
                    .map(|(idx, feature)| convert_feature(feature, idx))
                    .collect();

                (features, crs)
            }
            geojson::GeoJson::Feature(feature) => (vec![convert_feature(feature, 0)], Crs::wgs84()),
            geojson::GeoJson::Geometry(geometry) => {
                let (geometry_type, rings) = extract_rings("0", Some(geometry));
                let feature = FormatFeature {
                    id: "0".to_string(),
                    geometry_type,
                    rings,
                    properties: HashMap::new(),
                };
                (vec![feature], Crs::wgs84())
            }
        }
    }
}

/// Convert a GeoJSON feature to FormatFeature
fn convert_feature(feature: geojson::Feature, idx: usize) -> FormatFeature {
    let id = feature
        .id
        .as_ref()
        .map(|id| match id {
            geojson::feature::Id::String(s) => s.clone(),
            geojson::feature::Id::Number(n) => n.to_string(),
        })
        .unwrap_or_else(|| idx.to_string());

    let properties = feature
        .properties
        .map(|props| props.into_iter().collect())
        .unwrap_or_default();

    let (geometry_type, rings) = extract_rings(&id, feature.geometry);

    FormatFeature { id, geometry_type, rings, properties }
}

/// Pull polygon rings out of a GeoJSON geometry.
///
/// A MultiPolygon contributes its largest polygon.
fn extract_rings(feature_id: &str, geometry: Option<geojson::Geometry>) -> (String, Vec<RawRing>) {
    let Some(geometry) = geometry else {
        return ("None".to_string(), Vec::new());
    };
    let geometry_type = geometry_type_name(&geometry.value).to_string();

    let polygons: Vec<geo::Polygon<f64>> = match geometry.value {
        value @ geojson::Value::Polygon(_) => {
            let polygon: Option<geo::Polygon<f64>> = value.try_into().ok();
            polygon.into_iter().collect()
        }
        value @ geojson::Value::MultiPolygon(_) => {
            let multi: Option<geo::MultiPolygon<f64>> = value.try_into().ok();
            multi.map(|mp| mp.0).unwrap_or_default()
        }
        _ => Vec::new(),
    };

    let parts = polygons
        .iter()
        .map(|poly| {
            let mut rings: Vec<RawRing> = vec![poly.exterior().coords().map(|c| [c.x, c.y]).collect()];
            rings.extend(poly.interiors().iter().map(|ring| ring.coords().map(|c| [c.x, c.y]).collect()));
            rings
        })
        .collect();

    (geometry_type, largest_part(feature_id, parts))
}

fn geometry_type_name(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

/// Extract EPSG code from a legacy GeoJSON CRS object
fn extract_epsg_from_crs(crs: &serde_json::Value) -> Option<u32> {
    let name = crs.get("properties")?.get("name")?.as_str()?;
    // "EPSG:4326", "urn:ogc:def:crs:EPSG::4326", or "urn:ogc:def:crs:OGC:1.3:CRS84"
    if name.ends_with("CRS84") {
        return Some(4326);
    }
    name.split(':').next_back()?.parse().ok()
}
