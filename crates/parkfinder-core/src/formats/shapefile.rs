//! Shapefile format reader implementation
//!
//! Shapefiles consist of multiple component files (.shp, .shx, .dbf, .prj)
//! that sit next to each other. The .prj file is optional; without it the
//! coordinates are assumed to be EPSG:4326.

use shapefile::dbase::FieldValue as DbaseFieldValue;
use shapefile::{PolygonRing, Shape};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ParkfinderError, Result};
use crate::formats::validation::FormatValidator;
use crate::formats::{largest_part, FormatDataset, FormatFeature, FormatReader, FormatValidation, RawRing};
use crate::models::Crs;

/// ESRI projection names that commonly appear without an AUTHORITY clause
const KNOWN_PRJ_NAMES: &[(&str, u32)] = &[
    ("GCS_WGS_1984", 4326),
    ("WGS_1984_Web_Mercator_Auxiliary_Sphere", 3857),
    ("NAD_1983_UTM_Zone_10N", 26910),
    ("NAD_1983_CSRS_UTM_Zone_10N", 3157),
    ("NAD_1983_BC_Environment_Albers", 3005),
];

/// Shapefile format reader
#[derive(Debug)]
pub struct ShapefileFormatReader;

impl FormatReader for ShapefileFormatReader {
    fn read(&self, path: &Path) -> Result<FormatDataset> {
        self.verify_components(path)?;

        let mut reader =
            shapefile::Reader::from_path(path).map_err(|e| ParkfinderError::ParseError {
                format: "Shapefile".to_string(),
                reason: format!("Failed to open Shapefile: {}", e),
            })?;

        let crs = self.extract_crs(path)?;

        let mut features = Vec::new();
        for (idx, result) in reader.iter_shapes_and_records().enumerate() {
            let (shape, record) = result.map_err(|e| ParkfinderError::ParseError {
                format: "Shapefile".to_string(),
                reason: format!("Failed to read record {}: {}", idx, e),
            })?;

            let (geometry_type, rings) = convert_shape(&idx.to_string(), &shape);
            let properties = record
                .into_iter()
                .map(|(name, value)| (name, convert_dbase_value(&value)))
                .collect();

            features.push(FormatFeature { id: idx.to_string(), geometry_type, rings, properties });
        }

        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed").to_string();

        Ok(FormatDataset { name, format_name: "Shapefile".to_string(), crs, features })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["shp"]
    }

    fn format_name(&self) -> &str {
        "Shapefile"
    }

    fn validate(&self, path: &Path) -> FormatValidation {
        let mut validation = FormatValidator::validate_file_exists(path);
        if !validation.is_valid() {
            return validation;
        }

        let base = match self.get_shapefile_base(path) {
            Ok(b) => b,
            Err(e) => {
                validation.errors.push(format!("Invalid Shapefile path: {}", e));
                return validation;
            }
        };

        let component_validation =
            FormatValidator::validate_component_files(&base, &["shp", "shx", "dbf"], &["prj"]);

        FormatValidator::merge_validations(vec![validation, component_validation])
    }
}

impl ShapefileFormatReader {
    /// Get the base path for a Shapefile (without extension)
    fn get_shapefile_base(&self, path: &Path) -> Result<PathBuf> {
        let is_shp = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("shp"))
            .unwrap_or(false);
        if !is_shp {
            return Err(ParkfinderError::UnsupportedFormat {
                extension: path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("none")
                    .to_string(),
                supported: vec!["shp".to_string()],
            });
        }

        Ok(path.with_extension(""))
    }

    /// Verify that all required Shapefile component files exist
    fn verify_components(&self, path: &Path) -> Result<()> {
        let base = self.get_shapefile_base(path)?;
        let missing: Vec<String> = ["shp", "shx", "dbf"]
            .iter()
            .filter(|ext| !base.with_extension(ext).exists())
            .map(|ext| format!(".{}", ext))
            .collect();

        if !missing.is_empty() {
            return Err(ParkfinderError::ParseError {
                format: "Shapefile".to_string(),
                reason: format!("Missing required component files: {}", missing.join(", ")),
            });
        }

        Ok(())
    }

    /// Extract CRS from the Shapefile .prj file
    fn extract_crs(&self, path: &Path) -> Result<Crs> {
        let prj_path = self.get_shapefile_base(path)?.with_extension("prj");

        if !prj_path.exists() {
            tracing::warn!(path = %path.display(), "No .prj file, assuming EPSG:4326");
            return Ok(Crs::wgs84());
        }

        let prj_content = fs::read_to_string(&prj_path).map_err(|e| ParkfinderError::ParseError {
            format: "Shapefile".to_string(),
            reason: format!("Failed to read .prj file: {}", e),
        })?;

        match parse_epsg_from_wkt(&prj_content) {
            Some(epsg) => Ok(Crs::from_epsg(epsg)),
            None => {
                tracing::warn!(
                    path = %prj_path.display(),
                    "Unrecognised projection in .prj file, assuming EPSG:4326"
                );
                Ok(Crs::wgs84())
            }
        }
    }
}

/// Parse an EPSG code from projection WKT
fn parse_epsg_from_wkt(wkt: &str) -> Option<u32> {
    if let Some(code) = root_authority(wkt) {
        return Some(code);
    }

    if let Some(start) = wkt.find("EPSG:") {
        let digits: String =
            wkt[start + 5..].chars().take_while(|c| c.is_ascii_digit()).collect();
        if let Ok(code) = digits.parse::<u32>() {
            return Some(code);
        }
    }

    // ESRI WKT: PROJCS["NAD_1983_UTM_Zone_10N",... or GEOGCS["GCS_WGS_1984",...
    let head = wkt.trim_start();
    let name = head.split('"').nth(1)?;
    KNOWN_PRJ_NAMES.iter().find(|(known, _)| *known == name).map(|(_, epsg)| *epsg)
}

/// EPSG code of the AUTHORITY clause that is a direct child of the root
/// node. Nested clauses (datum, spheroid, unit) are not the CRS code.
fn root_authority(wkt: &str) -> Option<u32> {
    let mut depth = 0usize;
    let mut in_quotes = false;
    for (i, c) in wkt.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '[' | '(' if !in_quotes => depth += 1,
            ']' | ')' if !in_quotes => depth = depth.saturating_sub(1),
            'A' if !in_quotes && depth == 1 && wkt[i..].starts_with("AUTHORITY[") => {
                return authority_code(&wkt[i + "AUTHORITY[".len()..]);
            }
            _ => {}
        }
    }
    None
}

/// `"EPSG","26910"]` -> 26910
fn authority_code(body: &str) -> Option<u32> {
    let body = &body[..body.find(']')?];
    let mut parts = body.split(',').map(|part| part.trim().trim_matches('"'));
    if !parts.next()?.eq_ignore_ascii_case("EPSG") {
        return None;
    }
    parts.next()?.parse().ok()
}

/// Convert a shape to polygon rings. Only polygon shapes yield rings; when
/// a shape has several outer rings the largest outer ring and its holes are
/// kept.
fn convert_shape(id: &str, shape: &Shape) -> (String, Vec<RawRing>) {
    let rings = match shape {
        Shape::Polygon(polygon) => {
            largest_polygon(id, polygon.rings().iter().map(|ring| ring_xy(ring, |p| [p.x, p.y])))
        }
        Shape::PolygonM(polygon) => {
            largest_polygon(id, polygon.rings().iter().map(|ring| ring_xy(ring, |p| [p.x, p.y])))
        }
        Shape::PolygonZ(polygon) => {
            largest_polygon(id, polygon.rings().iter().map(|ring| ring_xy(ring, |p| [p.x, p.y])))
        }
        _ => Vec::new(),
    };

    (format!("{:?}", shape.shapetype()), rings)
}

fn ring_xy<P>(ring: &PolygonRing<P>, xy: impl Fn(&P) -> [f64; 2]) -> (bool, RawRing) {
    let is_outer = matches!(ring, PolygonRing::Outer(_));
    (is_outer, ring.points().iter().map(xy).collect())
}

/// Split a shape's rings into parts, each an outer ring followed by its
/// holes, and keep the largest part.
fn largest_polygon(feature_id: &str, rings: impl Iterator<Item = (bool, RawRing)>) -> Vec<RawRing> {
    let mut parts: Vec<Vec<RawRing>> = Vec::new();
    for (is_outer, ring) in rings {
        match parts.last_mut() {
            Some(part) if !is_outer => part.push(ring),
            _ => parts.push(vec![ring]),
        }
    }
    largest_part(feature_id, parts)
}

/// Convert dBase field value to JSON value
fn convert_dbase_value(value: &DbaseFieldValue) -> serde_json::Value {
    let number = |n: f64| {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    };

    match value {
        DbaseFieldValue::Character(Some(s)) => serde_json::Value::String(s.trim().to_string()),
        DbaseFieldValue::Numeric(Some(n)) => number(*n),
        DbaseFieldValue::Logical(Some(b)) => serde_json::Value::Bool(*b),
        DbaseFieldValue::Float(Some(f)) => number(*f as f64),
        DbaseFieldValue::Integer(i) => serde_json::Value::Number((*i).into()),
        DbaseFieldValue::Double(d) => number(*d),
        DbaseFieldValue::Currency(c) => number(*c),
        DbaseFieldValue::Memo(s) => serde_json::Value::String(s.clone()),
        DbaseFieldValue::Date(Some(date)) => serde_json::Value::String(format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            date.month(),
            date.day()
        )),
        _ => serde_json::Value::Null,
    }
}
