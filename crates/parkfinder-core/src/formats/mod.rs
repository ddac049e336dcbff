//! Format abstraction layer for park datasets
//!
//! Each supported file format implements [`FormatReader`]; the
//! [`FormatRegistry`] picks a reader by file extension. Readers only
//! extract raw rings and properties in the dataset's own CRS; turning them
//! into a [`FeatureStore`](crate::models::FeatureStore) is the ingest step's
//! job.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{ParkfinderError, Result};
use crate::models::Crs;
use crate::ports::DatasetSource;

pub mod geojson;
pub mod shapefile;
pub mod validation;

/// Format reader trait that all format implementations must implement
pub trait FormatReader: Send + Sync {
    /// Read a dataset from the given path
    fn read(&self, path: &Path) -> Result<FormatDataset>;

    /// Get supported file extensions (e.g., ["shp", "geojson"])
    fn supported_extensions(&self) -> &[&str];

    /// Get human-readable format name (e.g., "Shapefile", "GeoJSON")
    fn format_name(&self) -> &str;

    /// Validate file structure without a full read
    fn validate(&self, _path: &Path) -> FormatValidation {
        FormatValidation::default()
    }
}

/// Result of format validation
#[derive(Debug, Clone, Default)]
pub struct FormatValidation {
    /// Validation errors that prevent reading
    pub errors: Vec<String>,

    /// Warnings that don't prevent reading but indicate potential issues
    pub warnings: Vec<String>,
}

impl FormatValidation {
    /// Check if validation passed (no errors)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Dataset as read from a file or feed, before ingest
#[derive(Debug, Clone)]
pub struct FormatDataset {
    /// Dataset name (file stem or feed label)
    pub name: String,

    /// Format name (e.g., "Shapefile", "GeoJSON")
    pub format_name: String,

    /// CRS the coordinates are expressed in
    pub crs: Crs,

    /// Features extracted from the format
    pub features: Vec<FormatFeature>,
}

/// Raw ring as `[x, y]` positions in the dataset CRS
pub type RawRing = Vec<[f64; 2]>;

/// Feature extracted from a format
#[derive(Debug, Clone)]
pub struct FormatFeature {
    /// Feature identifier (source id, or record index when the source has none)
    pub id: String,

    /// Geometry type as found in the source (e.g. "Polygon", "Point", "None")
    pub geometry_type: String,

    /// Polygon rings; empty when the source geometry is not polygonal
    pub rings: Vec<RawRing>,

    /// Raw feature properties
    pub properties: HashMap<String, serde_json::Value>,
}

impl FormatFeature {
    pub fn is_polygonal(&self) -> bool {
        !self.rings.is_empty()
    }
}

/// Reduce a multipart polygon to the part whose outer ring encloses the most
/// area. Each part is an outer ring followed by its holes; on equal area the
/// earlier part wins.
pub(crate) fn largest_part(feature_id: &str, parts: Vec<Vec<RawRing>>) -> Vec<RawRing> {
    let part_count = parts.len();
    let largest = parts
        .into_iter()
        .rev()
        .max_by(|a, b| outer_area(a).total_cmp(&outer_area(b)))
        .unwrap_or_default();

    if part_count > 1 {
        tracing::debug!(
            feature_id,
            parts = part_count,
            dropped = part_count - 1,
            "Multipart polygon reduced to its largest part"
        );
    }
    largest
}

fn outer_area(part: &[RawRing]) -> f64 {
    use geo::Area;

    part.first()
        .map(|ring| geo::Polygon::new(geo::LineString::from(ring.clone()), Vec::new()).unsigned_area())
        .unwrap_or(0.0)
}

/// Central registry for format readers
pub struct FormatRegistry {
    readers: Vec<Box<dyn FormatReader>>,
}

impl FormatRegistry {
    /// Create a new empty format registry
    pub fn new() -> Self {
        Self { readers: Vec::new() }
    }

    /// Registry with the GeoJSON and Shapefile readers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(geojson::GeoJsonReader));
        registry.register(Box::new(shapefile::ShapefileFormatReader));
        registry
    }

    /// Register a format reader
    pub fn register(&mut self, reader: Box<dyn FormatReader>) {
        self.readers.push(reader);
    }

    /// Detect format and return appropriate reader
    pub fn detect_format(&self, path: &Path) -> Result<&dyn FormatReader> {
        let extension = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ParkfinderError::UnsupportedFormat {
                extension: "none".to_string(),
                supported: self.supported_formats(),
            }
        })?;

        self.readers
            .iter()
            .find(|r| r.supported_extensions().iter().any(|ext| ext.eq_ignore_ascii_case(extension)))
            .map(|r| r.as_ref())
            .ok_or_else(|| ParkfinderError::UnsupportedFormat {
                extension: extension.to_string(),
                supported: self.supported_formats(),
            })
    }

    /// Get list of all supported format extensions
    pub fn supported_formats(&self) -> Vec<String> {
        self.readers
            .iter()
            .flat_map(|r| r.supported_extensions())
            .map(|s| s.to_string())
            .collect()
    }

    /// Get all registered readers
    pub fn readers(&self) -> &[Box<dyn FormatReader>] {
        &self.readers
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Dataset source backed by a local file
pub struct FileDatasetSource {
    path: PathBuf,
    registry: FormatRegistry,
}

impl FileDatasetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), registry: FormatRegistry::with_defaults() }
    }

    pub fn with_registry(path: impl Into<PathBuf>, registry: FormatRegistry) -> Self {
        Self { path: path.into(), registry }
    }
}

impl DatasetSource for FileDatasetSource {
    fn fetch(&self) -> Result<FormatDataset> {
        if !self.path.exists() {
            return Err(ParkfinderError::DatasetNotFound { path: self.path.clone() });
        }

        let reader = self.registry.detect_format(&self.path)?;
        let validation = reader.validate(&self.path);
        for warning in &validation.warnings {
            tracing::warn!(path = %self.path.display(), "{}", warning);
        }
        if !validation.is_valid() {
            return Err(ParkfinderError::ParseError {
                format: reader.format_name().to_string(),
                reason: validation.errors.join("; "),
            });
        }

        let dataset = reader.read(&self.path)?;
        tracing::info!(
            path = %self.path.display(),
            format = %dataset.format_name,
            features = dataset.features.len(),
            epsg = dataset.crs.epsg,
            "Read dataset"
        );
        Ok(dataset)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockReader {
        extensions: Vec<&'static str>,
        name: &'static str,
    }

    impl FormatReader for MockReader {
        fn read(&self, _path: &Path) -> Result<FormatDataset> {
            Ok(FormatDataset {
                name: "test".to_string(),
                format_name: self.name.to_string(),
                crs: Crs::wgs84(),
                features: vec![],
            })
        }

        fn supported_extensions(&self) -> &[&str] {
            &self.extensions
        }

        fn format_name(&self) -> &str {
            self.name
        }
    }

    #[test]
    fn test_format_registration() {
        let mut registry = FormatRegistry::new();
        assert_eq!(registry.readers().len(), 0);

        registry.register(Box::new(MockReader { extensions: vec!["json", "geojson"], name: "GeoJSON" }));

        assert_eq!(registry.readers().len(), 1);
        assert_eq!(registry.supported_formats(), vec!["json", "geojson"]);
    }

    #[test]
    fn test_format_detection() {
        let registry = FormatRegistry::with_defaults();

        let reader = registry.detect_format(Path::new("parks.geojson")).unwrap();
        assert_eq!(reader.format_name(), "GeoJSON");

        let reader = registry.detect_format(Path::new("Parks_and_Open_Spaces.SHP")).unwrap();
        assert_eq!(reader.format_name(), "Shapefile");
    }

    #[test]
    fn test_unsupported_format() {
        let registry = FormatRegistry::with_defaults();
        let result = registry.detect_format(Path::new("parks.kml"));
        assert!(matches!(result, Err(ParkfinderError::UnsupportedFormat { .. })));

        let result = registry.detect_format(Path::new("parks"));
        assert!(result.is_err());
    }

    #[test]
    fn test_file_source_missing_path() {
        let source = FileDatasetSource::new("/nonexistent/parks.geojson");
        assert!(matches!(source.fetch(), Err(ParkfinderError::DatasetNotFound { .. })));
        assert_eq!(source.describe(), "/nonexistent/parks.geojson");
    }

    fn square(x: f64, y: f64, side: f64) -> RawRing {
        vec![[x, y], [x + side, y], [x + side, y + side], [x, y + side], [x, y]]
    }

    #[test]
    fn test_largest_part_wins() {
        let small = vec![square(0.0, 0.0, 1.0)];
        let large = vec![square(10.0, 10.0, 3.0), square(11.0, 11.0, 0.5)];
        let tied = vec![square(20.0, 20.0, 3.0)];

        let kept = largest_part("7", vec![small, large.clone(), tied]);
        assert_eq!(kept, large);

        assert!(largest_part("8", Vec::new()).is_empty());
    }

    #[test]
    fn test_format_validation_with_warnings() {
        let validation = FormatValidation {
            errors: vec![],
            warnings: vec!["No .prj file".to_string()],
        };
        assert!(validation.is_valid());
        assert!(validation.has_warnings());
    }
}
