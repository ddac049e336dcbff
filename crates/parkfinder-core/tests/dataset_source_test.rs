//! Integration tests for reading park datasets from disk

use parkfinder_core::formats::{FileDatasetSource, FormatRegistry};
use parkfinder_core::ports::DatasetSource;
use parkfinder_core::ParkfinderError;
use std::fs;
use tempfile::TempDir;

const PARKS: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "id": "beacon-hill",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[-123.370, 48.410], [-123.360, 48.410], [-123.360, 48.416], [-123.370, 48.416], [-123.370, 48.410]]]
            },
            "properties": { "Park_Name": "Beacon Hill Park", "Washrooms": "Yes", "OWNER": "City" }
        },
        {
            "type": "Feature",
            "id": "pioneer",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[-123.366, 48.429], [-123.364, 48.429], [-123.364, 48.431], [-123.366, 48.429]]]
            },
            "properties": { "Park_Name": "Pioneer Square" }
        }
    ]
}"#;

#[test]
fn test_file_source_reads_geojson() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("victoria_parks.geojson");
    fs::write(&path, PARKS).unwrap();

    let source = FileDatasetSource::new(&path);
    let dataset = source.fetch().unwrap();

    assert_eq!(dataset.name, "victoria_parks");
    assert_eq!(dataset.format_name, "GeoJSON");
    assert_eq!(dataset.crs.epsg, 4326);
    assert_eq!(dataset.features.len(), 2);
    assert_eq!(dataset.features[0].id, "beacon-hill");
    assert_eq!(dataset.features[0].properties["OWNER"], "City");
    assert!(source.describe().ends_with("victoria_parks.geojson"));
}

#[test]
fn test_file_source_rejects_invalid_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ \"type\": ").unwrap();

    let result = FileDatasetSource::new(&path).fetch();
    assert!(matches!(result, Err(ParkfinderError::ParseError { .. })));
}

#[test]
fn test_file_source_shapefile_missing_components() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Parks_and_Open_Spaces.shp");
    fs::write(&path, b"").unwrap();

    match FileDatasetSource::new(&path).fetch() {
        Err(ParkfinderError::ParseError { format, reason }) => {
            assert_eq!(format, "Shapefile");
            assert!(reason.contains("Missing required file"));
        }
        other => panic!("expected ParseError, got {:?}", other.map(|d| d.name)),
    }
}

#[test]
fn test_file_source_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("parks.kml");
    fs::write(&path, "<kml/>").unwrap();

    let result = FileDatasetSource::with_registry(&path, FormatRegistry::with_defaults()).fetch();
    match result {
        Err(ParkfinderError::UnsupportedFormat { extension, supported }) => {
            assert_eq!(extension, "kml");
            assert!(supported.contains(&"shp".to_string()));
        }
        other => panic!("expected UnsupportedFormat, got {:?}", other.map(|d| d.name)),
    }
}
