//! Query cycles over a store built from a GeoJSON dataset

use std::cell::Cell;

use parkfinder_core::config::FieldMapping;
use parkfinder_core::formats::geojson::GeoJsonReader;
use parkfinder_core::models::{FeatureStore, GeoPoint, RouteEstimate, TravelMode};
use parkfinder_core::ports::{AddressResolver, RouteEstimator};
use parkfinder_core::{ParkfinderError, Result};
use parkfinder_geo::{build_store, DistanceEngine, DistanceMetric, NearestFeatureScanner};
use parkfinder_lookup::{LookupOrigin, LookupPipeline, LookupRequest};
use proptest::prelude::*;

const PARKS: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[-123.3658, 48.4298], [-123.3654, 48.4298], [-123.3654, 48.4302], [-123.3658, 48.4302], [-123.3658, 48.4298]]]
            },
            "properties": { "OBJECTID": 1, "Park_Name": "Park A", "Playground": "Yes" }
        },
        {
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[-123.3702, 48.4498], [-123.3698, 48.4498], [-123.3698, 48.4502], [-123.3702, 48.4502], [-123.3702, 48.4498]]]
            },
            "properties": { "OBJECTID": 2, "Park_Name": "Park B", "Washrooms": "Y" }
        },
        {
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[-123.3656, 48.4285], [-123.3656, 48.4285], [-123.3657, 48.4286], [-123.3656, 48.4285]]]
            },
            "properties": { "OBJECTID": 3, "Park_Name": "Sliver" }
        }
    ]
}"#;

fn store() -> FeatureStore {
    let dataset = GeoJsonReader.parse_str(PARKS, "parks").unwrap();
    let fields = FieldMapping { id: Some("OBJECTID".to_string()), ..FieldMapping::default() };
    let (store, _) = build_store(dataset, &fields, "parks.geojson").unwrap();
    store
}

/// Resolves every query to the same point
struct FixedResolver {
    point: Option<GeoPoint>,
    calls: Cell<usize>,
}

impl FixedResolver {
    fn at(point: Option<GeoPoint>) -> Self {
        Self { point, calls: Cell::new(0) }
    }
}

impl AddressResolver for FixedResolver {
    fn resolve(&self, _query: &str) -> Result<Option<GeoPoint>> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.point)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Straight-line "route" at a fixed pace
struct StraightLine {
    meters_per_minute: f64,
}

impl RouteEstimator for StraightLine {
    fn estimate(&self, origin: &GeoPoint, destination: &GeoPoint, _mode: TravelMode) -> Result<RouteEstimate> {
        let meters = DistanceEngine::default().distance_meters(origin, destination);
        Ok(RouteEstimate {
            path: Some(vec![*origin, *destination]),
            duration_minutes: Some(meters / self.meters_per_minute),
            distance_meters: Some(meters),
        })
    }

    fn name(&self) -> &str {
        "straight-line"
    }
}

struct Unreachable;

impl RouteEstimator for Unreachable {
    fn estimate(&self, _: &GeoPoint, _: &GeoPoint, _: TravelMode) -> Result<RouteEstimate> {
        Err(ParkfinderError::ProviderError {
            provider: "unreachable".to_string(),
            reason: "NoRoute: Impossible route between points".to_string(),
        })
    }

    fn name(&self) -> &str {
        "unreachable"
    }
}

#[test]
fn test_postal_code_cycle() {
    let store = store();
    let resolver = FixedResolver::at(Some(GeoPoint::new(48.4284, -123.3656).unwrap()));
    let pipeline = LookupPipeline::new(
        resolver,
        Some(StraightLine { meters_per_minute: 80.0 }),
        NearestFeatureScanner::default(),
    );

    let request = LookupRequest::address("V8W 1P6", TravelMode::Walking);
    let outcome = pipeline.locate(&request, &store).unwrap();

    let best = outcome.nearest.best();
    assert_eq!(best.feature.name, "Park A");
    assert_eq!(best.feature.id.as_str(), "1");
    assert!((best.distance_meters - 177.9).abs() < 1.0, "{}", best.distance_meters);
    assert_eq!(outcome.nearest.skipped().len(), 1);

    let minutes = outcome.duration_minutes().unwrap();
    assert!((minutes - best.distance_meters / 80.0).abs() < 1e-9);
}

#[test]
fn test_unknown_postal_code() {
    let store = store();
    let pipeline = LookupPipeline::new(
        FixedResolver::at(None),
        Some(StraightLine { meters_per_minute: 80.0 }),
        NearestFeatureScanner::default(),
    );

    let err = pipeline
        .locate(&LookupRequest::address("Z9Z 9Z9", TravelMode::Walking), &store)
        .unwrap_err();
    assert!(matches!(err, ParkfinderError::InvalidOrigin { .. }));
    assert!(err.to_string().contains("Z9Z 9Z9"));
}

#[test]
fn test_no_route_still_reports_park() {
    let store = store();
    let pipeline = LookupPipeline::new(
        FixedResolver::at(Some(GeoPoint::new(48.45, -123.37).unwrap())),
        Some(Unreachable),
        NearestFeatureScanner::default(),
    );

    let outcome = pipeline
        .locate(&LookupRequest::address("V8T 4M2", TravelMode::Driving), &store)
        .unwrap();
    assert_eq!(outcome.nearest.best().feature.name, "Park B");
    assert!(outcome.route.is_none());
    assert!(outcome.route_error.as_deref().unwrap_or_default().contains("NoRoute"));
}

#[test]
fn test_pipeline_without_estimator() {
    let store = store();
    let pipeline: LookupPipeline<_, StraightLine> = LookupPipeline::new(
        FixedResolver::at(Some(GeoPoint::new(48.4284, -123.3656).unwrap())),
        None,
        NearestFeatureScanner::new(DistanceEngine::new(DistanceMetric::Haversine)),
    );

    let outcome = pipeline
        .locate(&LookupRequest::address("V8W 1P6", TravelMode::Walking), &store)
        .unwrap();
    assert_eq!(outcome.nearest.best().feature.name, "Park A");
    assert!(outcome.route.is_none() && outcome.route_error.is_none());
    assert_eq!(pipeline.scanner().engine().metric(), DistanceMetric::Haversine);
}

#[test]
fn test_outcome_serializes() {
    let store = store();
    let pipeline = LookupPipeline::new(
        FixedResolver::at(None),
        Some(StraightLine { meters_per_minute: 80.0 }),
        NearestFeatureScanner::default(),
    );
    let origin = GeoPoint::new(48.4284, -123.3656).unwrap();
    let request = LookupRequest::point(origin, TravelMode::Walking);

    let outcome = pipeline.locate(&request, &store).unwrap();
    let json = serde_json_value(&outcome);
    assert_eq!(json["nearest"]["all"][0]["feature"]["name"], "Park A");
    assert!(json["route"]["duration_minutes"].is_number());
    assert_eq!(request.origin, LookupOrigin::Point(origin));
}

fn serde_json_value<T: serde::Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap()
}

proptest! {
    #[test]
    fn prop_point_origin_never_resolves(lat in 48.0f64..49.0, lon in -124.0f64..-123.0) {
        let store = store();
        let pipeline = LookupPipeline::new(
            FixedResolver::at(None),
            Some(StraightLine { meters_per_minute: 80.0 }),
            NearestFeatureScanner::default(),
        );
        let origin = GeoPoint::new(lat, lon).unwrap();

        let outcome = pipeline.locate(&LookupRequest::point(origin, TravelMode::Walking), &store).unwrap();

        prop_assert_eq!(pipeline_calls(&pipeline), 0);
        let best = outcome.nearest.best().distance_meters;
        prop_assert!(outcome.nearest.all().iter().all(|r| r.distance_meters >= best));
        prop_assert_eq!(outcome.origin, origin);
    }
}

fn pipeline_calls(pipeline: &LookupPipeline<FixedResolver, StraightLine>) -> usize {
    pipeline.resolver().calls.get()
}
