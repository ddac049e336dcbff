use parkfinder_core::error::{ParkfinderError, Result};
use parkfinder_core::models::{FeatureStore, GeoPoint};
use parkfinder_core::ports::{AddressResolver, RouteEstimator};
use parkfinder_geo::NearestFeatureScanner;
use uuid::Uuid;

use crate::models::{LookupOrigin, LookupOutcome, LookupRequest};

/// Lookup pipeline: resolve the origin, find the nearest park, estimate a
/// route.
///
/// Address and origin failures abort the cycle. Route failures do not: the
/// nearest park is still reported, with `route_error` explaining why there
/// is no route.
pub struct LookupPipeline<R, E>
where
    R: AddressResolver,
    E: RouteEstimator,
{
    resolver: R,
    estimator: Option<E>,
    scanner: NearestFeatureScanner,
}

impl<R, E> LookupPipeline<R, E>
where
    R: AddressResolver,
    E: RouteEstimator,
{
    /// Create a new lookup pipeline. Without an estimator no route is ever
    /// requested.
    pub fn new(resolver: R, estimator: Option<E>, scanner: NearestFeatureScanner) -> Self {
        Self { resolver, estimator, scanner }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn scanner(&self) -> &NearestFeatureScanner {
        &self.scanner
    }

    /// Run one query cycle against `store`
    pub fn locate<'a>(
        &self,
        request: &LookupRequest,
        store: &'a FeatureStore,
    ) -> Result<LookupOutcome<'a>> {
        let cycle_id = Uuid::new_v4();
        let span = tracing::info_span!("lookup", cycle_id = %cycle_id, mode = %request.mode);
        let _enter = span.enter();

        let origin = self.resolve_origin(&request.origin)?;
        let nearest = self.scanner.find_nearest(&origin, store)?;

        let best = nearest.best();
        tracing::info!(
            feature_id = %best.feature.id,
            name = %best.feature.name,
            distance_m = best.distance_meters,
            skipped = nearest.skipped().len(),
            "Nearest park"
        );

        let (route, route_error) = match (&self.estimator, request.with_route) {
            (Some(estimator), true) => {
                match estimator.estimate(&origin, &best.centroid, request.mode) {
                    Ok(route) => (Some(route), None),
                    Err(e) => {
                        tracing::warn!(
                            provider = estimator.name(),
                            error = %e,
                            "Route unavailable, reporting distance only"
                        );
                        (None, Some(e.to_string()))
                    }
                }
            }
            _ => (None, None),
        };

        Ok(LookupOutcome { cycle_id, origin, mode: request.mode, nearest, route, route_error })
    }

    fn resolve_origin(&self, origin: &LookupOrigin) -> Result<GeoPoint> {
        match origin {
            LookupOrigin::Point(point) => Ok(*point),
            LookupOrigin::Address(query) => {
                let query = query.trim();
                if query.is_empty() {
                    return Err(ParkfinderError::InvalidOrigin {
                        reason: "empty address".to_string(),
                    });
                }

                match self.resolver.resolve(query)? {
                    Some(point) => Ok(point),
                    None => Err(ParkfinderError::InvalidOrigin {
                        reason: format!(
                            "{} found no location for '{}'",
                            self.resolver.name(),
                            query
                        ),
                    }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkfinder_core::models::{
        PolygonFeature, PolygonGeometry, Ring, RouteEstimate, TravelMode,
    };
    use std::cell::{Cell, RefCell};
    use std::time::Duration;

    struct StubResolver {
        answer: fn() -> Result<Option<GeoPoint>>,
        calls: Cell<usize>,
    }

    impl StubResolver {
        fn new(answer: fn() -> Result<Option<GeoPoint>>) -> Self {
            Self { answer, calls: Cell::new(0) }
        }
    }

    impl AddressResolver for StubResolver {
        fn resolve(&self, _query: &str) -> Result<Option<GeoPoint>> {
            self.calls.set(self.calls.get() + 1);
            (self.answer)()
        }

        fn name(&self) -> &str {
            "stub-resolver"
        }
    }

    struct StubEstimator {
        answer: fn() -> Result<RouteEstimate>,
        destinations: RefCell<Vec<GeoPoint>>,
    }

    impl StubEstimator {
        fn new(answer: fn() -> Result<RouteEstimate>) -> Self {
            Self { answer, destinations: RefCell::new(Vec::new()) }
        }
    }

    impl RouteEstimator for StubEstimator {
        fn estimate(&self, _: &GeoPoint, destination: &GeoPoint, _: TravelMode) -> Result<RouteEstimate> {
            self.destinations.borrow_mut().push(*destination);
            (self.answer)()
        }

        fn name(&self) -> &str {
            "stub-router"
        }
    }

    fn victoria() -> Result<Option<GeoPoint>> {
        Ok(Some(GeoPoint { latitude: 48.4284, longitude: -123.3656 }))
    }

    fn two_minutes() -> Result<RouteEstimate> {
        Ok(RouteEstimate { path: None, duration_minutes: Some(2.0), distance_meters: Some(190.0) })
    }

    fn square(id: &str, lat: f64, lon: f64) -> PolygonFeature {
        let h = 0.0002;
        let ring = Ring::new(
            [[lon - h, lat - h], [lon + h, lat - h], [lon + h, lat + h], [lon - h, lat + h], [lon - h, lat - h]]
                .iter()
                .map(|c| GeoPoint::from_lon_lat(*c).unwrap())
                .collect(),
        );
        PolygonFeature::new(id, format!("Park {}", id), PolygonGeometry::new(vec![ring]))
    }

    fn store() -> FeatureStore {
        FeatureStore::new("test", vec![square("A", 48.4300, -123.3656), square("B", 48.4500, -123.3700)])
    }

    fn pipeline(
        resolver: StubResolver,
        estimator: StubEstimator,
    ) -> LookupPipeline<StubResolver, StubEstimator> {
        LookupPipeline::new(resolver, Some(estimator), NearestFeatureScanner::default())
    }

    #[test]
    fn test_address_lookup_with_route() {
        let store = store();
        let pipeline = pipeline(StubResolver::new(victoria), StubEstimator::new(two_minutes));

        let outcome = pipeline
            .locate(&LookupRequest::address("V8W 1P6", TravelMode::Walking), &store)
            .unwrap();

        assert_eq!(outcome.nearest.best().feature.name, "Park A");
        assert_eq!(outcome.duration_minutes(), Some(2.0));
        assert!(outcome.route_error.is_none());
        assert_eq!(pipeline.resolver.calls.get(), 1);

        let destinations = pipeline.estimator.as_ref().unwrap().destinations.borrow();
        assert_eq!(destinations.len(), 1);
        assert_eq!(destinations[0], outcome.nearest.best().centroid);
    }

    #[test]
    fn test_zero_results_is_invalid_origin() {
        let store = store();
        let pipeline = pipeline(StubResolver::new(|| Ok(None)), StubEstimator::new(two_minutes));

        let result = pipeline.locate(&LookupRequest::address("nowhere", TravelMode::Walking), &store);
        match result {
            Err(ParkfinderError::InvalidOrigin { reason }) => assert!(reason.contains("nowhere")),
            other => panic!("expected InvalidOrigin, got {:?}", other.map(|o| o.origin)),
        }
        assert!(pipeline.estimator.as_ref().unwrap().destinations.borrow().is_empty());
    }

    #[test]
    fn test_resolver_timeout_aborts_cycle() {
        let store = store();
        let pipeline = pipeline(
            StubResolver::new(|| {
                Err(ParkfinderError::ProviderTimeout {
                    provider: "stub-resolver".to_string(),
                    timeout: Duration::from_secs(10),
                })
            }),
            StubEstimator::new(two_minutes),
        );

        let result = pipeline.locate(&LookupRequest::address("V8W 1P6", TravelMode::Walking), &store);
        assert!(matches!(result, Err(ParkfinderError::ProviderTimeout { .. })));
    }

    #[test]
    fn test_route_failure_degrades() {
        let store = store();
        let pipeline = pipeline(
            StubResolver::new(victoria),
            StubEstimator::new(|| {
                Err(ParkfinderError::ProviderTimeout {
                    provider: "stub-router".to_string(),
                    timeout: Duration::from_secs(10),
                })
            }),
        );

        let outcome = pipeline
            .locate(&LookupRequest::address("V8W 1P6", TravelMode::Driving), &store)
            .unwrap();

        assert_eq!(outcome.nearest.best().feature.name, "Park A");
        assert!(outcome.route.is_none());
        assert!(outcome.route_error.unwrap().contains("did not respond within 10s"));
    }

    #[test]
    fn test_point_origin_skips_resolver() {
        let store = store();
        let pipeline = pipeline(StubResolver::new(victoria), StubEstimator::new(two_minutes));
        let origin = GeoPoint::new(48.45, -123.37).unwrap();

        let outcome = pipeline
            .locate(&LookupRequest::point(origin, TravelMode::Walking).without_route(), &store)
            .unwrap();

        assert_eq!(outcome.nearest.best().feature.name, "Park B");
        assert_eq!(pipeline.resolver.calls.get(), 0);
        assert!(pipeline.estimator.as_ref().unwrap().destinations.borrow().is_empty());
        assert!(outcome.route.is_none() && outcome.route_error.is_none());
    }

    #[test]
    fn test_out_of_range_resolver_point() {
        let store = store();
        let pipeline = pipeline(
            StubResolver::new(|| Ok(Some(GeoPoint { latitude: 200.0, longitude: 0.0 }))),
            StubEstimator::new(two_minutes),
        );

        let result = pipeline.locate(&LookupRequest::address("V8W 1P6", TravelMode::Walking), &store);
        assert!(matches!(result, Err(ParkfinderError::InvalidOrigin { .. })));
    }

    #[test]
    fn test_blank_address_never_reaches_resolver() {
        let store = store();
        let pipeline = pipeline(StubResolver::new(victoria), StubEstimator::new(two_minutes));

        let result = pipeline.locate(&LookupRequest::address("   ", TravelMode::Walking), &store);
        assert!(matches!(result, Err(ParkfinderError::InvalidOrigin { .. })));
        assert_eq!(pipeline.resolver.calls.get(), 0);
    }

    #[test]
    fn test_cycle_ids_are_unique() {
        let store = store();
        let pipeline = pipeline(StubResolver::new(victoria), StubEstimator::new(two_minutes));
        let request = LookupRequest::address("V8W 1P6", TravelMode::Walking).without_route();

        let a = pipeline.locate(&request, &store).unwrap().cycle_id;
        let b = pipeline.locate(&request, &store).unwrap().cycle_id;
        assert_ne!(a, b);
    }
}
