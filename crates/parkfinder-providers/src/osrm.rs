//! OSRM route estimator.
//!
//! Requests a single route with full GeoJSON geometry from the OSRM
//! `route` service. OSRM reports duration in seconds and distance in
//! meters.
//!
//! See <https://project-osrm.org/docs/v5.24.0/api/#route-service>

use parkfinder_core::config::ProviderSettings;
use parkfinder_core::models::{GeoPoint, RouteEstimate, TravelMode};
use parkfinder_core::ports::RouteEstimator;
use parkfinder_core::{ParkfinderError, Result};
use reqwest::Url;
use serde::Deserialize;

use crate::http::{endpoint, HttpClient};

const PROVIDER: &str = "OSRM";

pub struct OsrmRouteEstimator {
    base_url: String,
    api_key: Option<String>,
    http: HttpClient,
}

impl OsrmRouteEstimator {
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        Ok(Self {
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            http: HttpClient::new(PROVIDER, settings)?,
        })
    }

    pub fn route_url(&self, origin: &GeoPoint, destination: &GeoPoint, mode: TravelMode) -> Result<Url> {
        let path = format!(
            "route/v1/{}/{:.6},{:.6};{:.6},{:.6}",
            profile(mode),
            origin.longitude,
            origin.latitude,
            destination.longitude,
            destination.latitude
        );
        let mut url = endpoint(PROVIDER, &self.base_url, &path)?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("overview", "full").append_pair("geometries", "geojson");
            if let Some(key) = &self.api_key {
                query.append_pair("key", key);
            }
        }

        Ok(url)
    }
}

impl RouteEstimator for OsrmRouteEstimator {
    fn estimate(
        &self,
        origin: &GeoPoint,
        destination: &GeoPoint,
        mode: TravelMode,
    ) -> Result<RouteEstimate> {
        let url = self.route_url(origin, destination, mode)?;
        let body = self.http.get_json(url)?;
        let estimate = parse_route(&body)?;

        tracing::info!(
            mode = %mode,
            duration_minutes = estimate.duration_minutes,
            distance_meters = estimate.distance_meters,
            "Estimated route"
        );
        Ok(estimate)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

/// OSRM profile for a travel mode
pub fn profile(mode: TravelMode) -> &'static str {
    match mode {
        TravelMode::Walking => "foot",
        TravelMode::Driving => "driving",
    }
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    duration: Option<f64>,
    distance: Option<f64>,
    geometry: Option<RouteGeometry>,
}

#[derive(Debug, Deserialize)]
struct RouteGeometry {
    coordinates: Vec<[f64; 2]>,
}

/// Parses an OSRM route response into an estimate.
///
/// A response without a route (`NoRoute`, or any non-`Ok` code) is an
/// error; individual missing fields are not.
pub fn parse_route(body: &serde_json::Value) -> Result<RouteEstimate> {
    let response: RouteResponse =
        serde_json::from_value(body.clone()).map_err(|e| ParkfinderError::ProviderError {
            provider: PROVIDER.to_string(),
            reason: format!("Unexpected OSRM response: {}", e),
        })?;

    if response.code != "Ok" {
        return Err(ParkfinderError::ProviderError {
            provider: PROVIDER.to_string(),
            reason: match response.message {
                Some(message) => format!("{}: {}", response.code, message),
                None => response.code,
            },
        });
    }

    let route = response.routes.into_iter().next().ok_or_else(|| ParkfinderError::ProviderError {
        provider: PROVIDER.to_string(),
        reason: "no route returned".to_string(),
    })?;

    let path = route.geometry.map(|geometry| {
        geometry
            .coordinates
            .into_iter()
            .map(|[lon, lat]| GeoPoint { latitude: lat, longitude: lon })
            .collect()
    });

    Ok(RouteEstimate {
        path,
        duration_minutes: route.duration.filter(|s| s.is_finite() && *s >= 0.0).map(|s| s / 60.0),
        distance_meters: route.distance.filter(|d| d.is_finite() && *d >= 0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_route() {
        let body = serde_json::json!({
            "code": "Ok",
            "routes": [{
                "duration": 150.0,
                "distance": 182.4,
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[-123.3656, 48.4284], [-123.3655, 48.4292], [-123.3656, 48.4300]]
                }
            }],
            "waypoints": []
        });

        let estimate = parse_route(&body).unwrap();
        assert_eq!(estimate.duration_minutes, Some(2.5));
        assert_eq!(estimate.distance_meters, Some(182.4));
        let path = estimate.path.unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path[0].latitude, 48.4284);
        assert_eq!(path[0].longitude, -123.3656);
    }

    #[test]
    fn test_parse_route_without_geometry() {
        let body = serde_json::json!({ "code": "Ok", "routes": [{ "duration": 60.0 }] });
        let estimate = parse_route(&body).unwrap();
        assert_eq!(estimate.duration_minutes, Some(1.0));
        assert!(estimate.path.is_none());
        assert!(estimate.distance_meters.is_none());
    }

    #[test]
    fn test_no_route_error() {
        let body = serde_json::json!({ "code": "NoRoute", "message": "Impossible route between points" });
        match parse_route(&body) {
            Err(ParkfinderError::ProviderError { reason, .. }) => assert!(reason.starts_with("NoRoute")),
            other => panic!("expected ProviderError, got {:?}", other),
        }

        let body = serde_json::json!({ "code": "Ok", "routes": [] });
        assert!(parse_route(&body).is_err());
    }

    #[test]
    fn test_route_url() {
        let settings = ProviderSettings {
            base_url: "https://router.project-osrm.org/".to_string(),
            api_key: None,
            user_agent: "parkfinder-test".to_string(),
            timeout: Duration::from_secs(10),
        };
        let estimator = OsrmRouteEstimator::new(&settings).unwrap();
        let origin = GeoPoint::new(48.4284, -123.3656).unwrap();
        let destination = GeoPoint::new(48.43, -123.3656).unwrap();

        let url = estimator.route_url(&origin, &destination, TravelMode::Walking).unwrap();
        assert_eq!(url.path(), "/route/v1/foot/-123.365600,48.428400;-123.365600,48.430000");
        assert_eq!(url.query(), Some("overview=full&geometries=geojson"));

        let url = estimator.route_url(&origin, &destination, TravelMode::Driving).unwrap();
        assert!(url.path().starts_with("/route/v1/driving/"));
        assert_eq!(estimator.name(), "OSRM");
    }
}
