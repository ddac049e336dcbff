use parkfinder_core::models::{GeoPoint, NearestResult, RouteEstimate, TravelMode};
use serde::Serialize;
use uuid::Uuid;

/// Where a lookup starts from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupOrigin {
    /// Free text for the address resolver (postal code, street address)
    Address(String),
    /// An already-known point; the resolver is not consulted
    Point(GeoPoint),
}

/// One query cycle's input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupRequest {
    pub origin: LookupOrigin,
    pub mode: TravelMode,
    /// Ask the route estimator for a route to the nearest park
    pub with_route: bool,
}

impl LookupRequest {
    /// Address lookup with a route for the given mode
    pub fn address(query: impl Into<String>, mode: TravelMode) -> Self {
        Self { origin: LookupOrigin::Address(query.into()), mode, with_route: true }
    }

    pub fn point(point: GeoPoint, mode: TravelMode) -> Self {
        Self { origin: LookupOrigin::Point(point), mode, with_route: true }
    }

    pub fn without_route(mut self) -> Self {
        self.with_route = false;
        self
    }
}

/// Result of one query cycle.
///
/// `route` and `route_error` are never both set. Both are `None` when no
/// route was requested.
#[derive(Debug, Clone, Serialize)]
pub struct LookupOutcome<'a> {
    pub cycle_id: Uuid,
    pub origin: GeoPoint,
    pub mode: TravelMode,
    pub nearest: NearestResult<'a>,
    pub route: Option<RouteEstimate>,
    pub route_error: Option<String>,
}

impl LookupOutcome<'_> {
    /// Travel time in minutes when the route estimator supplied one
    pub fn duration_minutes(&self) -> Option<f64> {
        self.route.as_ref().and_then(|r| r.duration_minutes)
    }
}
