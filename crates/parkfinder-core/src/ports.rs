//! Collaborator traits for the external services a lookup depends on
//!
//! Implementations live in `parkfinder-providers`; tests use in-memory
//! doubles. All calls are synchronous from the caller's point of view.

use crate::error::Result;
use crate::formats::FormatDataset;
use crate::models::{GeoPoint, RouteEstimate, TravelMode};

/// Turns free text (a postal code or street address) into a point.
pub trait AddressResolver {
    /// `Ok(None)` means the resolver answered with zero results, which is
    /// distinct from the resolver failing (`ProviderTimeout`/`ProviderError`).
    fn resolve(&self, query: &str) -> Result<Option<GeoPoint>>;

    /// Provider name used in logs and error messages
    fn name(&self) -> &str;
}

/// Estimates a travel route between two points.
pub trait RouteEstimator {
    fn estimate(
        &self,
        origin: &GeoPoint,
        destination: &GeoPoint,
        mode: TravelMode,
    ) -> Result<RouteEstimate>;

    fn name(&self) -> &str;
}

/// Produces the raw park dataset (local file or live feed).
pub trait DatasetSource {
    fn fetch(&self) -> Result<FormatDataset>;

    /// Human-readable location of the dataset, used as the store's source label
    fn describe(&self) -> String;
}

impl<T: AddressResolver + ?Sized> AddressResolver for Box<T> {
    fn resolve(&self, query: &str) -> Result<Option<GeoPoint>> {
        (**self).resolve(query)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: RouteEstimator + ?Sized> RouteEstimator for Box<T> {
    fn estimate(
        &self,
        origin: &GeoPoint,
        destination: &GeoPoint,
        mode: TravelMode,
    ) -> Result<RouteEstimate> {
        (**self).estimate(origin, destination, mode)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: DatasetSource + ?Sized> DatasetSource for Box<T> {
    fn fetch(&self) -> Result<FormatDataset> {
        (**self).fetch()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
