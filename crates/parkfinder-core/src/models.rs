pub mod feature;
pub mod geometry;
pub mod result;
pub mod store;

pub use feature::{AmenityKey, FeatureAttributes, FeatureId, PolygonFeature};
pub use geometry::{BoundingBox, Crs, GeoPoint, PolygonGeometry, Ring};
pub use result::{
    DistanceAnnotatedFeature, NearestResult, RouteEstimate, SkippedFeature, TravelMode,
};
pub use store::FeatureStore;
