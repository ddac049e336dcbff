//! Parkfinder Geo - Centroids, geodesic distance, and the nearest-feature scan
//!
//! This crate turns raw datasets into a feature store (reprojection,
//! validation, attribute mapping) and answers "which feature is closest to
//! this point" over that store.

pub mod centroid;
pub mod distance;
pub mod ingest;
pub mod scanner;
pub mod transform;
pub mod validation;

pub use centroid::centroid;
pub use distance::{distance_meters, DistanceEngine, DistanceMetric};
pub use ingest::{build_store, IngestReport};
pub use scanner::{find_nearest, NearestFeatureScanner};
