//! Parkfinder Providers - HTTP adapters for external collaborators
//!
//! Each adapter implements one of the port traits from
//! `parkfinder_core::ports` and blocks on a private current-thread runtime,
//! so callers stay synchronous.

pub mod feed;
pub mod http;
pub mod nominatim;
pub mod osrm;

pub use feed::HttpFeedSource;
pub use nominatim::NominatimResolver;
pub use osrm::OsrmRouteEstimator;
