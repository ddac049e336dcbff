//! Parkfinder Lookup - The query cycle
//!
//! Resolves an origin, scans the feature store for the nearest park, and
//! optionally asks a directions provider for a route to it. Collaborators
//! are injected at construction.

pub mod models;
pub mod pipeline;

pub use models::{LookupOrigin, LookupOutcome, LookupRequest};
pub use pipeline::LookupPipeline;
