//! Error types for Parkfinder

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParkfinderError {
    // Origin errors
    #[error("Invalid origin: {reason}")]
    InvalidOrigin { reason: String },

    // Data errors
    #[error("No usable features in store ({skipped} skipped as degenerate)")]
    EmptyStore { skipped: usize },

    #[error("Degenerate geometry at feature {feature_id}: {reason}")]
    DegenerateGeometry { feature_id: String, reason: String },

    #[error("Failed to parse {format} dataset: {reason}")]
    ParseError { format: String, reason: String },

    #[error("Unsupported dataset format '{extension}'. Supported: {}", supported.join(", "))]
    UnsupportedFormat {
        extension: String,
        supported: Vec<String>,
    },

    #[error("Cannot reproject from EPSG:{from_epsg} to EPSG:{to_epsg}: {reason}")]
    Reprojection {
        from_epsg: u32,
        to_epsg: u32,
        reason: String,
    },

    // External collaborator errors
    #[error("{provider} did not respond within {}s", timeout.as_secs())]
    ProviderTimeout { provider: String, timeout: Duration },

    #[error("{provider} failed: {reason}")]
    ProviderError { provider: String, reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    #[error("Dataset not found at {path}")]
    DatasetNotFound { path: PathBuf },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ParkfinderError {
    /// Whether this error came from an external collaborator (resolver,
    /// router, dataset feed) rather than from the data or the caller.
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, Self::ProviderTimeout { .. } | Self::ProviderError { .. })
    }
}

pub type Result<T> = std::result::Result<T, ParkfinderError>;
