//! Parkfinder Core - Domain models, collaborator ports, and configuration
//!
//! This crate holds the canonical types shared by every parkfinder crate:
//! points, polygon features, the per-query feature store, scan results,
//! the error taxonomy, and the dataset format readers.

pub mod config;
pub mod error;
pub mod formats;
pub mod models;
pub mod ports;

pub use error::{ParkfinderError, Result};
