use clap::Parser;
use parkfinder_core::config::{CliConfigOverrides, DistanceMetric};
use parkfinder_core::models::{GeoPoint, TravelMode};
use std::path::PathBuf;

/// Parkfinder - find the nearest park to an address
#[derive(Parser, Debug)]
#[command(name = "parkfinder")]
#[command(about = "Find the nearest municipal park to an address", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Park dataset: a Shapefile/GeoJSON path or an http(s) GeoJSON feed
    #[arg(long, value_name = "PATH|URL")]
    pub dataset: Option<String>,

    /// Travel mode for route estimates (walking or driving)
    #[arg(long)]
    pub mode: Option<TravelMode>,

    /// Distance formula (vincenty, karney, haversine)
    #[arg(long)]
    pub metric: Option<DistanceMetric>,

    /// Text appended to every address, e.g. "Victoria, BC"
    #[arg(long, value_name = "TEXT")]
    pub region: Option<String>,

    /// Provider timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Report straight-line distance only; never call the router
    #[arg(long)]
    pub no_route: bool,

    /// Number of parks in the ranking table
    #[arg(long, default_value = "5")]
    pub top: usize,

    /// Write a GeoJSON map of each lookup to this file
    #[arg(long, value_name = "FILE")]
    pub map_out: Option<PathBuf>,

    /// Look up these addresses and exit instead of prompting
    #[arg(long, value_name = "ADDRESS")]
    pub address: Vec<String>,

    /// Look up from a known point ("lat,lon") and exit instead of prompting
    #[arg(long, value_name = "LAT,LON", value_parser = parse_point, allow_hyphen_values = true)]
    pub at: Vec<GeoPoint>,

    /// Print amenity counts for the dataset
    #[arg(long)]
    pub summary: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn config_overrides(&self) -> CliConfigOverrides {
        CliConfigOverrides {
            dataset: self.dataset.clone(),
            region_qualifier: self.region.clone(),
            travel_mode: self.mode,
            distance_metric: self.metric,
            provider_timeout_secs: self.timeout,
        }
    }

    /// Whether lookups were given on the command line
    pub fn is_one_shot(&self) -> bool {
        !self.address.is_empty() || !self.at.is_empty() || self.summary
    }
}

/// Parse "lat,lon". Range is checked by the lookup, not here.
pub fn parse_point(value: &str) -> Result<GeoPoint, String> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got '{}'", value))?;

    let latitude = lat.trim().parse::<f64>().map_err(|e| format!("latitude '{}': {}", lat.trim(), e))?;
    let longitude = lon.trim().parse::<f64>().map_err(|e| format!("longitude '{}': {}", lon.trim(), e))?;

    Ok(GeoPoint { latitude, longitude })
}
