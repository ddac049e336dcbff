//! Nominatim / OpenStreetMap address resolver.
//!
//! Works against the public Nominatim instance or any compatible service
//! (self-hosted Nominatim, LocationIQ). When an API key is configured it is
//! sent as the `key` query parameter.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use parkfinder_core::config::ProviderSettings;
use parkfinder_core::models::GeoPoint;
use parkfinder_core::ports::AddressResolver;
use parkfinder_core::{ParkfinderError, Result};
use reqwest::Url;

use crate::http::{endpoint, HttpClient};

const PROVIDER: &str = "Nominatim";

pub struct NominatimResolver {
    base_url: String,
    api_key: Option<String>,
    region_qualifier: Option<String>,
    http: HttpClient,
}

impl NominatimResolver {
    pub fn new(settings: &ProviderSettings, region_qualifier: Option<String>) -> Result<Self> {
        Ok(Self {
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            region_qualifier,
            http: HttpClient::new(PROVIDER, settings)?,
        })
    }

    /// Search URL for a free-text query
    pub fn search_url(&self, query: &str) -> Result<Url> {
        let search = endpoint(PROVIDER, &self.base_url, "search")?;
        let query = compose_query(query, self.region_qualifier.as_deref());

        let mut params = vec![("q", query.as_str()), ("format", "jsonv2"), ("limit", "1")];
        if let Some(key) = &self.api_key {
            params.push(("key", key.as_str()));
        }

        Url::parse_with_params(search.as_str(), &params).map_err(|e| ParkfinderError::ConfigInvalid {
            key: "nominatim.base_url".to_string(),
            reason: e.to_string(),
        })
    }
}

impl AddressResolver for NominatimResolver {
    fn resolve(&self, query: &str) -> Result<Option<GeoPoint>> {
        if query.trim().is_empty() {
            return Ok(None);
        }

        let url = self.search_url(query)?;
        let body = self.http.get_json(url)?;
        let point = parse_response(&body)?;

        match &point {
            Some(p) => tracing::info!(query = %query, point = %p, "Resolved address"),
            None => tracing::info!(query = %query, "Address resolver returned no results"),
        }
        Ok(point)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

/// Append the region qualifier unless the query already ends with it
pub fn compose_query(query: &str, region_qualifier: Option<&str>) -> String {
    let query = query.trim();
    match region_qualifier.map(str::trim).filter(|r| !r.is_empty()) {
        Some(region) if !query.to_lowercase().ends_with(&region.to_lowercase()) => {
            format!("{}, {}", query, region)
        }
        _ => query.to_string(),
    }
}

/// Parses a Nominatim search response.
///
/// Coordinates are not range-checked here; an out-of-range point is
/// rejected as an invalid origin by the scan.
pub fn parse_response(body: &serde_json::Value) -> Result<Option<GeoPoint>> {
    let parse_error = |reason: &str| ParkfinderError::ProviderError {
        provider: PROVIDER.to_string(),
        reason: reason.to_string(),
    };

    let results = body
        .as_array()
        .ok_or_else(|| parse_error("Nominatim response is not an array"))?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let latitude = coordinate(&first["lat"]).ok_or_else(|| parse_error("Missing lat in Nominatim response"))?;
    let longitude = coordinate(&first["lon"]).ok_or_else(|| parse_error("Missing lon in Nominatim response"))?;

    Ok(Some(GeoPoint { latitude, longitude }))
}

/// Nominatim sends coordinates as strings; some compatible services send numbers
fn coordinate(value: &serde_json::Value) -> Option<f64> {
    value
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .or_else(|| value.as_f64())
}
