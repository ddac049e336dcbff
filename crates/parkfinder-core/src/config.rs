use crate::error::{ParkfinderError, Result};
use crate::models::{AmenityKey, TravelMode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DATASET: &str = "Parks_and_Open_Spaces.shp";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_ROUTER_URL: &str = "https://router.project-osrm.org";
pub const DEFAULT_USER_AGENT: &str = concat!("parkfinder/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Default => f.write_str("default"),
            ConfigSource::File => f.write_str("file"),
            ConfigSource::Environment => f.write_str("env"),
            ConfigSource::Cli => f.write_str("cli"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Which geodesic formula the distance engine uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Vincenty inverse on WGS84, haversine fallback when it does not converge
    #[default]
    Vincenty,
    /// Karney's geodesic algorithm
    Karney,
    /// Great-circle distance on a sphere
    Haversine,
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMetric::Vincenty => f.write_str("vincenty"),
            DistanceMetric::Karney => f.write_str("karney"),
            DistanceMetric::Haversine => f.write_str("haversine"),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = ParkfinderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "vincenty" => Ok(DistanceMetric::Vincenty),
            "karney" | "geodesic" => Ok(DistanceMetric::Karney),
            "haversine" => Ok(DistanceMetric::Haversine),
            _ => Err(ParkfinderError::ConfigInvalid {
                key: "distance_metric".to_string(),
                reason: format!(
                    "Invalid distance metric: {}. Use vincenty, karney, or haversine",
                    s
                ),
            }),
        }
    }
}

/// Maps raw dataset field names onto canonical feature attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    /// Field holding a stable identifier; record index when unset
    pub id: Option<String>,
    /// Field holding the display name
    pub name: String,
    /// Field holding the area in square meters
    pub area: Option<String>,
    /// Field holding the perimeter in meters
    pub perimeter: Option<String>,
    /// Raw field name to amenity flag
    pub amenities: BTreeMap<String, AmenityKey>,
}

impl Default for FieldMapping {
    fn default() -> Self {
        let amenities = [
            ("Playground", AmenityKey::Playground),
            ("Washrooms", AmenityKey::Washrooms),
            ("Dog_Off_Leash", AmenityKey::DogOffLeash),
            ("Sports_Field", AmenityKey::SportsField),
            ("Picnic_Area", AmenityKey::PicnicArea),
            ("Drinking_Fountain", AmenityKey::DrinkingFountain),
            ("Tennis_Court", AmenityKey::TennisCourt),
            ("Spray_Park", AmenityKey::SprayPark),
            ("Trails", AmenityKey::Trails),
            ("Parking", AmenityKey::Parking),
        ]
        .into_iter()
        .map(|(field, key)| (field.to_string(), key))
        .collect();

        Self {
            id: None,
            name: "Park_Name".to_string(),
            area: Some("Shape__Area".to_string()),
            perimeter: Some("Shape__Length".to_string()),
            amenities,
        }
    }
}

/// Connection settings handed to an HTTP provider at construction
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub user_agent: String,
    pub timeout: Duration,
}

/// Layered configuration for Parkfinder
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub dataset: ConfigValue<String>,
    pub region_qualifier: ConfigValue<Option<String>>,
    pub travel_mode: ConfigValue<TravelMode>,
    pub distance_metric: ConfigValue<DistanceMetric>,
    pub provider_timeout_secs: ConfigValue<u64>,
    pub geocoder_url: ConfigValue<String>,
    pub geocoder_api_key: ConfigValue<Option<String>>,
    pub user_agent: ConfigValue<String>,
    pub router_url: ConfigValue<String>,
    pub router_api_key: ConfigValue<Option<String>>,
    pub fields: ConfigValue<FieldMapping>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            dataset: ConfigValue::new(DEFAULT_DATASET.to_string(), ConfigSource::Default),
            region_qualifier: ConfigValue::new(None, ConfigSource::Default),
            travel_mode: ConfigValue::new(TravelMode::Walking, ConfigSource::Default),
            distance_metric: ConfigValue::new(DistanceMetric::Vincenty, ConfigSource::Default),
            provider_timeout_secs: ConfigValue::new(
                DEFAULT_PROVIDER_TIMEOUT_SECS,
                ConfigSource::Default,
            ),
            geocoder_url: ConfigValue::new(DEFAULT_GEOCODER_URL.to_string(), ConfigSource::Default),
            geocoder_api_key: ConfigValue::new(None, ConfigSource::Default),
            user_agent: ConfigValue::new(DEFAULT_USER_AGENT.to_string(), ConfigSource::Default),
            router_url: ConfigValue::new(DEFAULT_ROUTER_URL.to_string(), ConfigSource::Default),
            router_api_key: ConfigValue::new(None, ConfigSource::Default),
            fields: ConfigValue::new(FieldMapping::default(), ConfigSource::Default),
        }
    }

    /// Defaults, then the file (when given), then the environment
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let config = Self::with_defaults();
        let config = match config_file {
            Some(path) => config.load_from_file(path)?,
            None => config,
        };
        Ok(config.load_from_env())
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ParkfinderError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| ParkfinderError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(dataset) = file_config.dataset {
            self.dataset.update(dataset, ConfigSource::File);
        }

        if let Some(region) = file_config.region_qualifier {
            self.region_qualifier.update(non_empty(region), ConfigSource::File);
        }

        if let Some(mode) = file_config.travel_mode {
            self.travel_mode.update(mode, ConfigSource::File);
        }

        if let Some(metric) = file_config.distance_metric {
            self.distance_metric.update(metric, ConfigSource::File);
        }

        if let Some(secs) = file_config.provider_timeout_secs {
            if secs == 0 {
                return Err(ParkfinderError::ConfigInvalid {
                    key: "provider_timeout_secs".to_string(),
                    reason: "timeout must be at least 1 second".to_string(),
                });
            }
            self.provider_timeout_secs.update(secs, ConfigSource::File);
        }

        if let Some(geocoder) = file_config.geocoder {
            if let Some(url) = geocoder.base_url {
                self.geocoder_url.update(url, ConfigSource::File);
            }
            if let Some(key) = geocoder.api_key {
                self.geocoder_api_key.update(non_empty(key), ConfigSource::File);
            }
            if let Some(agent) = geocoder.user_agent {
                self.user_agent.update(agent, ConfigSource::File);
            }
        }

        if let Some(router) = file_config.router {
            if let Some(url) = router.base_url {
                self.router_url.update(url, ConfigSource::File);
            }
            if let Some(key) = router.api_key {
                self.router_api_key.update(non_empty(key), ConfigSource::File);
            }
        }

        if let Some(fields) = file_config.fields {
            self.fields.update(fields, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // PARKFINDER_DATASET
        if let Ok(dataset) = env::var("PARKFINDER_DATASET") {
            self.dataset.update(dataset, ConfigSource::Environment);
        }

        // PARKFINDER_REGION
        if let Ok(region) = env::var("PARKFINDER_REGION") {
            self.region_qualifier.update(non_empty(region), ConfigSource::Environment);
        }

        // PARKFINDER_TRAVEL_MODE
        if let Ok(mode_str) = env::var("PARKFINDER_TRAVEL_MODE") {
            match mode_str.parse::<TravelMode>() {
                Ok(mode) => self.travel_mode.update(mode, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid PARKFINDER_TRAVEL_MODE value '{}': expected walking or driving",
                    mode_str
                ),
            }
        }

        // PARKFINDER_DISTANCE_METRIC
        if let Ok(metric_str) = env::var("PARKFINDER_DISTANCE_METRIC") {
            match metric_str.parse::<DistanceMetric>() {
                Ok(metric) => self.distance_metric.update(metric, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid PARKFINDER_DISTANCE_METRIC value '{}': expected vincenty, karney, or haversine",
                    metric_str
                ),
            }
        }

        // PARKFINDER_PROVIDER_TIMEOUT
        if let Ok(timeout_str) = env::var("PARKFINDER_PROVIDER_TIMEOUT") {
            match timeout_str.parse::<u64>() {
                Ok(secs) if secs > 0 => {
                    self.provider_timeout_secs.update(secs, ConfigSource::Environment)
                }
                _ => tracing::warn!(
                    "Invalid PARKFINDER_PROVIDER_TIMEOUT value '{}': expected a positive number of seconds",
                    timeout_str
                ),
            }
        }

        if let Ok(url) = env::var("PARKFINDER_GEOCODER_URL") {
            self.geocoder_url.update(url, ConfigSource::Environment);
        }

        if let Ok(key) = env::var("PARKFINDER_GEOCODER_API_KEY") {
            self.geocoder_api_key.update(non_empty(key), ConfigSource::Environment);
        }

        if let Ok(agent) = env::var("PARKFINDER_USER_AGENT") {
            self.user_agent.update(agent, ConfigSource::Environment);
        }

        if let Ok(url) = env::var("PARKFINDER_ROUTER_URL") {
            self.router_url.update(url, ConfigSource::Environment);
        }

        if let Ok(key) = env::var("PARKFINDER_ROUTER_API_KEY") {
            self.router_api_key.update(non_empty(key), ConfigSource::Environment);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(dataset) = overrides.dataset {
            self.dataset.update(dataset, ConfigSource::Cli);
        }

        if let Some(region) = overrides.region_qualifier {
            self.region_qualifier.update(non_empty(region), ConfigSource::Cli);
        }

        if let Some(mode) = overrides.travel_mode {
            self.travel_mode.update(mode, ConfigSource::Cli);
        }

        if let Some(metric) = overrides.distance_metric {
            self.distance_metric.update(metric, ConfigSource::Cli);
        }

        if let Some(secs) = overrides.provider_timeout_secs {
            self.provider_timeout_secs.update(secs, ConfigSource::Cli);
        }
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs.value)
    }

    pub fn geocoder_settings(&self) -> ProviderSettings {
        ProviderSettings {
            base_url: self.geocoder_url.value.clone(),
            api_key: self.geocoder_api_key.value.clone(),
            user_agent: self.user_agent.value.clone(),
            timeout: self.provider_timeout(),
        }
    }

    pub fn router_settings(&self) -> ProviderSettings {
        ProviderSettings {
            base_url: self.router_url.value.clone(),
            api_key: self.router_api_key.value.clone(),
            user_agent: self.user_agent.value.clone(),
            timeout: self.provider_timeout(),
        }
    }

    /// Settings for fetching the dataset over HTTP. Carries no API key; the
    /// feed is a public endpoint and must not see provider credentials.
    pub fn feed_settings(&self) -> ProviderSettings {
        ProviderSettings {
            base_url: self.dataset.value.trim().to_string(),
            api_key: None,
            user_agent: self.user_agent.value.clone(),
            timeout: self.provider_timeout(),
        }
    }

    /// Get all configuration values as a map for inspection. API keys are
    /// masked.
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert("dataset".to_string(), (self.dataset.value.clone(), self.dataset.source));

        map.insert(
            "region_qualifier".to_string(),
            (
                self.region_qualifier.value.clone().unwrap_or_else(|| "(none)".to_string()),
                self.region_qualifier.source,
            ),
        );

        map.insert(
            "travel_mode".to_string(),
            (self.travel_mode.value.to_string(), self.travel_mode.source),
        );

        map.insert(
            "distance_metric".to_string(),
            (self.distance_metric.value.to_string(), self.distance_metric.source),
        );

        map.insert(
            "provider_timeout".to_string(),
            (format!("{}s", self.provider_timeout_secs.value), self.provider_timeout_secs.source),
        );

        map.insert(
            "geocoder_url".to_string(),
            (self.geocoder_url.value.clone(), self.geocoder_url.source),
        );

        map.insert(
            "geocoder_api_key".to_string(),
            (mask(&self.geocoder_api_key.value), self.geocoder_api_key.source),
        );

        map.insert("user_agent".to_string(), (self.user_agent.value.clone(), self.user_agent.source));

        map.insert("router_url".to_string(), (self.router_url.value.clone(), self.router_url.source));

        map.insert(
            "router_api_key".to_string(),
            (mask(&self.router_api_key.value), self.router_api_key.source),
        );

        map.insert(
            "fields.name".to_string(),
            (self.fields.value.name.clone(), self.fields.source),
        );

        map.insert(
            "fields.amenities".to_string(),
            (format!("{} mapped", self.fields.value.amenities.len()), self.fields.source),
        );

        map
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn mask(key: &Option<String>) -> String {
    match key {
        Some(_) => "********".to_string(),
        None => "(none)".to_string(),
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    dataset: Option<String>,
    region_qualifier: Option<String>,
    travel_mode: Option<TravelMode>,
    distance_metric: Option<DistanceMetric>,
    provider_timeout_secs: Option<u64>,
    geocoder: Option<FileProviderConfig>,
    router: Option<FileProviderConfig>,
    fields: Option<FieldMapping>,
}

#[derive(Debug, Deserialize, Serialize)]
struct FileProviderConfig {
    base_url: Option<String>,
    api_key: Option<String>,
    user_agent: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub dataset: Option<String>,
    pub region_qualifier: Option<String>,
    pub travel_mode: Option<TravelMode>,
    pub distance_metric: Option<DistanceMetric>,
    pub provider_timeout_secs: Option<u64>,
}
