//! Live GeoJSON feed as a dataset source

use parkfinder_core::config::ProviderSettings;
use parkfinder_core::formats::geojson::GeoJsonReader;
use parkfinder_core::formats::FormatDataset;
use parkfinder_core::ports::DatasetSource;
use parkfinder_core::{ParkfinderError, Result};
use reqwest::Url;

use crate::http::HttpClient;

const PROVIDER: &str = "Dataset feed";

/// Fetches a GeoJSON document over HTTP(S), e.g. a municipal open-data
/// endpoint, on every `fetch`.
pub struct HttpFeedSource {
    url: Url,
    http: HttpClient,
}

impl HttpFeedSource {
    /// `settings.base_url` is ignored; the feed URL is given explicitly
    pub fn new(url: &str, settings: &ProviderSettings) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| ParkfinderError::ConfigInvalid {
            key: "dataset".to_string(),
            reason: format!("'{}' is not a valid URL: {}", url, e),
        })?;
        Ok(Self { url, http: HttpClient::new(PROVIDER, settings)? })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl DatasetSource for HttpFeedSource {
    fn fetch(&self) -> Result<FormatDataset> {
        let body = self.http.get_text(self.url.clone())?;
        let dataset = GeoJsonReader.parse_str(&body, &feed_name(&self.url))?;

        tracing::info!(
            url = %self.url,
            features = dataset.features.len(),
            "Fetched dataset feed"
        );
        Ok(dataset)
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

/// Whether a dataset location refers to a feed rather than a local file
pub fn is_feed_location(location: &str) -> bool {
    let lower = location.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Last path segment without extension, or the host
fn feed_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.split('.').next().unwrap_or(segment).to_string())
        .or_else(|| url.host_str().map(String::from))
        .unwrap_or_else(|| "feed".to_string())
}
