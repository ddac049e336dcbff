//! Blocking HTTP access shared by the provider adapters

use std::time::Duration;

use parkfinder_core::config::ProviderSettings;
use parkfinder_core::{ParkfinderError, Result};
use reqwest::Url;

/// A reqwest client plus the runtime it is driven on.
///
/// Every request carries the configured timeout; running out of time is
/// reported as `ProviderTimeout`, any other failure as `ProviderError`.
pub struct HttpClient {
    provider: String,
    timeout: Duration,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl HttpClient {
    pub fn new(provider: impl Into<String>, settings: &ProviderSettings) -> Result<Self> {
        let provider = provider.into();

        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| ParkfinderError::ProviderError {
                provider: provider.clone(),
                reason: format!("Failed to build HTTP client: {}", e),
            })?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ParkfinderError::ProviderError {
                provider: provider.clone(),
                reason: format!("Failed to create async runtime: {}", e),
            })?;

        Ok(Self { provider, timeout: settings.timeout, client, runtime })
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET a URL and decode the body as JSON
    pub fn get_json(&self, url: Url) -> Result<serde_json::Value> {
        let body = self.get_text(url)?;
        serde_json::from_str(&body).map_err(|e| ParkfinderError::ProviderError {
            provider: self.provider.clone(),
            reason: format!("Failed to parse response: {}", e),
        })
    }

    /// GET a URL and return the body as text
    pub fn get_text(&self, url: Url) -> Result<String> {
        tracing::debug!(provider = %self.provider, url = %redact(&url), "HTTP GET");

        self.runtime.block_on(async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| self.classify(e))?;

            let status = response.status();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(ParkfinderError::ProviderError {
                    provider: self.provider.clone(),
                    reason: "rate limited (HTTP 429)".to_string(),
                });
            }
            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                return Err(ParkfinderError::ProviderError {
                    provider: self.provider.clone(),
                    reason: format!("HTTP {}: {}", status, truncate(&error_text, 200)),
                });
            }

            response.text().await.map_err(|e| self.classify(e))
        })
    }

    fn classify(&self, error: reqwest::Error) -> ParkfinderError {
        if error.is_timeout() {
            ParkfinderError::ProviderTimeout { provider: self.provider.clone(), timeout: self.timeout }
        } else {
            ParkfinderError::ProviderError {
                provider: self.provider.clone(),
                reason: error.to_string(),
            }
        }
    }
}

/// Join a base URL and a path, tolerating a trailing slash on the base
pub fn endpoint(provider: &str, base_url: &str, path: &str) -> Result<Url> {
    let joined = format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'));
    Url::parse(&joined).map_err(|e| ParkfinderError::ConfigInvalid {
        key: format!("{}.base_url", provider.to_lowercase()),
        reason: format!("'{}' is not a valid URL: {}", joined, e),
    })
}

/// URL with any `key` query parameter masked, for logging
fn redact(url: &Url) -> String {
    if !url.query_pairs().any(|(k, _)| k == "key") {
        return url.to_string();
    }
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
