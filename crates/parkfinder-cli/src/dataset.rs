//! Dataset loading for the session

use anyhow::Result;
use parkfinder_core::config::LayeredConfig;
use parkfinder_core::formats::FileDatasetSource;
use parkfinder_core::models::FeatureStore;
use parkfinder_core::ports::DatasetSource;
use parkfinder_geo::{build_store, IngestReport};
use parkfinder_providers::feed::is_feed_location;
use parkfinder_providers::HttpFeedSource;

use crate::progress::{create_spinner, finish_error, finish_success};

/// Pick the source for a dataset location: an http(s) URL is a live feed,
/// anything else a local file
pub fn open_source(config: &LayeredConfig) -> Result<Box<dyn DatasetSource>> {
    let location = config.dataset.value.trim();

    if is_feed_location(location) {
        Ok(Box::new(HttpFeedSource::new(location, &config.feed_settings())?))
    } else {
        Ok(Box::new(FileDatasetSource::new(location)))
    }
}

/// Fetch the dataset and build the store behind a spinner
pub fn load_store(config: &LayeredConfig, quiet: bool) -> Result<(FeatureStore, IngestReport)> {
    let source = open_source(config)?;
    let description = source.describe();

    let spinner = create_spinner(&format!("Loading parks from {}...", description), quiet);

    let loaded = source
        .fetch()
        .and_then(|dataset| build_store(dataset, &config.fields.value, description.clone()));

    match loaded {
        Ok((store, report)) => {
            finish_success(&spinner, &format!("Loaded {} parks from {}", store.len(), description));
            tracing::info!(
                source = %description,
                total = report.total,
                loaded = report.loaded,
                rejected = report.rejected.len(),
                degenerate = report.degenerate,
                "Dataset loaded"
            );
            Ok((store, report))
        }
        Err(e) => {
            finish_error(&spinner, &format!("Could not load {}", description));
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkfinder_core::config::ConfigSource;
    use std::io::Write;

    fn config_for(location: &str) -> LayeredConfig {
        let mut config = LayeredConfig::with_defaults();
        config.dataset.update(location.to_string(), ConfigSource::Cli);
        config
    }

    #[test]
    fn test_open_source_picks_feed() {
        let source = open_source(&config_for("https://example.org/parks.geojson")).unwrap();
        assert_eq!(source.describe(), "https://example.org/parks.geojson");
    }

    #[test]
    fn test_open_source_picks_file() {
        let source = open_source(&config_for("data/parks.geojson")).unwrap();
        assert!(source.describe().contains("parks.geojson"));
    }

    #[test]
    fn test_load_store_from_file() {
        let mut file = tempfile::Builder::new().suffix(".geojson").tempfile().unwrap();
        write!(
            file,
            r#"{{"type":"FeatureCollection","features":[{{"type":"Feature","geometry":{{"type":"Polygon","coordinates":[[[-123.3658,48.4298],[-123.3654,48.4298],[-123.3654,48.4302],[-123.3658,48.4302],[-123.3658,48.4298]]]}},"properties":{{"Park_Name":"Park A","Playground":"Yes"}}}}]}}"#
        )
        .unwrap();

        let config = config_for(file.path().to_str().unwrap());
        let (store, report) = load_store(&config, true).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(report.loaded, 1);
        assert_eq!(store.features()[0].name, "Park A");
    }

    #[test]
    fn test_load_store_missing_file() {
        let config = config_for("/nonexistent/Parks_and_Open_Spaces.shp");
        assert!(load_store(&config, true).is_err());
    }
}
