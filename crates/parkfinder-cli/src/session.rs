//! Lookup session: one-shot lookups from the command line, or a prompt loop

use anyhow::Result;
use dialoguer::Input;
use parkfinder_core::models::{AmenityKey, FeatureStore, GeoPoint, TravelMode};
use parkfinder_core::ports::{AddressResolver, RouteEstimator};
use parkfinder_lookup::{LookupOutcome, LookupPipeline, LookupRequest};
use std::path::PathBuf;

use crate::errors::explain;
use crate::map::write_map;
use crate::output::{format_meters, format_minutes, OutputWriter};
use crate::output_types::{AmenityRow, LookupOutput, RankingRow, SummaryOutput};

const QUIT_WORDS: [&str; 3] = ["quit", "exit", "q"];

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub mode: TravelMode,
    pub top: usize,
    pub map_out: Option<PathBuf>,
}

/// What the user typed at the prompt
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Lookup(String),
    Summary,
    Quit,
}

impl Command {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let lower = input.to_lowercase();
        if input.is_empty() || QUIT_WORDS.contains(&lower.as_str()) {
            Command::Quit
        } else if lower == "summary" {
            Command::Summary
        } else {
            Command::Lookup(input.to_string())
        }
    }
}

pub struct Session<'s, R, E>
where
    R: AddressResolver,
    E: RouteEstimator,
{
    store: &'s FeatureStore,
    pipeline: LookupPipeline<R, E>,
    output: &'s OutputWriter,
    options: SessionOptions,
}

impl<'s, R, E> Session<'s, R, E>
where
    R: AddressResolver,
    E: RouteEstimator,
{
    pub fn new(
        store: &'s FeatureStore,
        pipeline: LookupPipeline<R, E>,
        output: &'s OutputWriter,
        options: SessionOptions,
    ) -> Self {
        Self { store, pipeline, output, options }
    }

    /// Look up an address and report the outcome
    pub fn lookup_address(&self, query: &str) -> Result<()> {
        let request = LookupRequest::address(query, self.options.mode);
        self.run(&request, query)
    }

    /// Look up from a known point and report the outcome
    pub fn lookup_point(&self, point: GeoPoint) -> Result<()> {
        let request = LookupRequest::point(point, self.options.mode);
        self.run(&request, &point.to_string())
    }

    fn run(&self, request: &LookupRequest, label: &str) -> Result<()> {
        let outcome = self.pipeline.locate(request, self.store)?;
        self.report(label, &outcome)?;

        if let Some(path) = &self.options.map_out {
            write_map(path, &outcome)?;
            self.output.info(format!("Map written to {}", path.display()));
        }
        Ok(())
    }

    fn report(&self, label: &str, outcome: &LookupOutcome<'_>) -> Result<()> {
        if self.output.is_json() {
            return self.output.result(LookupOutput::from_outcome(label, outcome, self.options.top));
        }

        let best = outcome.nearest.best();
        self.output.section(format!("Nearest park to {}", label));
        self.output.kv("Park", &best.feature.name);
        self.output.kv("Distance", format_meters(best.distance_meters));

        match (outcome.duration_minutes(), &outcome.route_error) {
            (Some(minutes), _) => {
                self.output.kv(format!("Travel time ({})", outcome.mode), format_minutes(minutes))
            }
            (None, Some(reason)) => self.output.warning(format!("No travel time: {}", reason)),
            (None, None) => {}
        }

        let amenities: Vec<&str> =
            best.feature.attributes.present_amenities().map(|a| a.label()).collect();
        if !amenities.is_empty() {
            self.output.kv("Amenities", amenities.join(", "));
        }

        if self.options.top > 1 {
            self.output.table(RankingRow::from_outcome(outcome, self.options.top));
        }

        let skipped = outcome.nearest.skipped().len();
        if skipped > 0 {
            self.output.info(format!("{} parks with unusable geometry were not ranked", skipped));
        }
        Ok(())
    }

    /// Amenity counts over the whole store
    pub fn summary(&self) -> Result<()> {
        let counts = self.store.amenity_counts();

        if self.output.is_json() {
            return self.output.result(SummaryOutput {
                source: self.store.source().to_string(),
                loaded_at: self.store.loaded_at(),
                parks: self.store.len(),
                amenities: counts,
            });
        }

        self.output.section("Dataset summary");
        self.output.kv("Source", self.store.source());
        self.output.kv("Loaded", self.store.loaded_at().format("%Y-%m-%d %H:%M:%S UTC"));
        self.output.kv("Parks", self.store.len());

        let rows = AmenityKey::ALL
            .iter()
            .map(|key| AmenityRow {
                amenity: key.label().to_string(),
                parks: counts.get(key).copied().unwrap_or(0),
            })
            .collect();
        self.output.table(rows);
        Ok(())
    }

    /// Report a failed cycle without ending the session
    pub fn report_error(&self, error: &anyhow::Error) {
        tracing::debug!(error = %error, "Lookup failed");
        if self.output.is_json() {
            self.output.error(error);
        } else {
            explain(error).display();
        }
    }

    /// Prompt until the user quits. Lookup failures are reported and the
    /// loop continues; only a broken terminal ends it early.
    pub fn interactive(&self) -> Result<()> {
        self.output.info(format!(
            "{} parks loaded. Enter a postal code or address, 'summary', or press Enter to quit.",
            self.store.len()
        ));

        loop {
            let input: String = Input::new()
                .with_prompt("Postal code or address")
                .allow_empty(true)
                .interact_text()?;

            let result = match Command::parse(&input) {
                Command::Quit => break,
                Command::Summary => self.summary(),
                Command::Lookup(query) => self.lookup_address(&query),
            };

            if let Err(e) = result {
                self.report_error(&e);
            }
        }

        self.output.success("Goodbye");
        Ok(())
    }
}
