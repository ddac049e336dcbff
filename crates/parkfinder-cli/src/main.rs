//! Parkfinder CLI
//!
//! Loads a park dataset once, then answers "which park is nearest to this
//! address?" either for addresses given on the command line or in an
//! interactive prompt loop.

mod cli;
mod dataset;
mod errors;
mod map;
mod output;
mod output_types;
mod progress;
mod session;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use parkfinder_core::config::LayeredConfig;
use parkfinder_geo::{DistanceEngine, NearestFeatureScanner};
use parkfinder_lookup::LookupPipeline;
use parkfinder_providers::{NominatimResolver, OsrmRouteEstimator};
use std::collections::BTreeMap;
use std::process::ExitCode;

use output::OutputWriter;
use output_types::{ConfigEntry, ConfigRow};
use session::{Session, SessionOptions};

fn main() -> ExitCode {
    // Logs go to stderr so `--json` output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = OutputWriter::new(cli.json);

    match run(cli, &output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if output.is_json() {
                output.error(&e);
            } else {
                errors::explain(&e).display();
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, output: &OutputWriter) -> Result<()> {
    let mut config = LayeredConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.update_from_cli(cli.config_overrides());

    if cli.show_config {
        return show_config(&config, output);
    }

    let (store, report) = dataset::load_store(&config, output.is_json())?;
    if !report.rejected.is_empty() {
        output.warning(format!(
            "{} of {} features were not polygons with valid coordinates and were skipped",
            report.rejected.len(),
            report.total
        ));
    }

    let resolver =
        NominatimResolver::new(&config.geocoder_settings(), config.region_qualifier.value.clone())?;
    let estimator = if cli.no_route {
        None
    } else {
        Some(OsrmRouteEstimator::new(&config.router_settings())?)
    };
    let scanner = NearestFeatureScanner::new(DistanceEngine::new(config.distance_metric.value));

    let session = Session::new(
        &store,
        LookupPipeline::new(resolver, estimator, scanner),
        output,
        SessionOptions {
            mode: config.travel_mode.value,
            top: cli.top,
            map_out: cli.map_out.clone(),
        },
    );

    if !cli.is_one_shot() {
        return session.interactive();
    }

    let mut failures = 0;
    if cli.summary {
        session.summary()?;
    }
    for point in &cli.at {
        if let Err(e) = session.lookup_point(*point) {
            session.report_error(&e);
            failures += 1;
        }
    }
    for address in &cli.address {
        if let Err(e) = session.lookup_address(address) {
            session.report_error(&e);
            failures += 1;
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} lookups failed", failures, cli.at.len() + cli.address.len());
    }
    Ok(())
}

fn show_config(config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let entries: BTreeMap<String, ConfigEntry> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| (key, ConfigEntry { value, source: source.to_string() }))
        .collect();

    if output.is_json() {
        return output.result(entries);
    }

    output.section("Configuration");
    output.table(
        entries
            .into_iter()
            .map(|(key, entry)| ConfigRow { key, value: entry.value, source: entry.source })
            .collect(),
    );
    Ok(())
}
