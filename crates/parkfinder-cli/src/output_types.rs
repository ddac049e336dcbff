use chrono::{DateTime, Utc};
use parkfinder_core::models::{AmenityKey, DistanceAnnotatedFeature, GeoPoint, TravelMode};
use parkfinder_lookup::LookupOutcome;
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::Tabled;

use crate::output::format_meters;

/// JSON output for one lookup
#[derive(Debug, Serialize)]
pub struct LookupOutput {
    pub query: String,
    pub cycle_id: String,
    pub origin: GeoPoint,
    pub mode: TravelMode,
    pub nearest: RankedPark,
    pub route: Option<RouteOutput>,
    pub route_error: Option<String>,
    pub ranking: Vec<RankedPark>,
    pub skipped: usize,
}

#[derive(Debug, Serialize)]
pub struct RankedPark {
    pub rank: usize,
    pub id: String,
    pub name: String,
    pub distance_meters: f64,
    pub centroid: GeoPoint,
    pub amenities: Vec<AmenityKey>,
}

#[derive(Debug, Serialize)]
pub struct RouteOutput {
    pub duration_minutes: Option<f64>,
    pub distance_meters: Option<f64>,
}

impl LookupOutput {
    pub fn from_outcome(query: &str, outcome: &LookupOutcome<'_>, top: usize) -> Self {
        Self {
            query: query.to_string(),
            cycle_id: outcome.cycle_id.to_string(),
            origin: outcome.origin,
            mode: outcome.mode,
            nearest: RankedPark::new(1, outcome.nearest.best()),
            route: outcome.route.as_ref().map(|r| RouteOutput {
                duration_minutes: r.duration_minutes,
                distance_meters: r.distance_meters,
            }),
            route_error: outcome.route_error.clone(),
            ranking: outcome
                .nearest
                .top(top)
                .iter()
                .enumerate()
                .map(|(i, ranked)| RankedPark::new(i + 1, ranked))
                .collect(),
            skipped: outcome.nearest.skipped().len(),
        }
    }
}

impl RankedPark {
    fn new(rank: usize, ranked: &DistanceAnnotatedFeature<'_>) -> Self {
        Self {
            rank,
            id: ranked.feature.id.as_str().to_string(),
            name: ranked.feature.name.clone(),
            distance_meters: ranked.distance_meters,
            centroid: ranked.centroid,
            amenities: ranked.feature.attributes.present_amenities().collect(),
        }
    }
}

/// Row of the ranking table
#[derive(Tabled)]
pub struct RankingRow {
    #[tabled(rename = "#")]
    pub rank: usize,
    #[tabled(rename = "Park")]
    pub name: String,
    #[tabled(rename = "Distance")]
    pub distance: String,
    #[tabled(rename = "Amenities")]
    pub amenities: String,
}

impl RankingRow {
    pub fn from_outcome(outcome: &LookupOutcome<'_>, top: usize) -> Vec<Self> {
        outcome
            .nearest
            .top(top)
            .iter()
            .enumerate()
            .map(|(i, ranked)| Self {
                rank: i + 1,
                name: ranked.feature.name.clone(),
                distance: format_meters(ranked.distance_meters),
                amenities: ranked
                    .feature
                    .attributes
                    .present_amenities()
                    .map(|a| a.label())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
            .collect()
    }
}

/// JSON output for the dataset summary
#[derive(Debug, Serialize)]
pub struct SummaryOutput {
    pub source: String,
    pub loaded_at: DateTime<Utc>,
    pub parks: usize,
    pub amenities: BTreeMap<AmenityKey, usize>,
}

#[derive(Tabled)]
pub struct AmenityRow {
    #[tabled(rename = "Amenity")]
    pub amenity: String,
    #[tabled(rename = "Parks")]
    pub parks: usize,
}

#[derive(Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

/// JSON output for one configuration entry
#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub value: String,
    pub source: String,
}
