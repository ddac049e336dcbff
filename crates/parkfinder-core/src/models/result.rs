use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::feature::{FeatureId, PolygonFeature};
use super::geometry::GeoPoint;
use crate::error::ParkfinderError;

/// A feature paired with its centroid and distance from the query origin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceAnnotatedFeature<'a> {
    pub feature: &'a PolygonFeature,
    pub centroid: GeoPoint,
    pub distance_meters: f64,
}

/// A feature the scanner could not rank, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFeature {
    pub id: FeatureId,
    pub reason: String,
}

/// Outcome of a nearest-feature scan.
///
/// `all` is sorted ascending by distance and never empty; `best` is its
/// first entry.
#[derive(Debug, Clone, Serialize)]
pub struct NearestResult<'a> {
    all: Vec<DistanceAnnotatedFeature<'a>>,
    skipped: Vec<SkippedFeature>,
}

impl<'a> NearestResult<'a> {
    /// Wrap an already-sorted ranking. Returns `None` when the ranking is empty.
    pub fn from_ranking(
        all: Vec<DistanceAnnotatedFeature<'a>>,
        skipped: Vec<SkippedFeature>,
    ) -> Option<Self> {
        if all.is_empty() {
            None
        } else {
            Some(Self { all, skipped })
        }
    }

    pub fn best(&self) -> &DistanceAnnotatedFeature<'a> {
        &self.all[0]
    }

    pub fn all(&self) -> &[DistanceAnnotatedFeature<'a>] {
        &self.all
    }

    /// The `n` closest features
    pub fn top(&self, n: usize) -> &[DistanceAnnotatedFeature<'a>] {
        &self.all[..n.min(self.all.len())]
    }

    pub fn skipped(&self) -> &[SkippedFeature] {
        &self.skipped
    }
}

/// How the user intends to travel to the park
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Walking,
    Driving,
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TravelMode::Walking => f.write_str("walking"),
            TravelMode::Driving => f.write_str("driving"),
        }
    }
}

impl FromStr for TravelMode {
    type Err = ParkfinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "walking" | "walk" | "foot" => Ok(TravelMode::Walking),
            "driving" | "drive" | "car" => Ok(TravelMode::Driving),
            _ => Err(ParkfinderError::ConfigInvalid {
                key: "travel_mode".to_string(),
                reason: format!("Invalid travel mode: {}. Use walking or driving", s),
            }),
        }
    }
}

/// What an external directions provider returned. Every part is optional:
/// a provider may know the duration but not the path, or neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteEstimate {
    pub path: Option<Vec<GeoPoint>>,
    pub duration_minutes: Option<f64>,
    pub distance_meters: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PolygonGeometry;

    #[test]
    fn test_empty_ranking_has_no_result() {
        assert!(NearestResult::from_ranking(Vec::new(), Vec::new()).is_none());
    }

    #[test]
    fn test_best_is_first_and_top_is_clamped() {
        let a = PolygonFeature::new("a", "A", PolygonGeometry::default());
        let b = PolygonFeature::new("b", "B", PolygonGeometry::default());
        let centroid = GeoPoint::new(0.0, 0.0).unwrap();
        let result = NearestResult::from_ranking(
            vec![
                DistanceAnnotatedFeature { feature: &a, centroid, distance_meters: 1.0 },
                DistanceAnnotatedFeature { feature: &b, centroid, distance_meters: 2.0 },
            ],
            Vec::new(),
        )
        .unwrap();

        assert_eq!(result.best().feature.id.as_str(), "a");
        assert_eq!(result.top(1).len(), 1);
        assert_eq!(result.top(10).len(), 2);
    }

    #[test]
    fn test_travel_mode_parse() {
        assert_eq!("Walking".parse::<TravelMode>().unwrap(), TravelMode::Walking);
        assert_eq!("drive".parse::<TravelMode>().unwrap(), TravelMode::Driving);
        assert!("teleport".parse::<TravelMode>().is_err());
        assert_eq!(TravelMode::Driving.to_string(), "driving");
    }
}
