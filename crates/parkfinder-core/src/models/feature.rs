use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::geometry::PolygonGeometry;
use crate::error::ParkfinderError;

/// Stable identifier of a feature in the source dataset.
///
/// Ordering is numeric when both identifiers are unsigned integers and
/// lexicographic otherwise; numeric identifiers sort before textual ones.
/// The scanner relies on this order to break distance ties.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureId(pub String);

impl FeatureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn sort_key(&self) -> (u8, u64, &str) {
        match self.0.parse::<u64>() {
            Ok(n) => (0, n, &self.0),
            Err(_) => (1, 0, &self.0),
        }
    }
}

impl Ord for FeatureId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for FeatureId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Amenity flags recognised in park datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmenityKey {
    Playground,
    Washrooms,
    DogOffLeash,
    SportsField,
    PicnicArea,
    DrinkingFountain,
    TennisCourt,
    SprayPark,
    Trails,
    Parking,
}

impl AmenityKey {
    pub const ALL: [AmenityKey; 10] = [
        AmenityKey::Playground,
        AmenityKey::Washrooms,
        AmenityKey::DogOffLeash,
        AmenityKey::SportsField,
        AmenityKey::PicnicArea,
        AmenityKey::DrinkingFountain,
        AmenityKey::TennisCourt,
        AmenityKey::SprayPark,
        AmenityKey::Trails,
        AmenityKey::Parking,
    ];

    /// Canonical key as used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            AmenityKey::Playground => "playground",
            AmenityKey::Washrooms => "washrooms",
            AmenityKey::DogOffLeash => "dog_off_leash",
            AmenityKey::SportsField => "sports_field",
            AmenityKey::PicnicArea => "picnic_area",
            AmenityKey::DrinkingFountain => "drinking_fountain",
            AmenityKey::TennisCourt => "tennis_court",
            AmenityKey::SprayPark => "spray_park",
            AmenityKey::Trails => "trails",
            AmenityKey::Parking => "parking",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            AmenityKey::Playground => "Playground",
            AmenityKey::Washrooms => "Washrooms",
            AmenityKey::DogOffLeash => "Dog off-leash area",
            AmenityKey::SportsField => "Sports field",
            AmenityKey::PicnicArea => "Picnic area",
            AmenityKey::DrinkingFountain => "Drinking fountain",
            AmenityKey::TennisCourt => "Tennis court",
            AmenityKey::SprayPark => "Spray park",
            AmenityKey::Trails => "Trails",
            AmenityKey::Parking => "Parking",
        }
    }
}

impl FromStr for AmenityKey {
    type Err = ParkfinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AmenityKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParkfinderError::ConfigInvalid {
                key: "fields.amenities".to_string(),
                reason: format!(
                    "Unknown amenity '{}'. Expected one of: {}",
                    s,
                    AmenityKey::ALL.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(", ")
                ),
            })
    }
}

/// Typed attributes of a feature.
///
/// Amenity flags and measurements are interpreted at load time; every raw
/// field that has no canonical meaning is kept in `other` as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureAttributes {
    pub amenities: BTreeMap<AmenityKey, bool>,
    pub area_sq_m: Option<f64>,
    pub perimeter_m: Option<f64>,
    pub other: BTreeMap<String, serde_json::Value>,
}

impl FeatureAttributes {
    /// `true` only when the dataset explicitly flagged the amenity
    pub fn has(&self, amenity: AmenityKey) -> bool {
        self.amenities.get(&amenity).copied().unwrap_or(false)
    }

    pub fn present_amenities(&self) -> impl Iterator<Item = AmenityKey> + '_ {
        self.amenities.iter().filter(|(_, &present)| present).map(|(key, _)| *key)
    }
}

/// One park: identifier, display name, typed attributes, and polygon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonFeature {
    pub id: FeatureId,
    pub name: String,
    pub attributes: FeatureAttributes,
    pub geometry: PolygonGeometry,
}

impl PolygonFeature {
    pub fn new(id: impl Into<FeatureId>, name: impl Into<String>, geometry: PolygonGeometry) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            attributes: FeatureAttributes::default(),
            geometry,
        }
    }

    pub fn with_attributes(mut self, attributes: FeatureAttributes) -> Self {
        self.attributes = attributes;
        self
    }
}

impl From<String> for FeatureId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
