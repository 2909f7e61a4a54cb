//! Saved stations and the four transport kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::serde_helpers::lenient_f64_opt;

/// The closed set of transport kinds a station can belong to.
///
/// Serialized with the storage tags used by persisted data
/// (`train`, `mrt`, `bus`, `bike`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransportKind {
    #[serde(rename = "train")]
    Rail,
    #[serde(rename = "mrt")]
    Metro,
    #[serde(rename = "bus")]
    Bus,
    #[serde(rename = "bike")]
    Bikeshare,
}

impl TransportKind {
    /// All kinds in canonical order.
    pub const ALL: [TransportKind; 4] = [
        TransportKind::Rail,
        TransportKind::Metro,
        TransportKind::Bus,
        TransportKind::Bikeshare,
    ];

    /// Storage and wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Rail => "train",
            TransportKind::Metro => "mrt",
            TransportKind::Bus => "bus",
            TransportKind::Bikeshare => "bike",
        }
    }

    /// English display label.
    pub fn label(&self) -> &'static str {
        match self {
            TransportKind::Rail => "Rail",
            TransportKind::Metro => "Metro",
            TransportKind::Bus => "Bus",
            TransportKind::Bikeshare => "YouBike",
        }
    }

    /// Label used by station names saved from the original web front end.
    pub fn local_label(&self) -> &'static str {
        match self {
            TransportKind::Rail => "火車",
            TransportKind::Metro => "捷運",
            TransportKind::Bus => "公車",
            TransportKind::Bikeshare => "YouBike",
        }
    }

    /// Key under which this kind's collection is persisted.
    pub fn storage_key(&self) -> &'static str {
        match self {
            TransportKind::Rail => "user_stations_train",
            TransportKind::Metro => "user_stations_mrt",
            TransportKind::Bus => "user_stations_bus",
            TransportKind::Bikeshare => "user_stations_bike",
        }
    }

    /// Join kinds with a separator using their display labels.
    pub fn join_labels(kinds: &[TransportKind], sep: &str) -> String {
        kinds.iter().map(|k| k.label()).collect::<Vec<_>>().join(sep)
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "train" | "rail" | "火車" => Ok(TransportKind::Rail),
            "mrt" | "metro" | "捷運" => Ok(TransportKind::Metro),
            "bus" | "公車" => Ok(TransportKind::Bus),
            "bike" | "bikeshare" | "youbike" => Ok(TransportKind::Bikeshare),
            other => Err(format!("unknown transport kind: {}", other)),
        }
    }
}

/// A station saved by the user in one of the four collections.
///
/// Identity within a collection is the exact, case-sensitive `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f64_opt")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64_opt")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Station {
    /// A station known only by name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lat: None,
            lng: None,
            region: None,
        }
    }

    /// A station with known coordinates.
    pub fn at(name: impl Into<String>, point: GeoPoint) -> Self {
        Self {
            name: name.into(),
            lat: Some(point.lat),
            lng: Some(point.lng),
            region: None,
        }
    }

    /// Attach a region label.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Coordinates, when both halves are known.
    pub fn coords(&self) -> Option<GeoPoint> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        }
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.coords() {
            Some(p) => write!(f, "{}({},{})", self.name, p.lat, p.lng),
            None => f.write_str(&self.name),
        }
    }
}

/// The four per-kind station collections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationCollections {
    pub rail: Vec<Station>,
    pub metro: Vec<Station>,
    pub bus: Vec<Station>,
    pub bikeshare: Vec<Station>,
}

impl StationCollections {
    pub fn get(&self, kind: TransportKind) -> &[Station] {
        match kind {
            TransportKind::Rail => &self.rail,
            TransportKind::Metro => &self.metro,
            TransportKind::Bus => &self.bus,
            TransportKind::Bikeshare => &self.bikeshare,
        }
    }

    pub fn get_mut(&mut self, kind: TransportKind) -> &mut Vec<Station> {
        match kind {
            TransportKind::Rail => &mut self.rail,
            TransportKind::Metro => &mut self.metro,
            TransportKind::Bus => &mut self.bus,
            TransportKind::Bikeshare => &mut self.bikeshare,
        }
    }

    /// Position of a station by exact name.
    pub fn position(&self, kind: TransportKind, name: &str) -> Option<usize> {
        self.get(kind).iter().position(|s| s.name == name)
    }

    pub fn contains(&self, kind: TransportKind, name: &str) -> bool {
        self.position(kind, name).is_some()
    }

    /// Iterate over all kinds in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (TransportKind, &[Station])> {
        TransportKind::ALL.into_iter().map(move |k| (k, self.get(k)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, list)| list.is_empty())
    }
}
