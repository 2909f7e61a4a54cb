//! Commute modes and the custom-trip request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::settings::Settings;
use crate::station::TransportKind;

/// The situational context of a planning request.
///
/// Recomputed on every query and never persisted. `Custom` is only reached
/// through an explicit user override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommuteMode {
    LateNight,
    Work,
    Home,
    Holiday,
    OldHome,
    Custom,
}

impl CommuteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommuteMode::LateNight => "late_night",
            CommuteMode::Work => "work",
            CommuteMode::Home => "home",
            CommuteMode::Holiday => "holiday",
            CommuteMode::OldHome => "old_home",
            CommuteMode::Custom => "custom",
        }
    }

    /// Transport kinds that may be suggested in this mode.
    pub fn allowed_kinds(&self, settings: &Settings) -> Vec<TransportKind> {
        match self {
            CommuteMode::LateNight => vec![TransportKind::Bikeshare],
            CommuteMode::Work => settings.work_trans.clone(),
            CommuteMode::Home => settings.home_trans.clone(),
            CommuteMode::Holiday => settings.holiday.home_trans.clone(),
            CommuteMode::OldHome => settings.holiday.old_home_trans.clone(),
            CommuteMode::Custom => TransportKind::ALL.to_vec(),
        }
    }
}

impl fmt::Display for CommuteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommuteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "late_night" => Ok(CommuteMode::LateNight),
            "work" => Ok(CommuteMode::Work),
            "home" => Ok(CommuteMode::Home),
            "holiday" => Ok(CommuteMode::Holiday),
            "old_home" => Ok(CommuteMode::OldHome),
            "custom" => Ok(CommuteMode::Custom),
            other => Err(format!("unknown commute mode: {}", other)),
        }
    }
}

/// A free-text "where to?" request.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomTrip {
    pub destination: String,
    /// Resolved coordinates of the destination, when known.
    pub coords: Option<GeoPoint>,
    /// Preferred kinds; empty means no preference.
    pub kinds: Vec<TransportKind>,
}

impl CustomTrip {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            coords: None,
            kinds: Vec::new(),
        }
    }

    pub fn with_coords(mut self, coords: GeoPoint) -> Self {
        self.coords = Some(coords);
        self
    }

    pub fn with_kinds(mut self, kinds: Vec<TransportKind>) -> Self {
        self.kinds = kinds;
        self
    }
}
