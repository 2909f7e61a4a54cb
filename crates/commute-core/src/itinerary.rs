//! Canonical itinerary result handed to presentation.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::geo::GeoPoint;
use crate::station::TransportKind;

/// A bare station reference (the older, list-of-names result shape).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopRef {
    pub name: String,
    pub coords: Option<GeoPoint>,
}

/// One board/alight segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowLeg {
    pub from: String,
    pub to: String,
    pub line: Option<String>,
    pub coords_from: Option<GeoPoint>,
    pub coords_to: Option<GeoPoint>,
}

impl FlowLeg {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            line: None,
            coords_from: None,
            coords_to: None,
        }
    }

    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.line = Some(line.into());
        self
    }
}

/// A per-kind result entry in either of the two shapes the model produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ItineraryLeg {
    Stop(StopRef),
    Flow(FlowLeg),
}

impl ItineraryLeg {
    /// A stop reference without coordinates.
    pub fn stop(name: impl Into<String>) -> Self {
        ItineraryLeg::Stop(StopRef {
            name: name.into(),
            coords: None,
        })
    }

    /// A from/to segment without line or coordinates.
    pub fn flow(from: impl Into<String>, to: impl Into<String>) -> Self {
        ItineraryLeg::Flow(FlowLeg::new(from, to))
    }

    /// Station names this leg touches, boarding point first.
    pub fn station_names(&self) -> Vec<&str> {
        match self {
            ItineraryLeg::Stop(stop) => vec![stop.name.as_str()],
            ItineraryLeg::Flow(flow) => vec![flow.from.as_str(), flow.to.as_str()],
        }
    }
}

/// A suggested plan as summarised by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Itinerary {
    pub title: String,
    pub details: String,
    pub time: String,
}

/// The reconciled model output: legs for every kind plus the plan summaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledResult {
    pub per_kind: BTreeMap<TransportKind, Vec<ItineraryLeg>>,
    pub itineraries: Vec<Itinerary>,
}

impl Default for ReconciledResult {
    fn default() -> Self {
        Self {
            per_kind: TransportKind::ALL
                .into_iter()
                .map(|kind| (kind, Vec::new()))
                .collect(),
            itineraries: Vec::new(),
        }
    }
}

impl ReconciledResult {
    /// Legs for one kind; empty when the model suggested none.
    pub fn legs(&self, kind: TransportKind) -> &[ItineraryLeg] {
        self.per_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_legs(&self, kind: TransportKind) -> bool {
        !self.legs(kind).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_every_kind() {
        let result = ReconciledResult::default();
        assert_eq!(result.per_kind.len(), 4);
        assert!(TransportKind::ALL.iter().all(|k| !result.has_legs(*k)));
    }

    #[test]
    fn test_station_names() {
        assert_eq!(ItineraryLeg::flow("A", "B").station_names(), vec!["A", "B"]);
        assert_eq!(ItineraryLeg::stop("C").station_names(), vec!["C"]);
    }

    #[test]
    fn test_leg_serialization_is_tagged() {
        let json = serde_json::to_value(ItineraryLeg::flow("A", "B")).unwrap();
        assert_eq!(json["shape"], "flow");
        assert_eq!(json["from"], "A");
    }
}
