//! Model output reconciliation.
//!
//! The model is asked for a fixed JSON shape but routinely wraps it in prose
//! or code fences, nests the kind arrays under `stations`, and mixes bare
//! names with from/to objects. Everything is normalized here, once, into a
//! [`ReconciledResult`].

use commute_core::serde_helpers::{number_from_value, text_from_value};
use commute_core::{
    CommuteError, FlowLeg, GeoPoint, Itinerary, ItineraryLeg, ReconciledResult, StopRef,
    TransportKind,
};
use serde_json::{Map, Value};
use tracing::debug;

/// The span from the first `{` to the last `}`, if any.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

fn parse_object(raw: &str) -> Result<Map<String, Value>, CommuteError> {
    let body = extract_json_object(raw)
        .ok_or_else(|| CommuteError::MalformedResponse("no JSON object in model output".to_string()))?;

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(CommuteError::MalformedResponse(format!(
            "expected a JSON object, got {}",
            other
        ))),
        Err(e) => Err(CommuteError::MalformedResponse(format!("invalid JSON: {}", e))),
    }
}

/// Normalize raw model output into per-kind legs and itineraries.
pub fn reconcile(raw: &str) -> Result<ReconciledResult, CommuteError> {
    let root = parse_object(raw)?;

    let nested = root
        .get("stations")
        .and_then(Value::as_object)
        .filter(|stations| has_any_legs(stations));
    let source = nested.unwrap_or(&root);

    let mut result = ReconciledResult::default();
    for kind in TransportKind::ALL {
        let legs = source
            .get(kind.as_str())
            .and_then(Value::as_array)
            .map(|entries| entries.iter().filter_map(normalize_leg).collect())
            .unwrap_or_default();
        result.per_kind.insert(kind, legs);
    }

    result.itineraries = root
        .get("itineraries")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(normalize_itinerary).collect())
        .unwrap_or_default();

    debug!(
        "Reconciled model output (nested: {}): {} itineraries",
        nested.is_some(),
        result.itineraries.len()
    );
    Ok(result)
}

fn has_any_legs(map: &Map<String, Value>) -> bool {
    TransportKind::ALL.iter().any(|kind| {
        map.get(kind.as_str())
            .and_then(Value::as_array)
            .is_some_and(|entries| !entries.is_empty())
    })
}

fn normalize_leg(entry: &Value) -> Option<ItineraryLeg> {
    match entry {
        Value::String(name) => {
            let name = name.trim();
            (!name.is_empty()).then(|| ItineraryLeg::stop(name))
        }
        Value::Number(n) => Some(ItineraryLeg::stop(n.to_string())),
        Value::Object(map) => Some(normalize_object_leg(map)),
        _ => None,
    }
}

fn normalize_object_leg(map: &Map<String, Value>) -> ItineraryLeg {
    let from = field_text(map, "from");
    let to = field_text(map, "to");

    if !from.is_empty() && !to.is_empty() {
        let line = field_text(map, "line");
        return ItineraryLeg::Flow(FlowLeg {
            from,
            to,
            line: (!line.is_empty()).then_some(line),
            coords_from: flat_coords(map, "lat_from", "lng_from")
                .or_else(|| object_coords(map.get("coordinatesFrom"))),
            coords_to: flat_coords(map, "lat_to", "lng_to")
                .or_else(|| object_coords(map.get("coordinatesTo"))),
        });
    }

    // A half-filled flow is still a usable stop on whichever side is named.
    let coords = flat_coords(map, "lat", "lng").or_else(|| flat_coords(map, "lat", "lon"));
    let named = ["name", "station", "stop", "title"]
        .iter()
        .map(|key| field_text(map, key))
        .find(|name| !name.is_empty())
        .map(|name| (name, coords));
    let (name, coords) = named
        .or_else(|| {
            (!from.is_empty()).then(|| {
                let side = flat_coords(map, "lat_from", "lng_from")
                    .or_else(|| object_coords(map.get("coordinatesFrom")));
                (from, coords.or(side))
            })
        })
        .or_else(|| {
            (!to.is_empty()).then(|| {
                let side = flat_coords(map, "lat_to", "lng_to")
                    .or_else(|| object_coords(map.get("coordinatesTo")));
                (to, coords.or(side))
            })
        })
        .unwrap_or_else(|| (Value::Object(map.clone()).to_string(), coords));

    ItineraryLeg::Stop(StopRef { name, coords })
}

fn normalize_itinerary(entry: &Value) -> Option<Itinerary> {
    let map = entry.as_object()?;
    Some(Itinerary {
        title: field_text(map, "title"),
        details: field_text(map, "details"),
        time: field_text(map, "time"),
    })
}

fn field_text(map: &Map<String, Value>, key: &str) -> String {
    map.get(key)
        .and_then(text_from_value)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn flat_coords(map: &Map<String, Value>, lat: &str, lng: &str) -> Option<GeoPoint> {
    let lat = map.get(lat).and_then(number_from_value)?;
    let lng = map.get(lng).and_then(number_from_value)?;
    Some(GeoPoint::new(lat, lng))
}

fn object_coords(value: Option<&Value>) -> Option<GeoPoint> {
    let map = value?.as_object()?;
    flat_coords(map, "lat", "lng").or_else(|| flat_coords(map, "lat", "lon"))
}

/// A place confirmed by a validation prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPlace {
    pub name: String,
    pub coords: GeoPoint,
}

/// Parse a `{"valid": ..}` validation answer.
///
/// `valid: false` becomes a `ValidationFailure` carrying the model's reason.
pub fn parse_validation(raw: &str) -> Result<ValidatedPlace, CommuteError> {
    let map = parse_object(raw)?;

    if !map.get("valid").and_then(Value::as_bool).unwrap_or(false) {
        let reason = field_text(&map, "error");
        return Err(CommuteError::ValidationFailure(if reason.is_empty() {
            "unknown reason".to_string()
        } else {
            reason
        }));
    }

    let name = field_text(&map, "name");
    if name.is_empty() {
        return Err(CommuteError::MalformedResponse(
            "validation answer has no name".to_string(),
        ));
    }
    let coords = flat_coords(&map, "lat", "lng").ok_or_else(|| {
        CommuteError::MalformedResponse(format!("validation answer for {} has no coordinates", name))
    })?;

    Ok(ValidatedPlace { name, coords })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_flow_legs() {
        let result = reconcile(r#"{"train":[{"from":"A","to":"B"}], "stations":{}}"#).unwrap();
        assert_eq!(result.legs(TransportKind::Rail), &[ItineraryLeg::flow("A", "B")]);
        assert!(!result.has_legs(TransportKind::Bus));
        assert_eq!(result.per_kind.len(), 4);
    }

    #[test]
    fn test_nested_form_preferred_when_non_empty() {
        let result =
            reconcile(r#"{"stations":{"train":[{"from":"C","to":"D"}]},"train":[]}"#).unwrap();
        assert_eq!(result.legs(TransportKind::Rail), &[ItineraryLeg::flow("C", "D")]);
    }

    #[test]
    fn test_empty_nested_form_ignored() {
        let result = reconcile(
            r#"{"stations":{"train":[],"bike":[]},"bus":["中壢公車站"]}"#,
        )
        .unwrap();
        assert_eq!(result.legs(TransportKind::Bus), &[ItineraryLeg::stop("中壢公車站")]);
    }

    #[test]
    fn test_prose_and_fences_are_stripped() {
        let raw = "Here you go:\n```json\n{\"mrt\": [\"市政府\"], \"itineraries\": []}\n```\nEnjoy!";
        let result = reconcile(raw).unwrap();
        assert_eq!(result.legs(TransportKind::Metro), &[ItineraryLeg::stop("市政府")]);
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(matches!(
            reconcile("no json here"),
            Err(CommuteError::MalformedResponse(_))
        ));
        assert!(matches!(
            reconcile("{\"train\": [oops]}"),
            Err(CommuteError::MalformedResponse(_))
        ));
        assert!(matches!(reconcile("} backwards {"), Err(CommuteError::MalformedResponse(_))));
    }

    #[test]
    fn test_flow_leg_fields() {
        let result = reconcile(
            r#"{"bus":[{"from":"中壢公車站","to":"中山東路口","line":"112南",
                "lat_from":"24.95","lng_from":121.22,"lat_to":24.96,"lng_to":121.23}]}"#,
        )
        .unwrap();
        let ItineraryLeg::Flow(flow) = &result.legs(TransportKind::Bus)[0] else {
            panic!("expected a flow leg");
        };
        assert_eq!(flow.line.as_deref(), Some("112南"));
        assert_eq!(flow.coords_from, Some(GeoPoint::new(24.95, 121.22)));
        assert_eq!(flow.coords_to, Some(GeoPoint::new(24.96, 121.23)));
    }

    #[test]
    fn test_flow_leg_with_coordinate_objects() {
        let result = reconcile(
            r#"{"train":[{"from":"A","to":"B","coordinatesFrom":{"lat":1,"lng":2},"coordinatesTo":{"lat":3,"lon":4}}]}"#,
        )
        .unwrap();
        let ItineraryLeg::Flow(flow) = &result.legs(TransportKind::Rail)[0] else {
            panic!("expected a flow leg");
        };
        assert_eq!(flow.line, None);
        assert_eq!(flow.coords_from, Some(GeoPoint::new(1.0, 2.0)));
        assert_eq!(flow.coords_to, Some(GeoPoint::new(3.0, 4.0)));
    }

    #[test]
    fn test_mixed_leg_shapes() {
        let result = reconcile(
            r#"{"bike":["站A", {"name":"站B","lat":25.0,"lng":121.0}, {"from":"X"}, 42, null, true, [1],
                {"to":"Y","lat_to":24.9,"lng_to":121.2}, {"note":"ride"}]}"#,
        )
        .unwrap();
        let legs = result.legs(TransportKind::Bikeshare);
        assert_eq!(legs.len(), 6);
        assert_eq!(legs[0], ItineraryLeg::stop("站A"));
        assert_eq!(
            legs[1],
            ItineraryLeg::Stop(StopRef {
                name: "站B".to_string(),
                coords: Some(GeoPoint::new(25.0, 121.0)),
            })
        );
        assert_eq!(legs[2], ItineraryLeg::stop("X"));
        assert_eq!(legs[3], ItineraryLeg::stop("42"));
        assert_eq!(
            legs[4],
            ItineraryLeg::Stop(StopRef {
                name: "Y".to_string(),
                coords: Some(GeoPoint::new(24.9, 121.2)),
            })
        );
        assert_eq!(legs[5], ItineraryLeg::stop(r#"{"note":"ride"}"#));
    }

    #[test]
    fn test_itineraries() {
        let result = reconcile(
            r#"{"itineraries":[{"title":"方案A","details":"...","time":30}, {"title":"B"}, "junk"]}"#,
        )
        .unwrap();
        assert_eq!(result.itineraries.len(), 2);
        assert_eq!(result.itineraries[0].time, "30");
        assert_eq!(result.itineraries[1].details, "");
    }

    #[test]
    fn test_parse_validation() {
        let place =
            parse_validation(r#"```json {"valid": true, "name": "市府站", "lat": 25.04, "lng": 121.56} ```"#)
                .unwrap();
        assert_eq!(place.name, "市府站");
        assert_eq!(place.coords, GeoPoint::new(25.04, 121.56));

        match parse_validation(r#"{"valid": false, "error": "找不到此站點"}"#) {
            Err(CommuteError::ValidationFailure(reason)) => assert_eq!(reason, "找不到此站點"),
            other => panic!("unexpected {:?}", other),
        }

        assert!(matches!(
            parse_validation(r#"{"valid": true, "name": "X"}"#),
            Err(CommuteError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_validation("sorry"),
            Err(CommuteError::MalformedResponse(_))
        ));
    }
}
