//! Plain-text output for the terminal.

use std::fmt::Write as _;

use commute_core::{ItineraryLeg, Settings, Station, TransportKind};
use planner::PlanOutcome;
use transit_feeds::bikeshare::RegionIndex;
use transit_feeds::ScoredStation;

pub fn plan(outcome: &PlanOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Mode: {}", outcome.mode);
    if let Some(notice) = outcome.notice {
        let _ = writeln!(out, "! {}", notice);
    }

    for itinerary in &outcome.result.itineraries {
        let _ = writeln!(out, "\n== {} ({})", itinerary.title, itinerary.time);
        if !itinerary.details.is_empty() {
            let _ = writeln!(out, "{}", itinerary.details);
        }
    }

    for (kind, legs) in &outcome.result.per_kind {
        if legs.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n[{}]", kind.label());
        for leg in legs {
            let _ = writeln!(out, "  {}", leg_line(*kind, leg, outcome));
        }
    }
    out
}

fn leg_line(kind: TransportKind, leg: &ItineraryLeg, outcome: &PlanOutcome) -> String {
    let mut line = match leg {
        ItineraryLeg::Stop(stop) => stop.name.clone(),
        ItineraryLeg::Flow(flow) => match &flow.line {
            Some(service) => format!("{} → {} ({})", flow.from, flow.to, service),
            None => format!("{} → {}", flow.from, flow.to),
        },
    };

    if kind == TransportKind::Bikeshare {
        for name in leg.station_names() {
            if let Some(live) = outcome.bike_availability.get(name) {
                let _ = write!(
                    line,
                    "  [{}: rent {} / return {}]",
                    name, live.available_to_rent, live.available_to_return
                );
            }
        }
    }
    line
}

pub fn stations(kind: TransportKind, stations: &[Station]) -> String {
    let mut out = format!("{} ({})\n", kind.label(), stations.len());
    for (i, station) in stations.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i, station);
    }
    out
}

pub fn bike_hits(hits: &[ScoredStation], total: usize) -> String {
    if hits.is_empty() {
        return "No matches.\n".to_string();
    }

    let mut out = String::new();
    for (i, hit) in hits.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>2}. {} - {} {} (rent {} / return {})",
            i + 1,
            hit.station.name,
            hit.station.region,
            hit.station.district,
            hit.station.available_to_rent,
            hit.station.available_to_return
        );
    }
    if total > hits.len() {
        let _ = writeln!(out, "({} more; narrow the query)", total - hits.len());
    }
    out
}

pub fn regions(regions: &RegionIndex) -> String {
    let mut out = String::new();
    for (city, districts) in regions {
        let names: Vec<&str> = districts.keys().map(String::as_str).collect();
        let _ = writeln!(out, "{}: {}", city, names.join(", "));
    }
    out
}

pub fn settings(settings: &Settings) -> String {
    let mut out = String::new();
    let key = if settings.has_api_key() { "set" } else { "missing" };
    let _ = writeln!(out, "API key: {}", key);
    let _ = writeln!(
        out,
        "Work: {} → {} [{}]",
        settings.work_time,
        settings.work_last_mile.name,
        TransportKind::join_labels(&settings.work_trans, ", ")
    );
    let _ = writeln!(
        out,
        "Home: {} → {} [{}]",
        settings.home_time,
        settings.home_last_mile.name,
        TransportKind::join_labels(&settings.home_trans, ", ")
    );
    let _ = writeln!(out, "Holiday old home: {}", settings.holiday.old_home_last_mile.name);
    let _ = writeln!(out, "Holiday home: {}", settings.holiday.home_last_mile.name);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use commute_core::{GeoPoint, ReconciledResult};
    use std::collections::BTreeMap;
    use transit_feeds::Availability;

    #[test]
    fn test_plan_output_includes_live_counts() {
        let mut result = ReconciledResult::default();
        result.per_kind.insert(
            TransportKind::Bikeshare,
            vec![ItineraryLeg::flow("A站", "B站")],
        );
        let mut live = BTreeMap::new();
        live.insert(
            "A站".to_string(),
            Availability {
                available_to_rent: 2,
                available_to_return: 5,
                updated_at: String::new(),
            },
        );
        let outcome = PlanOutcome {
            mode: commute_core::CommuteMode::LateNight,
            prompt_fingerprint: String::new(),
            result,
            bike_availability: live,
            notice: Some(planner::LATE_NIGHT_NOTICE),
        };

        let text = plan(&outcome);
        assert!(text.contains("Mode: late_night"));
        assert!(text.contains("A站 → B站  [A站: rent 2 / return 5]"));
        assert!(!text.contains("[Rail]"));
    }

    #[test]
    fn test_station_listing_is_indexed() {
        let text = stations(
            TransportKind::Rail,
            &[Station::named("中壢"), Station::at("台北", GeoPoint::new(25.0, 121.5))],
        );
        assert_eq!(text, "Rail (2)\n  0. 中壢\n  1. 台北(25,121.5)\n");
    }
}
