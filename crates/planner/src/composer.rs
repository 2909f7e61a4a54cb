//! Prompt composition.
//!
//! Every function here is pure: the same input always yields the same text.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::NaiveDateTime;
use commute_core::{
    CommuteMode, CustomTrip, GeoPoint, LastMileTarget, Settings, Station, StationCollections,
    TransportKind,
};
use transit_feeds::Availability;

/// Distance under which the old-home prompt suggests starting from a known point.
pub const NEARBY_START_KM: f64 = 2.0;

/// Closing block appended to every plan prompt.
pub const RESPONSE_SCHEMA: &str = r#"Plan the best route for the current time and my position.
For each of train/mrt/bus/bike, do not just list nearby stations: list every leg actually used by the suggested plan.
Leg format: {"from": "boarding station", "to": "alighting station", "line": "route or service (e.g. 112南, local train)", "lat_from": boarding latitude, "lng_from": boarding longitude, "lat_to": alighting latitude, "lng_to": alighting longitude}
Reply with JSON in exactly this shape:
{
  "train": [{"from": "松山", "to": "中壢", "line": "自強號", "lat_from": 25.049, "lng_from": 121.578, "lat_to": 24.953, "lng_to": 121.225}],
  "mrt": [],
  "bus": [{"from": "中壢公車站", "to": "中山東路口", "line": "112南、169"}],
  "bike": [],
  "itineraries": [{"title": "Plan A", "details": "...", "time": "30 min"}]
}"#;

/// Everything a plan prompt is built from.
#[derive(Debug, Clone)]
pub struct PromptInput<'a> {
    pub mode: CommuteMode,
    /// Local wall-clock time.
    pub now: NaiveDateTime,
    pub settings: &'a Settings,
    pub collections: &'a StationCollections,
    pub position: Option<GeoPoint>,
    /// Only read in `Custom` mode.
    pub custom: Option<&'a CustomTrip>,
    /// Live counts for saved bikeshare stations, by name.
    pub bike_live: &'a BTreeMap<String, Availability>,
}

/// Build the plan prompt for the given input.
pub fn compose(input: &PromptInput<'_>) -> String {
    let mut prompt = String::new();

    let _ = write!(prompt, "The current time is {}.", input.now.format("%H:%M"));
    match input.position {
        Some(position) => {
            let _ = write!(prompt, " My position is {}.", position);
        }
        None => prompt.push_str(" My position is unavailable; assume I start from my saved stations."),
    }

    match input.mode {
        CommuteMode::LateNight => late_night_section(&mut prompt, input),
        CommuteMode::OldHome => old_home_section(&mut prompt, input),
        CommuteMode::Holiday => holiday_section(&mut prompt, input),
        CommuteMode::Work => direction_section(&mut prompt, input, Direction::Work),
        CommuteMode::Home => direction_section(&mut prompt, input, Direction::Home),
        CommuteMode::Custom => custom_section(&mut prompt, input),
    }

    prompt.push_str("\n\n");
    prompt.push_str(RESPONSE_SCHEMA);
    prompt
}

fn late_night_section(prompt: &mut String, input: &PromptInput<'_>) {
    prompt.push_str("\nIt is late night. The only public transport still running is YouBike.");
    prompt.push_str("\nOnly suggest YouBike routes. Ignore rail, metro and bus.");

    let allowed = input.mode.allowed_kinds(input.settings);
    for kind in TransportKind::ALL {
        if !allowed.contains(&kind) && !input.collections.get(kind).is_empty() {
            let _ = write!(prompt, "\n({} stations ignored: not running)", kind.label());
        }
    }

    let bikes = input.collections.get(TransportKind::Bikeshare);
    if !bikes.is_empty() {
        let _ = write!(
            prompt,
            "\n{}: {}",
            TransportKind::Bikeshare.label(),
            format_stations(TransportKind::Bikeshare, bikes, input.bike_live)
        );
    }

    prompt.push_str("\nSuggest nearby YouBike stations and how to ride.");
}

fn old_home_section(prompt: &mut String, input: &PromptInput<'_>) {
    let settings = input.settings;
    let target = &settings.holiday.old_home_last_mile;

    prompt.push_str(" Today is a workday and tomorrow is a holiday. I am heading to my old home.");
    if target.is_named() {
        let _ = write!(prompt, "\nOld home destination: {}", describe_target(target));
    }
    let _ = write!(
        prompt,
        "\nEnabled transport: {}",
        join_kinds(&input.mode.allowed_kinds(settings), ", ")
    );

    if let Some((name, distance)) = nearby_start(input.position, settings) {
        let _ = write!(
            prompt,
            "\nI am {:.1} km from {}. Start the itinerary from {} instead of my raw position.",
            distance, name, name
        );
    }

    saved_stations_section(prompt, input);
}

fn holiday_section(prompt: &mut String, input: &PromptInput<'_>) {
    let holiday = &input.settings.holiday;

    prompt.push_str(" Today is a holiday.");
    prompt.push_str("\nMy holiday destinations:");
    if holiday.old_home_last_mile.is_named() {
        let _ = write!(prompt, "\n- Destination one (old home): {}", holiday.old_home_last_mile.name);
    }
    if holiday.home_last_mile.is_named() {
        let _ = write!(prompt, "\n- Destination two (home): {}", holiday.home_last_mile.name);
    }

    saved_stations_section(prompt, input);
}

#[derive(Clone, Copy)]
enum Direction {
    Work,
    Home,
}

fn direction_section(prompt: &mut String, input: &PromptInput<'_>, direction: Direction) {
    let settings = input.settings;
    let (intro, label, time, target) = match direction {
        Direction::Work => (
            " Today is a workday. I am heading to work.",
            "Work",
            &settings.work_time,
            &settings.work_last_mile,
        ),
        Direction::Home => (
            " Today is a workday. I am heading home.",
            "Home",
            &settings.home_time,
            &settings.home_last_mile,
        ),
    };

    prompt.push_str(intro);
    let _ = write!(
        prompt,
        "\n{} settings: time {}, destination {} ({})",
        label,
        time,
        target.name,
        join_kinds(&target.kinds, "+")
    );
    let kinds = input.mode.allowed_kinds(settings);
    let _ = write!(prompt, "\nEnabled transport: {}", join_kinds(&kinds, ", "));

    saved_stations_section(prompt, input);
}

fn custom_section(prompt: &mut String, input: &PromptInput<'_>) {
    match input.custom {
        Some(trip) => {
            let _ = write!(prompt, "\nI want to go to {}.", trip.destination.trim());
            if let Some(coords) = trip.coords {
                let _ = write!(prompt, "\nDestination coordinates: {}", coords);
            }
            if trip.kinds.is_empty() {
                prompt.push_str("\nAny transport is fine.");
            } else {
                let _ = write!(prompt, "\nPreferred transport: {}", join_kinds(&trip.kinds, ", "));
            }
        }
        None => prompt.push_str("\nI have not chosen a destination yet; suggest routes from my position."),
    }

    saved_stations_section(prompt, input);
}

fn saved_stations_section(prompt: &mut String, input: &PromptInput<'_>) {
    prompt.push_str("\n\nSaved stations:");
    for (kind, stations) in input.collections.iter() {
        if !stations.is_empty() {
            let _ = write!(
                prompt,
                "\n{}: {}",
                kind.label(),
                format_stations(kind, stations, input.bike_live)
            );
        }
    }
}

fn format_stations(
    kind: TransportKind,
    stations: &[Station],
    bike_live: &BTreeMap<String, Availability>,
) -> String {
    stations
        .iter()
        .map(|station| match (kind, bike_live.get(&station.name)) {
            (TransportKind::Bikeshare, Some(live)) => format!(
                "{}[rent {} / return {}]",
                station, live.available_to_rent, live.available_to_return
            ),
            _ => station.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_target(target: &LastMileTarget) -> String {
    if target.kinds.is_empty() {
        target.name.clone()
    } else {
        format!("{} ({})", target.name, join_kinds(&target.kinds, "+"))
    }
}

fn join_kinds(kinds: &[TransportKind], sep: &str) -> String {
    kinds.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(sep)
}

/// The nearer of the work/home destinations when within [`NEARBY_START_KM`].
fn nearby_start(position: Option<GeoPoint>, settings: &Settings) -> Option<(String, f64)> {
    let position = position?;
    [&settings.work_last_mile, &settings.home_last_mile]
        .into_iter()
        .filter_map(|target| {
            let coords = target.coords?;
            Some((target.name.clone(), position.distance_km(&coords)))
        })
        .filter(|(_, distance)| *distance <= NEARBY_START_KM)
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Short human-readable summary of what a plan in this mode would ask for.
pub fn preview(mode: CommuteMode, settings: &Settings) -> String {
    let mut text = String::new();
    let kinds = mode.allowed_kinds(settings);

    match mode {
        CommuteMode::LateNight => {
            text.push_str("Late night (00:00-05:00).\n");
            text.push_str("Locked to YouBike only.");
        }
        CommuteMode::Work => {
            text.push_str("Close to work time.\n");
            push_direction_preview(&mut text, &kinds, &settings.work_last_mile);
        }
        CommuteMode::OldHome => {
            text.push_str("Eve of a holiday: heading to the old home.\n");
            push_direction_preview(&mut text, &kinds, &settings.holiday.old_home_last_mile);
        }
        CommuteMode::Holiday => {
            text.push_str("Holiday.\n");
            push_direction_preview(&mut text, &kinds, &settings.holiday.home_last_mile);
        }
        CommuteMode::Home => {
            text.push_str("After work / other time.\n");
            push_direction_preview(&mut text, &kinds, &settings.home_last_mile);
        }
        CommuteMode::Custom => {
            text.push_str("Custom destination.\n");
            let _ = write!(text, "Enabled transport: {}", join_kinds(&kinds, ", "));
        }
    }

    text
}

fn push_direction_preview(text: &mut String, kinds: &[TransportKind], target: &LastMileTarget) {
    let _ = write!(text, "Enabled transport: {}", join_kinds(kinds, ", "));
    if target.is_named() {
        let _ = write!(
            text,
            "\nDestination: {} ({})",
            target.name,
            join_kinds(&target.kinds, "/")
        );
    }
}

/// Prompt asking the model to confirm a bikeshare station the feed did not find.
pub fn bikeshare_validation_prompt(query: &str) -> String {
    validation_prompt(
        &format!("Find the exact coordinates of the Taiwan YouBike station \"{}\".", query.trim()),
        "official station name",
    )
}

/// Prompt asking the model to locate a bus stop.
pub fn bus_validation_prompt(query: &str) -> String {
    validation_prompt(
        &format!("Find the exact location of the Taiwan bus stop \"{}\".", query.trim()),
        "full stop name",
    )
}

/// Prompt asking the model to geocode a free-text destination.
pub fn destination_validation_prompt(query: &str) -> String {
    validation_prompt(
        &format!("Find the exact location of the destination \"{}\" in Taiwan.", query.trim()),
        "full place name",
    )
}

fn validation_prompt(task: &str, name_hint: &str) -> String {
    format!(
        "{}\nConfirm that it really exists.\nReply with JSON: {{\"valid\": true, \"name\": \"{}\", \"lat\": 25.123, \"lng\": 121.123}}\nIf it cannot be found or you are unsure, reply {{\"valid\": false, \"error\": \"not found\"}}",
        task, name_hint
    )
}
