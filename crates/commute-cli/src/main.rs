use std::env;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use commute_core::{CommuteMode, CustomTrip, Destination, GeoPoint, Station, TransportKind};
use gemini_brain::{GeminiClient, GeminiConfig};
use planner::{
    BikeshareLookup, Collaborators, CommuteError, CommutePlanner, FixedPosition, NoPosition,
    PlanRequest, PlannerConfig, PositionProvider,
};
use station_store::{Database, StationRepository};
use tracing::{info, warn};
use transit_feeds::{BikeshareCache, CalendarOracle, FeedsConfig, HttpFeeds};

mod render;

/// Default store location when neither flag nor environment names one.
const DEFAULT_DB_URL: &str = "sqlite://commute.db";

#[derive(Debug, Parser)]
#[command(name = "commute")]
#[command(about = "Plan the next commute with saved stations and live bikeshare data")]
struct Cli {
    /// SQLite path or URL. Falls back to COMMUTE_DB_PATH env.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Current position as "lat,lng". Falls back to COMMUTE_POSITION env.
    #[arg(long, global = true)]
    position: Option<GeoPoint>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ask the model for an itinerary
    Plan {
        /// Force a mode instead of resolving it from the clock
        #[arg(long)]
        mode: Option<CommuteMode>,

        /// Plan to a free-text destination instead
        #[arg(long)]
        to: Option<String>,

        /// Preferred kinds for --to, comma separated
        #[arg(long, value_delimiter = ',')]
        kinds: Vec<TransportKind>,

        /// Print the prompt that was sent
        #[arg(long)]
        show_prompt: bool,

        /// Print the reconciled result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show what a plan in the current (or given) mode would ask for
    Preview {
        #[arg(long)]
        mode: Option<CommuteMode>,
    },
    /// Print the resolved commute mode
    Mode {
        /// Local time as "YYYY-MM-DD HH:MM"
        #[arg(long)]
        at: Option<String>,
    },
    /// Manage saved stations
    #[command(subcommand)]
    Stations(StationsCommand),
    /// Show or change settings
    Settings(SettingsArgs),
    /// Bikeshare lookups
    #[command(subcommand)]
    Bike(BikeCommand),
    /// Find a bus stop with the model and save it
    Bus {
        city: String,
        district: String,
        keyword: String,
    },
    /// Force a bikeshare refresh
    Refresh,
}

#[derive(Debug, Subcommand)]
enum StationsCommand {
    /// List saved stations, optionally filtered
    List {
        kind: Option<TransportKind>,
        #[arg(long, default_value = "")]
        filter: String,
    },
    /// Add a station, or remove it if already saved
    Toggle {
        kind: TransportKind,
        name: String,
        #[arg(long)]
        at: Option<GeoPoint>,
    },
    /// Remove by position as shown by `list`
    Remove { kind: TransportKind, index: usize },
}

#[derive(Debug, Subcommand)]
enum BikeCommand {
    /// Search the official feed, falling back to the model
    Search {
        query: String,
        /// Save the Nth official hit (1-based)
        #[arg(long)]
        add: Option<usize>,
    },
    /// List cities and districts in the feed
    Regions,
}

#[derive(Debug, Args)]
struct SettingsArgs {
    #[arg(long)]
    api_key: Option<String>,
    #[arg(long)]
    work_time: Option<String>,
    #[arg(long)]
    home_time: Option<String>,
    #[arg(long, value_delimiter = ',')]
    work_kinds: Option<Vec<TransportKind>>,
    #[arg(long, value_delimiter = ',')]
    home_kinds: Option<Vec<TransportKind>>,
    /// Work destination, e.g. "市政府 (捷運)"
    #[arg(long)]
    work_destination: Option<String>,
    #[arg(long)]
    home_destination: Option<String>,
    #[arg(long)]
    old_home: Option<String>,
    #[arg(long)]
    holiday_home: Option<String>,
    /// Use a saved station as the work destination, as KIND:INDEX from `stations list`
    #[arg(long, value_name = "KIND:INDEX", conflicts_with = "work_destination")]
    work_station: Option<StationRef>,
    #[arg(long, value_name = "KIND:INDEX", conflicts_with = "home_destination")]
    home_station: Option<StationRef>,
    #[arg(long, value_name = "KIND:INDEX", conflicts_with = "old_home")]
    old_home_station: Option<StationRef>,
    #[arg(long, value_name = "KIND:INDEX", conflicts_with = "holiday_home")]
    holiday_home_station: Option<StationRef>,
}

/// A saved station addressed by kind and list position, e.g. `mrt:0`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct StationRef {
    kind: TransportKind,
    index: usize,
}

impl FromStr for StationRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, index) = s
            .split_once(':')
            .ok_or_else(|| format!("expected KIND:INDEX, got {:?}", s))?;
        let index = index
            .trim()
            .parse()
            .map_err(|_| format!("invalid station index: {:?}", index.trim()))?;
        Ok(Self {
            kind: kind.parse()?,
            index,
        })
    }
}

/// Resolve a destination flag: a saved station wins over free text.
async fn destination(
    planner: &CommutePlanner,
    name: Option<String>,
    station: Option<StationRef>,
) -> Result<Option<Destination>, CommuteError> {
    match (station, name) {
        (Some(r), _) => planner.station_destination(r.kind, r.index).await.map(Some),
        (None, Some(name)) => Ok(Some(Destination::new(name, None))),
        (None, None) => Ok(None),
    }
}

impl SettingsArgs {
    fn is_empty(&self) -> bool {
        self.api_key.is_none()
            && self.work_time.is_none()
            && self.home_time.is_none()
            && self.work_kinds.is_none()
            && self.home_kinds.is_none()
            && self.work_destination.is_none()
            && self.home_destination.is_none()
            && self.old_home.is_none()
            && self.holiday_home.is_none()
            && self.work_station.is_none()
            && self.home_station.is_none()
            && self.old_home_station.is_none()
            && self.holiday_home_station.is_none()
    }
}

fn database_url(flag: Option<String>) -> String {
    let raw = flag
        .or_else(|| env::var("COMMUTE_DB_PATH").ok())
        .unwrap_or_else(|| DEFAULT_DB_URL.to_string());
    if raw.starts_with("sqlite:") {
        raw
    } else {
        format!("sqlite://{}", raw)
    }
}

fn position_provider(flag: Option<GeoPoint>) -> Arc<dyn PositionProvider> {
    let fixed = flag.or_else(|| match env::var("COMMUTE_POSITION") {
        Ok(value) => match value.parse::<GeoPoint>() {
            Ok(point) => Some(point),
            Err(e) => {
                warn!("Ignoring COMMUTE_POSITION {:?}: {}", value, e);
                None
            }
        },
        Err(_) => None,
    });

    match fixed {
        Some(point) => Arc::new(FixedPosition(point)),
        None => Arc::new(NoPosition),
    }
}

async fn build_planner(cli: &Cli) -> Result<CommutePlanner, Box<dyn std::error::Error>> {
    let planner_config = PlannerConfig::from_env()?;
    let gemini_config = GeminiConfig::from_env();
    let fallback_key = gemini_config.api_key.clone();

    let url = database_url(cli.db.clone());
    let database = Database::connect(&url).await?;
    database.migrate().await?;
    info!("Using store {}", url);

    let mut repository = StationRepository::load(Arc::new(database)).await?;
    if let Some(key) = fallback_key.as_deref() {
        repository.seed_api_key(key);
    }

    let feeds = Arc::new(HttpFeeds::new(FeedsConfig::from_env())?);
    let collaborators = Collaborators {
        model: Arc::new(GeminiClient::new(gemini_config)?),
        oracle: Arc::new(CalendarOracle::new(feeds.clone())),
        bikeshare: Arc::new(BikeshareCache::new(feeds.clone())),
        places: feeds,
        position: position_provider(cli.position),
    };

    Ok(CommutePlanner::new(repository, collaborators, planner_config))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let planner = build_planner(&cli).await?;

    match cli.command {
        Command::Plan {
            mode,
            to,
            kinds,
            show_prompt,
            json,
        } => {
            let request = match to {
                Some(text) => {
                    let trip: CustomTrip = planner.resolve_destination(&text).await?.with_kinds(kinds);
                    PlanRequest::custom(trip)
                }
                None => PlanRequest {
                    mode,
                    ..PlanRequest::auto()
                },
            };

            let outcome = planner.plan(request).await;
            if show_prompt {
                if let Some(capture) = planner.last_debug().await {
                    println!("--- prompt {} ---\n{}\n", capture.fingerprint, capture.prompt);
                }
            }
            match outcome? {
                Some(outcome) if json => println!("{}", serde_json::to_string_pretty(&outcome)?),
                Some(outcome) => print!("{}", render::plan(&outcome)),
                None => println!("Superseded by a newer request."),
            }
        }
        Command::Preview { mode } => {
            let (mode, text) = match mode {
                Some(mode) => (mode, planner.preview_for(mode).await),
                None => planner.preview().await,
            };
            println!("[{}]\n{}", mode, text);
        }
        Command::Mode { at } => {
            let at = match at {
                Some(text) => NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M")?,
                None => planner.now(),
            };
            println!("{} {}", at.format("%Y-%m-%d %H:%M"), planner.mode_at(at).await);
        }
        Command::Stations(StationsCommand::List { kind, filter }) => {
            let kinds = kind.map(|k| vec![k]).unwrap_or_else(|| TransportKind::ALL.to_vec());
            for kind in kinds {
                let stations = planner.filter_saved(kind, &filter).await;
                print!("{}", render::stations(kind, &stations));
            }
        }
        Command::Stations(StationsCommand::Toggle { kind, name, at }) => {
            let station = match at {
                Some(point) => Station::at(name, point),
                None => Station::named(name),
            };
            let label = station.to_string();
            let outcome = planner.toggle_station(kind, station).await?;
            println!("{:?} {} ({})", outcome, label, kind.label());
        }
        Command::Stations(StationsCommand::Remove { kind, index }) => {
            match planner.remove_station(kind, index).await? {
                Some(station) => println!("Removed {} ({})", station, kind.label()),
                None => println!("No {} station at index {}", kind.label(), index),
            }
        }
        Command::Settings(args) => {
            if !args.is_empty() {
                let mut form = planner.settings().await.to_form();
                if let Some(key) = args.api_key {
                    form.api_key = key;
                }
                if let Some(time) = args.work_time {
                    form.work_time = time;
                }
                if let Some(time) = args.home_time {
                    form.home_time = time;
                }
                if let Some(kinds) = args.work_kinds {
                    form.work_trans = kinds;
                }
                if let Some(kinds) = args.home_kinds {
                    form.home_trans = kinds;
                }
                if let Some(d) = destination(&planner, args.work_destination, args.work_station).await? {
                    form.work_destination = d;
                }
                if let Some(d) = destination(&planner, args.home_destination, args.home_station).await? {
                    form.home_destination = d;
                }
                if let Some(d) = destination(&planner, args.old_home, args.old_home_station).await? {
                    form.holiday_old_home_destination = d;
                }
                if let Some(d) =
                    destination(&planner, args.holiday_home, args.holiday_home_station).await?
                {
                    form.holiday_home_destination = d;
                }
                planner.save_settings(form).await?;
            }
            print!("{}", render::settings(&planner.settings().await));
        }
        Command::Bike(BikeCommand::Search { query, add }) => match planner.lookup_bikeshare(&query).await? {
            BikeshareLookup::Matches { hits, total } => {
                if let Some(n) = add {
                    let hit = n
                        .checked_sub(1)
                        .and_then(|i| hits.get(i))
                        .ok_or_else(|| format!("no hit number {}", n))?;
                    let outcome = planner
                        .toggle_station(TransportKind::Bikeshare, hit.station.to_station())
                        .await?;
                    println!("{:?} {}", outcome, hit.station.name);
                } else {
                    print!("{}", render::bike_hits(&hits, total));
                }
            }
            BikeshareLookup::Added(station) => {
                println!("Added {} (model result, may be inaccurate)", station);
            }
        },
        Command::Bike(BikeCommand::Regions) => {
            print!("{}", render::regions(&planner.bikeshare_regions().await));
        }
        Command::Bus {
            city,
            district,
            keyword,
        } => {
            let station = planner.lookup_bus(&city, &district, &keyword).await?;
            println!("Added {} (model result, may be inaccurate)", station);
        }
        Command::Refresh => {
            println!("{} bikeshare stations cached", planner.refresh_bikeshare().await?);
        }
    }

    Ok(())
}
