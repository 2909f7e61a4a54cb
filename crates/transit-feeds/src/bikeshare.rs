//! Bikeshare availability cache.
//!
//! Holds the most recent national snapshot as a flat list, a city → district
//! grouping and a name → live counts index. All three are rebuilt together on
//! every successful refresh.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use commute_core::serde_helpers::{lenient_count, lenient_f64_opt, lenient_string};
use commute_core::{GeoPoint, Station};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::FeedError;

/// Minimum fuzzy score a station needs to be returned by a search.
pub const MATCH_THRESHOLD: f64 = 0.6;

/// City used for unknown area codes.
pub const UNKNOWN_CITY: &str = "其他地區";

/// District used when the feed omits one.
pub const UNKNOWN_DISTRICT: &str = "其他區";

const VENDOR_PREFIXES: [&str; 2] = ["youbike2.0_", "youbike 2.0_"];

/// Map a feed area code to its city name.
pub fn city_for_area(code: &str) -> &'static str {
    let code = code.trim();
    let padded;
    let code = if code.len() == 1 && code.chars().all(|c| c.is_ascii_digit()) {
        padded = format!("0{}", code);
        padded.as_str()
    } else {
        code
    };

    match code {
        "01" => "臺北市",
        "02" => "新北市",
        "03" => "桃園市",
        "04" => "新竹市",
        "05" => "新竹縣",
        "06" => "臺中市",
        "07" => "苗栗縣",
        "08" => "嘉義市",
        "09" => "嘉義縣",
        "10" => "臺南市",
        "11" => "高雄市",
        "12" => "屏東縣",
        _ => UNKNOWN_CITY,
    }
}

/// Remove every occurrence of the vendor prefixes, ignoring ASCII case.
pub fn strip_vendor_prefix(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut rest = name;
    'outer: while !rest.is_empty() {
        for prefix in VENDOR_PREFIXES {
            if rest.len() >= prefix.len()
                && rest.is_char_boundary(prefix.len())
                && rest[..prefix.len()].eq_ignore_ascii_case(prefix)
            {
                rest = &rest[prefix.len()..];
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out.trim().to_string()
}

/// One record of the raw national snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BikeshareRecord {
    #[serde(alias = "name_localized", deserialize_with = "lenient_string")]
    pub name_tw: String,
    #[serde(deserialize_with = "lenient_f64_opt")]
    pub lat: Option<f64>,
    #[serde(deserialize_with = "lenient_f64_opt")]
    pub lng: Option<f64>,
    #[serde(deserialize_with = "lenient_string")]
    pub area_code_2: String,
    #[serde(deserialize_with = "lenient_string")]
    pub area_code: String,
    #[serde(alias = "district_localized", deserialize_with = "lenient_string")]
    pub district_tw: String,
    #[serde(deserialize_with = "lenient_count")]
    pub available_spaces: u32,
    #[serde(deserialize_with = "lenient_count")]
    pub empty_spaces: u32,
    #[serde(deserialize_with = "lenient_string")]
    pub updated_at: String,
}

/// A normalized bikeshare station with live counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BikeshareStation {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// City name.
    pub region: String,
    pub district: String,
    pub available_to_rent: u32,
    pub available_to_return: u32,
    pub updated_at: String,
}

impl BikeshareStation {
    /// Normalize a raw record; `None` when its coordinates are unusable.
    pub fn from_record(record: BikeshareRecord) -> Option<Self> {
        let lat = record.lat.filter(|v| *v != 0.0)?;
        let lng = record.lng.filter(|v| *v != 0.0)?;

        let area = if record.area_code_2.trim().is_empty() {
            &record.area_code
        } else {
            &record.area_code_2
        };
        let district = if record.district_tw.trim().is_empty() {
            UNKNOWN_DISTRICT.to_string()
        } else {
            record.district_tw.trim().to_string()
        };

        Some(Self {
            name: strip_vendor_prefix(&record.name_tw),
            lat,
            lng,
            region: city_for_area(area).to_string(),
            district,
            available_to_rent: record.available_spaces,
            available_to_return: record.empty_spaces,
            updated_at: record.updated_at,
        })
    }

    pub fn coords(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }

    pub fn availability(&self) -> Availability {
        Availability {
            available_to_rent: self.available_to_rent,
            available_to_return: self.available_to_return,
            updated_at: self.updated_at.clone(),
        }
    }

    /// The shape saved into the user's bikeshare collection.
    pub fn to_station(&self) -> Station {
        Station::at(self.name.clone(), self.coords()).with_region(self.region.clone())
    }
}

/// Live counts for one station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub available_to_rent: u32,
    pub available_to_return: u32,
    pub updated_at: String,
}

/// A search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredStation {
    pub station: BikeshareStation,
    pub score: f64,
}

/// City → district → stations, in feed order.
pub type RegionIndex = IndexMap<String, IndexMap<String, Vec<BikeshareStation>>>;

/// Source of the raw national snapshot.
#[async_trait]
pub trait BikeshareSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<Vec<BikeshareRecord>, FeedError>;
}

#[derive(Debug, Default)]
struct Snapshot {
    stations: Vec<BikeshareStation>,
    regions: RegionIndex,
    live: HashMap<String, Availability>,
}

impl Snapshot {
    fn build(records: Vec<BikeshareRecord>) -> Self {
        let mut snapshot = Snapshot::default();
        for station in records.into_iter().filter_map(BikeshareStation::from_record) {
            snapshot
                .live
                .insert(station.name.clone(), station.availability());
            snapshot
                .regions
                .entry(station.region.clone())
                .or_default()
                .entry(station.district.clone())
                .or_default()
                .push(station.clone());
            snapshot.stations.push(station);
        }
        snapshot
    }
}

/// Fuzzy match score of a station name against a query.
///
/// 1.0 when every whitespace-separated token appears in the name (ignoring
/// case), otherwise the fraction of the query's non-whitespace characters
/// found anywhere in the name.
pub fn match_score(name: &str, query: &str) -> f64 {
    let name = name.to_lowercase();
    let query = query.trim().to_lowercase();

    let mut tokens = query.split_whitespace().peekable();
    if tokens.peek().is_none() {
        return 0.0;
    }
    if tokens.all(|t| name.contains(t)) {
        return 1.0;
    }

    let chars: Vec<char> = query.chars().filter(|c| !c.is_whitespace()).collect();
    let hits = chars.iter().filter(|c| name.contains(**c)).count();
    hits as f64 / chars.len() as f64
}

/// Score and rank stations against a query. Blank queries match nothing.
pub fn search_stations(stations: &[BikeshareStation], query: &str) -> Vec<ScoredStation> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<ScoredStation> = stations
        .iter()
        .filter_map(|station| {
            let score = match_score(&station.name, query);
            (score > MATCH_THRESHOLD).then(|| ScoredStation {
                station: station.clone(),
                score,
            })
        })
        .collect();

    // Stable, so ties keep feed order.
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    hits
}

/// Process-wide cache of the bikeshare snapshot.
pub struct BikeshareCache {
    source: Arc<dyn BikeshareSource>,
    snapshot: RwLock<Snapshot>,
}

impl BikeshareCache {
    pub fn new(source: Arc<dyn BikeshareSource>) -> Self {
        Self {
            source,
            snapshot: RwLock::new(Snapshot::default()),
        }
    }

    /// Return the cached stations, fetching when empty or forced.
    ///
    /// A failed fetch keeps the previous snapshot and returns it.
    pub async fn fetch(&self, force: bool) -> Vec<BikeshareStation> {
        if !force {
            let snapshot = self.snapshot.read().await;
            if !snapshot.stations.is_empty() {
                return snapshot.stations.clone();
            }
        }

        if let Err(e) = self.refresh().await {
            warn!("Bikeshare refresh failed, keeping previous snapshot: {}", e);
        }
        self.snapshot.read().await.stations.clone()
    }

    /// Fetch a new snapshot and rebuild every index from it.
    ///
    /// Returns the number of stations kept. On error the previous snapshot
    /// stays in place.
    pub async fn refresh(&self) -> Result<usize, FeedError> {
        let records = self.source.fetch_snapshot().await?;
        let total = records.len();
        let rebuilt = Snapshot::build(records);
        info!(
            "Loaded {} bikeshare stations ({} records, {} cities)",
            rebuilt.stations.len(),
            total,
            rebuilt.regions.len()
        );
        let kept = rebuilt.stations.len();
        *self.snapshot.write().await = rebuilt;
        Ok(kept)
    }

    /// Rank cached stations against a query.
    pub async fn search(&self, query: &str) -> Vec<ScoredStation> {
        let snapshot = self.snapshot.read().await;
        let hits = search_stations(&snapshot.stations, query);
        debug!("Bikeshare search {:?}: {} hits", query, hits.len());
        hits
    }

    /// Live counts for a station by its normalized name.
    pub async fn availability(&self, name: &str) -> Option<Availability> {
        self.snapshot.read().await.live.get(name).cloned()
    }

    /// The city → district grouping of the current snapshot.
    pub async fn regions(&self) -> RegionIndex {
        self.snapshot.read().await.regions.clone()
    }

    pub async fn len(&self) -> usize {
        self.snapshot.read().await.stations.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
