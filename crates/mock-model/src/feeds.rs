//! Canned feed sources.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use transit_feeds::{
    BikeshareRecord, BikeshareSource, CalendarEntry, CalendarSource, FeedError, PlaceHit,
    PlaceSearch,
};

fn unavailable(feed: &'static str) -> FeedError {
    FeedError::Status { feed, status: 503 }
}

/// A calendar source serving fixed per-year tables.
///
/// Years without a table answer with an error, like a missing file would.
#[derive(Debug, Default)]
pub struct StaticCalendar {
    years: HashMap<i32, Vec<CalendarEntry>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl StaticCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `entries` for `year`.
    pub fn with_year(mut self, year: i32, entries: Vec<CalendarEntry>) -> Self {
        self.years.insert(year, entries);
        self
    }

    /// Make every fetch fail until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CalendarSource for StaticCalendar {
    async fn fetch_year(&self, year: i32) -> Result<Vec<CalendarEntry>, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable("calendar"));
        }
        self.years
            .get(&year)
            .cloned()
            .ok_or(FeedError::Status {
                feed: "calendar",
                status: 404,
            })
    }
}

/// A bikeshare source whose snapshot can be swapped between fetches.
#[derive(Debug, Default)]
pub struct StaticBikeshare {
    records: Mutex<Vec<BikeshareRecord>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl StaticBikeshare {
    pub fn new(records: Vec<BikeshareRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    /// Build a record with the fields the planner reads.
    pub fn record(name: &str, lat: f64, lng: f64, area: &str, rent: u32, ret: u32) -> BikeshareRecord {
        BikeshareRecord {
            name_tw: name.to_string(),
            lat: Some(lat),
            lng: Some(lng),
            area_code_2: area.to_string(),
            district_tw: String::new(),
            available_spaces: rent,
            empty_spaces: ret,
            updated_at: "2025-01-01 08:00:00".to_string(),
            ..Default::default()
        }
    }

    /// Replace the snapshot served by later fetches.
    pub fn set_records(&self, records: Vec<BikeshareRecord>) {
        if let Ok(mut current) = self.records.lock() {
            *current = records;
        }
    }

    /// Make every fetch fail until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BikeshareSource for StaticBikeshare {
    async fn fetch_snapshot(&self) -> Result<Vec<BikeshareRecord>, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable("bikeshare"));
        }
        Ok(self.records.lock().map(|r| r.clone()).unwrap_or_default())
    }
}

/// A place search answering from a fixed query → hits table.
#[derive(Debug, Default)]
pub struct StaticPlaces {
    hits: HashMap<String, Vec<PlaceHit>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl StaticPlaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` (trimmed, case-insensitive) with `hits`.
    pub fn with_hits(mut self, query: &str, hits: Vec<PlaceHit>) -> Self {
        self.hits.insert(query.trim().to_lowercase(), hits);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlaceSearch for StaticPlaces {
    async fn search_places(&self, query: &str) -> Result<Vec<PlaceHit>, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable("place search"));
        }
        Ok(self
            .hits
            .get(&query.trim().to_lowercase())
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use commute_core::GeoPoint;
    use std::sync::Arc;
    use transit_feeds::{CalendarOracle, HolidayOracle};

    #[tokio::test]
    async fn test_static_calendar() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let calendar = StaticCalendar::new().with_year(2025, vec![CalendarEntry::new(day, true)]);

        assert_eq!(calendar.fetch_year(2025).await.unwrap().len(), 1);
        assert!(calendar.fetch_year(2024).await.is_err());

        calendar.set_failing(true);
        assert!(calendar.fetch_year(2025).await.is_err());
        assert_eq!(calendar.calls(), 3);
    }

    #[tokio::test]
    async fn test_oracle_uses_weekend_rule_while_calendar_is_down() {
        let monday = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let calendar = Arc::new(
            StaticCalendar::new().with_year(2025, vec![CalendarEntry::new(monday, true)]),
        );
        calendar.set_failing(true);
        let oracle = CalendarOracle::new(calendar.clone());

        // Saturday 2025-03-01 through Friday 2025-03-07
        let mut week = Vec::new();
        for day in 1..=7 {
            let date = NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
            week.push(oracle.is_holiday(date).await);
        }
        assert_eq!(week, vec![true, true, false, false, false, false, false]);
        assert_eq!(calendar.calls(), 7);
        assert!(!oracle.has_year(2025).await);

        // Once the feed is back the year loads and the table wins.
        calendar.set_failing(false);
        assert!(oracle.is_holiday(monday).await);
        assert!(oracle.has_year(2025).await);
        assert!(oracle.is_holiday(monday).await);
        assert_eq!(calendar.calls(), 8);
    }

    #[tokio::test]
    async fn test_static_bikeshare_swaps_snapshot() {
        let feed = StaticBikeshare::new(vec![StaticBikeshare::record("A", 25.0, 121.5, "01", 1, 2)]);
        assert_eq!(feed.fetch_snapshot().await.unwrap().len(), 1);

        feed.set_records(Vec::new());
        assert!(feed.fetch_snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_static_places() {
        let hit = PlaceHit {
            display_name: "Taipei 101".to_string(),
            coords: GeoPoint::new(25.0339, 121.5645),
        };
        let places = StaticPlaces::new().with_hits("taipei 101", vec![hit.clone()]);

        assert_eq!(places.search_places(" Taipei 101 ").await.unwrap(), vec![hit]);
        assert!(places.search_places("Atlantis").await.unwrap().is_empty());
    }
}
