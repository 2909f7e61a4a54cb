//! HTTP implementations of the feed sources.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::bikeshare::{BikeshareRecord, BikeshareSource};
use crate::calendar::{CalendarEntry, CalendarSource};
use crate::config::FeedsConfig;
use crate::error::FeedError;
use crate::places::{PlaceHit, PlaceRecord, PlaceSearch};

/// Maximum number of place candidates requested per search.
const PLACE_SEARCH_LIMIT: u32 = 5;

/// Client for the public calendar, bikeshare and place-search feeds.
#[derive(Debug, Clone)]
pub struct HttpFeeds {
    client: reqwest::Client,
    config: FeedsConfig,
}

impl HttpFeeds {
    pub fn new(config: FeedsConfig) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("commute-planner/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FeedsConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(&self, feed: &'static str, url: &str) -> Result<T, FeedError> {
        debug!("Fetching {} from: {}", feed, url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FeedError::Status {
                feed,
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl CalendarSource for HttpFeeds {
    async fn fetch_year(&self, year: i32) -> Result<Vec<CalendarEntry>, FeedError> {
        let url = format!("{}/{}.json", self.config.calendar_url.trim_end_matches('/'), year);
        self.get_json("calendar", &url).await
    }
}

#[async_trait]
impl BikeshareSource for HttpFeeds {
    async fn fetch_snapshot(&self) -> Result<Vec<BikeshareRecord>, FeedError> {
        self.get_json("bikeshare", &self.config.bikeshare_url).await
    }
}

#[async_trait]
impl PlaceSearch for HttpFeeds {
    async fn search_places(&self, query: &str) -> Result<Vec<PlaceHit>, FeedError> {
        let url = format!(
            "{}?format=json&limit={}&q={}",
            self.config.place_search_url,
            PLACE_SEARCH_LIMIT,
            urlencoding::encode(query.trim())
        );
        let records: Vec<PlaceRecord> = self.get_json("place search", &url).await?;
        Ok(records.into_iter().filter_map(PlaceRecord::into_hit).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BikeshareCache, CalendarOracle, HolidayOracle};
    use chrono::NaiveDate;
    use std::sync::Arc;

    // Integration tests that require network access
    #[tokio::test]
    #[ignore] // Run with: cargo test -- --ignored
    async fn test_live_calendar() {
        let feeds = Arc::new(HttpFeeds::new(FeedsConfig::default()).unwrap());
        let oracle = CalendarOracle::new(feeds);
        let new_year = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert!(oracle.is_holiday(new_year).await);
        assert!(oracle.has_year(2025).await);
    }

    #[tokio::test]
    #[ignore]
    async fn test_live_bikeshare() {
        let feeds = Arc::new(HttpFeeds::new(FeedsConfig::default()).unwrap());
        let cache = BikeshareCache::new(feeds);
        let stations = cache.fetch(false).await;
        assert!(!stations.is_empty());
        assert!(stations.iter().all(|s| !s.name.to_lowercase().starts_with("youbike")));
    }

    #[tokio::test]
    #[ignore]
    async fn test_live_place_search() {
        let feeds = HttpFeeds::new(FeedsConfig::default()).unwrap();
        let hits = feeds.search_places("Taipei 101").await.unwrap();
        assert!(!hits.is_empty());
    }
}
