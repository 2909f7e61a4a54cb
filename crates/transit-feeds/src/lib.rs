//! Public feed clients for the commute planner.
//!
//! - [`CalendarOracle`] - holiday lookups from a per-year calendar with a weekend fallback
//! - [`BikeshareCache`] - national bikeshare snapshot, grouped by city and district, with fuzzy search
//! - [`PlaceSearch`] - free-text geocoding for custom destinations
//!
//! Every feed sits behind a small source trait so tests can substitute
//! canned data; [`HttpFeeds`] implements all of them over HTTP.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use transit_feeds::{BikeshareCache, FeedsConfig, HttpFeeds};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let feeds = Arc::new(HttpFeeds::new(FeedsConfig::from_env())?);
//!     let cache = BikeshareCache::new(feeds);
//!     cache.fetch(false).await;
//!     for hit in cache.search("市政府").await.iter().take(5) {
//!         println!("{} ({:.2})", hit.station.name, hit.score);
//!     }
//!     Ok(())
//! }
//! ```

pub mod bikeshare;
pub mod calendar;
mod config;
mod error;
mod http;
pub mod places;

pub use bikeshare::{
    Availability, BikeshareCache, BikeshareRecord, BikeshareSource, BikeshareStation,
    ScoredStation, MATCH_THRESHOLD,
};
pub use calendar::{CalendarEntry, CalendarOracle, CalendarSource, HolidayOracle};
pub use config::{FeedsConfig, FeedsConfigBuilder};
pub use error::FeedError;
pub use http::HttpFeeds;
pub use places::{PlaceHit, PlaceSearch};
