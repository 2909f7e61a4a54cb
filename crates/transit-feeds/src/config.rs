//! Feed endpoints.

use std::env;
use std::time::Duration;

/// Default holiday calendar base URL; the year file is appended.
pub const DEFAULT_CALENDAR_URL: &str = "https://cdn.jsdelivr.net/gh/ruyut/TaiwanCalendar/data";

/// Default national bikeshare snapshot.
pub const DEFAULT_BIKESHARE_URL: &str = "https://apis.youbike.com.tw/json/station-yb2.json";

/// Default place-search endpoint (Nominatim compatible).
pub const DEFAULT_PLACE_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Endpoints and timeouts for the public feeds.
#[derive(Debug, Clone)]
pub struct FeedsConfig {
    /// Base URL of the holiday calendar; `{year}.json` is appended.
    pub calendar_url: String,

    /// URL of the bikeshare availability snapshot.
    pub bikeshare_url: String,

    /// URL of the place-search endpoint.
    pub place_search_url: String,

    /// Request timeout for every feed.
    pub timeout: Duration,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            calendar_url: DEFAULT_CALENDAR_URL.to_string(),
            bikeshare_url: DEFAULT_BIKESHARE_URL.to_string(),
            place_search_url: DEFAULT_PLACE_SEARCH_URL.to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

impl FeedsConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `CALENDAR_URL` - Holiday calendar base URL
    /// - `BIKESHARE_URL` - Bikeshare snapshot URL
    /// - `PLACE_SEARCH_URL` - Place-search endpoint
    /// - `FEED_TIMEOUT_SECS` - Request timeout in seconds (default: 15)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let timeout = env::var("FEED_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        Self {
            calendar_url: env::var("CALENDAR_URL").unwrap_or(defaults.calendar_url),
            bikeshare_url: env::var("BIKESHARE_URL").unwrap_or(defaults.bikeshare_url),
            place_search_url: env::var("PLACE_SEARCH_URL").unwrap_or(defaults.place_search_url),
            timeout,
        }
    }

    /// Create a new config builder.
    pub fn builder() -> FeedsConfigBuilder {
        FeedsConfigBuilder::default()
    }
}

/// Builder for FeedsConfig.
#[derive(Debug, Default)]
pub struct FeedsConfigBuilder {
    config: FeedsConfig,
}

impl FeedsConfigBuilder {
    pub fn calendar_url(mut self, url: impl Into<String>) -> Self {
        self.config.calendar_url = url.into();
        self
    }

    pub fn bikeshare_url(mut self, url: impl Into<String>) -> Self {
        self.config.bikeshare_url = url.into();
        self
    }

    pub fn place_search_url(mut self, url: impl Into<String>) -> Self {
        self.config.place_search_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> FeedsConfig {
        self.config
    }
}
