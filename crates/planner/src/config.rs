//! Planner configuration.

use std::env;
use std::time::Duration;

use chrono_tz::Tz;
use commute_core::CommuteError;

/// Default timezone for mode resolution.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Taipei;

/// Configuration for CommutePlanner.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Timezone the commute clock runs in.
    pub timezone: Tz,

    /// Quiet period before a station search is sent.
    pub search_debounce: Duration,

    /// How long a GPS fix is reused.
    pub gps_cache_ttl: Duration,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE,
            search_debounce: Duration::from_millis(2000),
            gps_cache_ttl: Duration::from_secs(30 * 60),
        }
    }
}

impl PlannerConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `COMMUTE_TIMEZONE` - IANA timezone name (default: Asia/Taipei)
    /// - `COMMUTE_SEARCH_DEBOUNCE_MS` - Search debounce window (default: 2000)
    /// - `COMMUTE_GPS_CACHE_SECS` - GPS fix reuse window (default: 1800)
    pub fn from_env() -> Result<Self, CommuteError> {
        let defaults = Self::default();

        let timezone = match env::var("COMMUTE_TIMEZONE") {
            Ok(name) => name.trim().parse::<Tz>().map_err(|e| {
                CommuteError::Configuration(format!("invalid COMMUTE_TIMEZONE {:?}: {}", name, e))
            })?,
            Err(_) => defaults.timezone,
        };

        let search_debounce = env::var("COMMUTE_SEARCH_DEBOUNCE_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.search_debounce);

        let gps_cache_ttl = env::var("COMMUTE_GPS_CACHE_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.gps_cache_ttl);

        Ok(Self {
            timezone,
            search_debounce,
            gps_cache_ttl,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> PlannerConfigBuilder {
        PlannerConfigBuilder::default()
    }
}

/// Builder for PlannerConfig.
#[derive(Debug, Default)]
pub struct PlannerConfigBuilder {
    config: PlannerConfig,
}

impl PlannerConfigBuilder {
    pub fn timezone(mut self, timezone: Tz) -> Self {
        self.config.timezone = timezone;
        self
    }

    pub fn search_debounce(mut self, window: Duration) -> Self {
        self.config.search_debounce = window;
        self
    }

    pub fn gps_cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.gps_cache_ttl = ttl;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> PlannerConfig {
        self.config
    }
}
