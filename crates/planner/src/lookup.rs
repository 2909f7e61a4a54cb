//! Station and destination lookups.
//!
//! Bikeshare stations come from the official feed first and the model
//! second; bus stops only from the model; rail and metro stations are picked
//! from what the user already saved.

use commute_core::{CommuteError, CustomTrip, Station, TransportKind};
use tracing::{debug, info, warn};
use transit_feeds::bikeshare::RegionIndex;
use transit_feeds::ScoredStation;

use crate::composer;
use crate::planner::{require_api_key, CommutePlanner};
use crate::reconciler::{parse_validation, ValidatedPlace};

/// Most official hits returned by one bikeshare lookup.
pub const MAX_BIKESHARE_HITS: usize = 10;

/// Result of a bikeshare lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum BikeshareLookup {
    /// Official feed hits, best first, plus how many matched in total.
    Matches { hits: Vec<ScoredStation>, total: usize },
    /// Nothing in the feed; the model confirmed a station and it was saved.
    Added(Station),
}

impl CommutePlanner {
    /// Look a bikeshare station up by name.
    pub async fn lookup_bikeshare(&self, query: &str) -> Result<BikeshareLookup, CommuteError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(BikeshareLookup::Matches {
                hits: Vec::new(),
                total: 0,
            });
        }

        self.services.bikeshare.fetch(false).await;
        let mut hits = self.services.bikeshare.search(query).await;
        if !hits.is_empty() {
            let total = hits.len();
            hits.truncate(MAX_BIKESHARE_HITS);
            return Ok(BikeshareLookup::Matches { hits, total });
        }

        info!("No official bikeshare match for {:?}, asking the model", query);
        let place = self
            .validate_with_model(&composer::bikeshare_validation_prompt(query))
            .await?;
        let station = Station::at(place.name, place.coords);
        self.repository
            .write()
            .await
            .ensure(TransportKind::Bikeshare, station.clone())
            .await?;
        Ok(BikeshareLookup::Added(station))
    }

    /// [`lookup_bikeshare`](Self::lookup_bikeshare) after the search debounce window.
    ///
    /// `None` when a newer lookup arrived during the window or while this one ran.
    pub async fn debounced_bikeshare_lookup(
        &self,
        query: &str,
    ) -> Result<Option<BikeshareLookup>, CommuteError> {
        let Some(ticket) = self.debouncer.settle().await else {
            return Ok(None);
        };

        let lookup = self.lookup_bikeshare(query).await;
        if !self.debouncer.is_current(ticket) {
            debug!("Dropping overtaken bikeshare lookup for {:?}", query);
            return Ok(None);
        }
        lookup.map(Some)
    }

    /// Ask the model for a bus stop in a city and district and save it.
    pub async fn lookup_bus(
        &self,
        city: &str,
        district: &str,
        keyword: &str,
    ) -> Result<Station, CommuteError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(CommuteError::ValidationFailure(
                "enter a stop name to search for".to_string(),
            ));
        }

        let query = [city.trim(), district.trim(), keyword, "公車站"]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let place = self
            .validate_with_model(&composer::bus_validation_prompt(&query))
            .await?;

        let station = Station::at(place.name, place.coords);
        self.repository
            .write()
            .await
            .ensure(TransportKind::Bus, station.clone())
            .await?;
        Ok(station)
    }

    /// Saved stations of `kind` whose name contains `query`, ignoring case.
    pub async fn filter_saved(&self, kind: TransportKind, query: &str) -> Vec<Station> {
        let query = query.trim().to_lowercase();
        let repository = self.repository.read().await;
        repository
            .stations(kind)
            .iter()
            .filter(|s| query.is_empty() || s.name.to_lowercase().contains(&query))
            .cloned()
            .collect()
    }

    /// Turn free text into a custom trip with coordinates.
    ///
    /// Tries the place-search feed first and falls back to the model.
    pub async fn resolve_destination(&self, text: &str) -> Result<CustomTrip, CommuteError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CommuteError::ValidationFailure(
                "enter a destination".to_string(),
            ));
        }

        match self.services.places.search_places(text).await {
            Ok(hits) => {
                if let Some(hit) = hits.into_iter().next() {
                    debug!("Place search resolved {:?} to {}", text, hit.display_name);
                    return Ok(CustomTrip::new(text).with_coords(hit.coords));
                }
            }
            Err(e) => warn!("Place search failed for {:?}: {}", text, e),
        }

        let place = self
            .validate_with_model(&composer::destination_validation_prompt(text))
            .await?;
        Ok(CustomTrip::new(place.name).with_coords(place.coords))
    }

    /// Force a bikeshare refresh; returns the number of stations now cached.
    ///
    /// Unlike the refresh after a plan, a failure here is reported as
    /// [`CommuteError::NetworkUnavailable`]. The previous snapshot stays usable.
    pub async fn refresh_bikeshare(&self) -> Result<usize, CommuteError> {
        Ok(self.services.bikeshare.refresh().await?)
    }

    /// City → district grouping of the bikeshare snapshot, fetching it if empty.
    pub async fn bikeshare_regions(&self) -> RegionIndex {
        self.services.bikeshare.fetch(false).await;
        self.services.bikeshare.regions().await
    }

    async fn validate_with_model(&self, prompt: &str) -> Result<ValidatedPlace, CommuteError> {
        let api_key = require_api_key(&self.settings().await)?;
        let raw = self.services.model.generate(&api_key, prompt).await?;
        parse_validation(&raw)
    }
}
