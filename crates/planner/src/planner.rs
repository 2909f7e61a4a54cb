//! The commute planner: ties the resolver, composer, model and reconciler together.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use commute_core::{
    hash_prompt, CommuteError, CommuteMode, CustomTrip, Destination, ModelClient,
    ReconciledResult, Settings, SettingsForm, Station, StationCollections, TransportKind,
};
use serde::Serialize;
use station_store::{StationRepository, ToggleOutcome};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use transit_feeds::{Availability, BikeshareCache, HolidayOracle, PlaceSearch};

use crate::composer::{self, PromptInput};
use crate::config::PlannerConfig;
use crate::position::{locate, PositionProvider};
use crate::reconciler::reconcile;
use crate::resolver::resolve_mode;
use crate::sequencer::{Debouncer, RequestSequencer};

/// Notice attached to late-night plans.
pub const LATE_NIGHT_NOTICE: &str = "Only YouBike is still running at this hour.";

/// External services the planner talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub model: Arc<dyn ModelClient>,
    pub oracle: Arc<dyn HolidayOracle>,
    pub bikeshare: Arc<BikeshareCache>,
    pub places: Arc<dyn PlaceSearch>,
    pub position: Arc<dyn PositionProvider>,
}

/// What to plan for.
#[derive(Debug, Clone, Default)]
pub struct PlanRequest {
    /// Forced mode; resolved from the clock when `None`.
    pub mode: Option<CommuteMode>,
    /// A custom destination; implies [`CommuteMode::Custom`].
    pub trip: Option<CustomTrip>,
    /// Local time to plan for; the current time when `None`.
    pub at: Option<NaiveDateTime>,
}

impl PlanRequest {
    /// Resolve the mode from the clock.
    pub fn auto() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: CommuteMode) -> Self {
        Self {
            mode: Some(mode),
            ..Self::default()
        }
    }

    pub fn custom(trip: CustomTrip) -> Self {
        Self {
            mode: Some(CommuteMode::Custom),
            trip: Some(trip),
            at: None,
        }
    }

    pub fn at(mut self, at: NaiveDateTime) -> Self {
        self.at = Some(at);
        self
    }
}

/// A completed plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    pub mode: CommuteMode,
    pub prompt_fingerprint: String,
    pub result: ReconciledResult,
    /// Live counts for bikeshare stations named in the result.
    pub bike_availability: BTreeMap<String, Availability>,
    pub notice: Option<&'static str>,
}

/// The last prompt sent and what came back, for troubleshooting.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugCapture {
    pub mode: CommuteMode,
    pub prompt: String,
    pub fingerprint: String,
    pub response: Result<String, String>,
}

/// Commute planner.
///
/// Owns the station repository and the process-wide feed caches; every
/// other dependency is injected through [`Collaborators`].
pub struct CommutePlanner {
    pub(crate) repository: RwLock<StationRepository>,
    pub(crate) services: Collaborators,
    pub(crate) config: PlannerConfig,
    sequencer: RequestSequencer,
    pub(crate) debouncer: Debouncer,
    last_debug: RwLock<Option<DebugCapture>>,
}

impl CommutePlanner {
    /// Create a planner over a loaded repository.
    pub fn new(repository: StationRepository, services: Collaborators, config: PlannerConfig) -> Self {
        info!(
            "Commute planner ready (model: {}, timezone: {})",
            services.model.name(),
            config.timezone
        );
        Self {
            repository: RwLock::new(repository),
            debouncer: Debouncer::new(config.search_debounce),
            services,
            config,
            sequencer: RequestSequencer::new(),
            last_debug: RwLock::new(None),
        }
    }

    /// Current local time in the configured timezone.
    pub fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.config.timezone).naive_local()
    }

    /// Mode for the current time.
    pub async fn current_mode(&self) -> CommuteMode {
        self.mode_at(self.now()).await
    }

    /// Mode for a given local time.
    pub async fn mode_at(&self, at: NaiveDateTime) -> CommuteMode {
        let settings = self.settings().await;
        resolve_mode(at, &settings, self.services.oracle.as_ref()).await
    }

    /// Plan a trip.
    ///
    /// Returns `Ok(None)` when a newer plan was started while this one waited
    /// for the model; the stale answer (or error) is dropped.
    pub async fn plan(&self, request: PlanRequest) -> Result<Option<PlanOutcome>, CommuteError> {
        let ticket = self.sequencer.issue();
        let now = request.at.unwrap_or_else(|| self.now());

        let (settings, collections) = {
            let repository = self.repository.read().await;
            (repository.settings().clone(), repository.collections().clone())
        };
        let api_key = require_api_key(&settings)?;

        let mode = match (&request.trip, request.mode) {
            (Some(_), _) => CommuteMode::Custom,
            (None, Some(mode)) => mode,
            (None, None) => resolve_mode(now, &settings, self.services.oracle.as_ref()).await,
        };

        let position = locate(self.services.position.as_ref()).await;
        let bike_live = self.saved_bike_availability(&collections).await;
        let prompt = composer::compose(&PromptInput {
            mode,
            now,
            settings: &settings,
            collections: &collections,
            position,
            custom: request.trip.as_ref(),
            bike_live: &bike_live,
        });
        let fingerprint = hash_prompt(&prompt);
        info!(
            "Planning {} trip via {} (prompt {})",
            mode,
            self.services.model.name(),
            short(&fingerprint)
        );

        let reply = self.services.model.generate(&api_key, &prompt).await;

        if !self.sequencer.is_current(ticket) {
            debug!("Dropping superseded plan {} ({})", ticket.id(), short(&fingerprint));
            return Ok(None);
        }

        *self.last_debug.write().await = Some(DebugCapture {
            mode,
            prompt,
            fingerprint: fingerprint.clone(),
            response: reply.as_ref().cloned().map_err(|e| e.to_string()),
        });

        let raw = match reply {
            Ok(raw) => raw,
            Err(e) => {
                if e.is_retryable() {
                    warn!("Model is busy, try again shortly: {}", e);
                }
                return Err(e);
            }
        };
        let result = reconcile(&raw)?;

        let bike_availability = if result.has_legs(TransportKind::Bikeshare) {
            self.services.bikeshare.fetch(true).await;
            self.leg_availability(&result).await
        } else {
            BTreeMap::new()
        };

        Ok(Some(PlanOutcome {
            mode,
            prompt_fingerprint: fingerprint,
            result,
            bike_availability,
            notice: (mode == CommuteMode::LateNight).then_some(LATE_NIGHT_NOTICE),
        }))
    }

    /// Preview text for the current mode.
    pub async fn preview(&self) -> (CommuteMode, String) {
        let mode = self.current_mode().await;
        (mode, self.preview_for(mode).await)
    }

    /// Preview text for a given mode.
    pub async fn preview_for(&self, mode: CommuteMode) -> String {
        composer::preview(mode, &self.settings().await)
    }

    /// The last prompt and model answer, if any plan got that far.
    pub async fn last_debug(&self) -> Option<DebugCapture> {
        self.last_debug.read().await.clone()
    }

    pub async fn settings(&self) -> Settings {
        self.repository.read().await.settings().clone()
    }

    pub async fn collections(&self) -> StationCollections {
        self.repository.read().await.collections().clone()
    }

    /// Add the station, or remove it if one with the same name is saved.
    pub async fn toggle_station(
        &self,
        kind: TransportKind,
        station: Station,
    ) -> Result<ToggleOutcome, CommuteError> {
        Ok(self.repository.write().await.toggle(kind, station).await?)
    }

    /// Remove by position. Confirmation is the caller's job.
    pub async fn remove_station(
        &self,
        kind: TransportKind,
        index: usize,
    ) -> Result<Option<Station>, CommuteError> {
        Ok(self.repository.write().await.remove(kind, index).await?)
    }

    /// The saved station at `index` as a last-mile destination for the settings form.
    pub async fn station_destination(
        &self,
        kind: TransportKind,
        index: usize,
    ) -> Result<Destination, CommuteError> {
        let repository = self.repository.read().await;
        repository
            .stations(kind)
            .get(index)
            .map(|station| Destination::from_station(station, kind))
            .ok_or_else(|| {
                CommuteError::ValidationFailure(format!(
                    "no saved {} station at index {}",
                    kind.label(),
                    index
                ))
            })
    }

    pub async fn save_settings(&self, form: SettingsForm) -> Result<(), CommuteError> {
        Ok(self.repository.write().await.save_settings(form).await?)
    }

    async fn saved_bike_availability(
        &self,
        collections: &StationCollections,
    ) -> BTreeMap<String, Availability> {
        let mut live = BTreeMap::new();
        for station in collections.get(TransportKind::Bikeshare) {
            if let Some(counts) = self.services.bikeshare.availability(&station.name).await {
                live.insert(station.name.clone(), counts);
            }
        }
        live
    }

    async fn leg_availability(&self, result: &ReconciledResult) -> BTreeMap<String, Availability> {
        let mut live = BTreeMap::new();
        for leg in result.legs(TransportKind::Bikeshare) {
            for name in leg.station_names() {
                if let Some(counts) = self.services.bikeshare.availability(name).await {
                    live.insert(name.to_string(), counts);
                }
            }
        }
        live
    }
}

pub(crate) fn require_api_key(settings: &Settings) -> Result<String, CommuteError> {
    if settings.has_api_key() {
        Ok(settings.api_key.trim().to_string())
    } else {
        Err(CommuteError::Configuration(
            "no API key configured; set one in the settings first".to_string(),
        ))
    }
}

fn short(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}
