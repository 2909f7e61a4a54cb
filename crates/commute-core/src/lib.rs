//! Core trait and types for the commute planner.
//!
//! This crate provides the shared vocabulary every other crate in the
//! workspace speaks. It defines:
//!
//! - [`Station`] / [`StationCollections`] / [`TransportKind`] - saved stations per kind
//! - [`Settings`] / [`LastMileTarget`] - the persisted settings aggregate
//! - [`CommuteMode`] / [`CustomTrip`] - the situational context of a query
//! - [`ItineraryLeg`] / [`ReconciledResult`] - the canonical model result
//! - [`CommuteError`] - the error taxonomy shared across crates
//! - [`ModelClient`] - the trait a generative model backend implements
//!
//! # Example
//!
//! ```rust
//! use commute_core::{async_trait, CommuteError, ModelClient};
//!
//! struct CannedModel;
//!
//! #[async_trait]
//! impl ModelClient for CannedModel {
//!     async fn generate(&self, _api_key: &str, _prompt: &str) -> Result<String, CommuteError> {
//!         Ok(r#"{"train": [], "itineraries": []}"#.to_string())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "CannedModel"
//!     }
//! }
//! ```

mod error;
mod geo;
mod itinerary;
mod mode;
mod model;
mod prompt;
pub mod serde_helpers;
mod settings;
mod station;

pub use error::CommuteError;
pub use geo::{haversine_km, GeoPoint, EARTH_RADIUS_KM};
pub use itinerary::{FlowLeg, Itinerary, ItineraryLeg, ReconciledResult, StopRef};
pub use mode::{CommuteMode, CustomTrip};
pub use model::ModelClient;
pub use prompt::hash_prompt;
pub use settings::{
    infer_kinds, parse_time_of_day, suffixed_name, Destination, HolidaySettings, LastMileTarget,
    Settings, SettingsForm, DEFAULT_HOME_TIME, DEFAULT_WORK_TIME,
};
pub use station::{Station, StationCollections, TransportKind};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
