//! Commute planning core.
//!
//! This crate provides the [`CommutePlanner`] type, which decides what kind
//! of trip the user is making and asks a generative model to plan it.
//!
//! # Architecture
//!
//! ```text
//! plan request (CLI, timer)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      COMMUTE PLANNER                        │
//! │                                                             │
//! │  1. Resolve mode (clock + holiday oracle + settings)        │
//! │         ↓                                                   │
//! │  2. Compose prompt (stations, GPS, live bikeshare counts)   │
//! │         ↓                                                   │
//! │  3. Call the model (dropped if a newer plan started)        │
//! │         ↓                                                   │
//! │  4. Reconcile the answer into per-kind legs                 │
//! │         ↓                                                   │
//! │  5. Refresh bikeshare counts when bike legs were suggested  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use planner::{CommutePlanner, PlanRequest};
//!
//! let planner = CommutePlanner::new(repository, collaborators, PlannerConfig::from_env()?);
//! if let Some(outcome) = planner.plan(PlanRequest::auto()).await? {
//!     for itinerary in &outcome.result.itineraries {
//!         println!("{}: {} ({})", itinerary.title, itinerary.details, itinerary.time);
//!     }
//! }
//! ```

pub mod composer;
mod config;
mod lookup;
#[allow(clippy::module_inception)]
mod planner;
pub mod position;
pub mod reconciler;
pub mod resolver;
mod sequencer;

pub use config::{PlannerConfig, PlannerConfigBuilder, DEFAULT_TIMEZONE};
pub use lookup::{BikeshareLookup, MAX_BIKESHARE_HITS};
pub use planner::{
    Collaborators, CommutePlanner, DebugCapture, PlanOutcome, PlanRequest, LATE_NIGHT_NOTICE,
};
pub use position::{locate, CachedPosition, FixedPosition, NoPosition, PositionError, PositionProvider};
pub use reconciler::{reconcile, ValidatedPlace};
pub use resolver::{resolve_mode, DayVerdicts};
pub use sequencer::{Debouncer, RequestSequencer, Ticket};

// Re-export the shared types callers need alongside the planner
pub use commute_core::{CommuteError, CommuteMode, CustomTrip, ReconciledResult};
