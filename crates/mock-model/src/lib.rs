//! Mock model clients and canned feeds for the commute planner.
//!
//! This crate provides test doubles for every external collaborator:
//! - `ScriptedModel` - Replies with queued responses and records prompts
//! - `DelayedModel` - Wraps another model with artificial delay
//! - `StaticCalendar` / `StaticBikeshare` / `StaticPlaces` - Canned feed sources
//! - `FixedOracle` - A holiday oracle over an explicit date set
//!
//! For production use, see the `gemini-brain` and `transit-feeds` crates.
//!
//! # Example
//!
//! ```rust
//! use mock_model::{ModelClient, ScriptedModel};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_model::CommuteError> {
//!     let model = ScriptedModel::repeating(r#"{"train": []}"#);
//!
//!     let reply = model.generate("key", "plan my commute").await?;
//!     assert_eq!(reply, r#"{"train": []}"#);
//!     assert_eq!(model.prompts().len(), 1);
//!     Ok(())
//! }
//! ```

mod delayed;
mod feeds;
mod oracle;
mod scripted;

// Re-export commute-core types for convenience
pub use commute_core::{async_trait, CommuteError, ModelClient};

pub use delayed::DelayedModel;
pub use feeds::{StaticBikeshare, StaticCalendar, StaticPlaces};
pub use oracle::FixedOracle;
pub use scripted::ScriptedModel;
