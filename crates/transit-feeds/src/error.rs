//! Error types for feed operations.

use commute_core::CommuteError;
use thiserror::Error;

/// Errors that can occur while fetching a public feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The feed answered with a non-success status.
    #[error("{feed} returned status {status}")]
    Status { feed: &'static str, status: u16 },

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<FeedError> for CommuteError {
    fn from(err: FeedError) -> Self {
        CommuteError::NetworkUnavailable(err.to_string())
    }
}
