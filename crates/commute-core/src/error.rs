//! Error types shared across the commute planner.

use thiserror::Error;

/// Errors that can surface from the planning core.
///
/// Unparseable persisted values are repaired to defaults where they are read
/// and never show up here.
#[derive(Debug, Error)]
pub enum CommuteError {
    /// A fetch-level failure against one of the public feeds.
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The model answered but no JSON body could be extracted from it.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The model service reported it is overloaded or unavailable.
    #[error("upstream busy: {0}")]
    UpstreamBusy(String),

    /// Any other failure talking to the model endpoint.
    #[error("transport error: {0}")]
    Transport(String),

    /// The model rejected a place or station lookup, with its reason.
    #[error("validation failed: {0}")]
    ValidationFailure(String),

    /// Reading or writing the key-value store failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Something required is not configured (for example the API key).
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl CommuteError {
    /// Whether the caller may reasonably retry after a short backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CommuteError::UpstreamBusy(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_upstream_busy_is_retryable() {
        assert!(CommuteError::UpstreamBusy("503".into()).is_retryable());
        assert!(!CommuteError::Transport("400".into()).is_retryable());
        assert!(!CommuteError::MalformedResponse("no json".into()).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = CommuteError::ValidationFailure("station not found".into());
        assert_eq!(err.to_string(), "validation failed: station not found");
    }
}
