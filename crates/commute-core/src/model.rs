//! The generative model trait.

use async_trait::async_trait;

use crate::error::CommuteError;

/// A generative model backend that turns a text prompt into text.
///
/// Implementations map their transport failures onto the shared taxonomy:
/// overload signals become [`CommuteError::UpstreamBusy`], a reply without
/// any text becomes [`CommuteError::MalformedResponse`], and everything else
/// becomes [`CommuteError::Transport`]. This trait is object-safe and can be
/// used as `Arc<dyn ModelClient>`.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send a single prompt with the given credential and return the raw text reply.
    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, CommuteError>;

    /// Get a human-readable name for this backend.
    fn name(&self) -> &str;

    /// Check if the backend is ready to take requests.
    ///
    /// Default implementation always returns true.
    async fn is_ready(&self) -> bool {
        true
    }
}
