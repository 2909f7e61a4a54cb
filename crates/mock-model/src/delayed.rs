//! Delayed model implementation - wraps another model with artificial delay.

use std::time::Duration;

use commute_core::{async_trait, CommuteError, ModelClient};
use tokio::time::sleep;

/// A model that wraps another model and adds artificial delay.
///
/// The wrapped model answers as soon as the call arrives and the answer is
/// held back for the delay, so replies follow call order no matter which
/// sleeping call wakes first. Useful for testing superseded requests and
/// simulating model latency.
pub struct DelayedModel<M: ModelClient> {
    inner: M,
    delay: Duration,
}

impl<M: ModelClient> DelayedModel<M> {
    /// Create a new DelayedModel wrapping the given model with the specified delay.
    pub fn new(inner: M, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Create a model with a delay in milliseconds.
    pub fn with_millis(inner: M, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }

    /// Access the wrapped model.
    pub fn inner(&self) -> &M {
        &self.inner
    }
}

#[async_trait]
impl<M: ModelClient> ModelClient for DelayedModel<M> {
    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, CommuteError> {
        let reply = self.inner.generate(api_key, prompt).await;
        sleep(self.delay).await;
        reply
    }

    fn name(&self) -> &str {
        "DelayedModel"
    }

    async fn is_ready(&self) -> bool {
        self.inner.is_ready().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedModel;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_delayed_model() {
        let model = DelayedModel::with_millis(ScriptedModel::repeating("ok"), 100);

        let start = Instant::now();
        let reply = model.generate("key", "test").await.unwrap();

        assert_eq!(reply, "ok");
        assert!(start.elapsed() >= Duration::from_millis(100));
        assert_eq!(model.name(), "DelayedModel");
    }

    #[tokio::test(start_paused = true)]
    async fn test_replies_follow_call_order() {
        let model = DelayedModel::with_millis(ScriptedModel::new(["first", "second"]), 50);

        let (a, b) = tokio::join!(model.generate("key", "a"), model.generate("key", "b"));

        assert_eq!(a.unwrap(), "first");
        assert_eq!(b.unwrap(), "second");
        assert_eq!(model.inner().prompts(), vec!["a", "b"]);
    }
}
