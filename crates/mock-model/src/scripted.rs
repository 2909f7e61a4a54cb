//! Scripted model implementation - replies from a queue.

use std::collections::VecDeque;
use std::sync::Mutex;

use commute_core::{async_trait, CommuteError, ModelClient};

/// A model that answers with pre-scripted replies, in order.
///
/// Once the queue is drained it answers with the repeating reply, if one was
/// set, or a `MalformedResponse` otherwise. Every prompt is recorded.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, CommuteError>>>,
    fallback: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    /// Create a model with the given replies.
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            ..Self::default()
        }
    }

    /// Create a model that always answers with the same reply.
    pub fn repeating(reply: impl Into<String>) -> Self {
        Self {
            fallback: Some(reply.into()),
            ..Self::default()
        }
    }

    /// Queue a text reply.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.lock_replies().push_back(Ok(reply.into()));
    }

    /// Queue a failure.
    pub fn push_error(&self, error: CommuteError) {
        self.lock_replies().push_back(Err(error));
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Most recent prompt.
    pub fn last_prompt(&self) -> Option<String> {
        self.prompts().pop()
    }

    /// Number of calls so far.
    pub fn calls(&self) -> usize {
        self.prompts().len()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, CommuteError>>> {
        match self.replies.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn generate(&self, _api_key: &str, prompt: &str) -> Result<String, CommuteError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let next = self.lock_replies().pop_front();
        match next {
            Some(reply) => reply,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| CommuteError::MalformedResponse("no scripted reply".to_string())),
        }
    }

    fn name(&self) -> &str {
        "ScriptedModel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order_then_fallback() {
        let model = ScriptedModel::new(["one", "two"]);
        assert_eq!(model.generate("k", "a").await.unwrap(), "one");
        assert_eq!(model.generate("k", "b").await.unwrap(), "two");
        assert!(matches!(
            model.generate("k", "c").await,
            Err(CommuteError::MalformedResponse(_))
        ));
        assert_eq!(model.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_queued_error() {
        let model = ScriptedModel::repeating("fine");
        model.push_error(CommuteError::UpstreamBusy("503".to_string()));

        assert!(matches!(
            model.generate("k", "p").await,
            Err(CommuteError::UpstreamBusy(_))
        ));
        assert_eq!(model.generate("k", "p").await.unwrap(), "fine");
        assert_eq!(model.calls(), 2);
        assert_eq!(model.last_prompt().as_deref(), Some("p"));
    }
}
