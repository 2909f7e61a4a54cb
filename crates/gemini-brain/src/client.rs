//! GeminiClient implementation.

use commute_core::{async_trait, hash_prompt, CommuteError, ModelClient};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api_types::{ApiError, GenerateRequest, GenerateResponse};
use crate::config::GeminiConfig;

/// A model client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a new GeminiClient with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self, CommuteError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                CommuteError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        info!("GeminiClient initialized with model: {}", config.model);

        Ok(Self { client, config })
    }

    /// Create a GeminiClient from environment variables.
    ///
    /// See [`GeminiConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self, CommuteError> {
        Self::new(GeminiConfig::from_env())
    }

    /// Get the configuration.
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

/// Classify a failed call from its HTTP status and response body.
///
/// Overload signals (HTTP 503, status `UNAVAILABLE`, or a message mentioning
/// "overloaded") map to [`CommuteError::UpstreamBusy`]; everything else to
/// [`CommuteError::Transport`].
pub fn classify_failure(http_status: Option<u16>, body: &str) -> CommuteError {
    let envelope = serde_json::from_str::<ApiError>(body).ok().map(|e| e.error);

    let code = envelope.as_ref().and_then(|e| e.code).or(http_status);
    let status = envelope.as_ref().and_then(|e| e.status.clone());
    let message = match &envelope {
        Some(detail) if !detail.message.is_empty() => detail.message.clone(),
        _ => body.trim().to_string(),
    };

    let busy = code == Some(503)
        || http_status == Some(503)
        || status.as_deref() == Some("UNAVAILABLE")
        || message.to_lowercase().contains("overloaded");

    let summary = match code {
        Some(code) => format!("API error ({}): {}", code, message),
        None => format!("API error: {}", message),
    };

    if busy {
        CommuteError::UpstreamBusy(summary)
    } else {
        CommuteError::Transport(summary)
    }
}

/// Pull the reply text out of a success body.
pub fn extract_text(body: &str) -> Result<String, CommuteError> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| CommuteError::MalformedResponse(format!("Failed to parse response: {}", e)))?;

    parsed
        .first_text()
        .map(str::to_string)
        .ok_or_else(|| CommuteError::MalformedResponse("response contained no text".to_string()))
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, CommuteError> {
        if api_key.trim().is_empty() {
            return Err(CommuteError::Configuration("API key not set".to_string()));
        }

        let url = format!(
            "{}?key={}",
            self.config.endpoint(),
            urlencoding::encode(api_key.trim())
        );
        let request = GenerateRequest::prompt(prompt, self.config.temperature);

        debug!(
            "Sending prompt to {} (fingerprint: {})",
            self.config.model,
            hash_prompt(prompt)
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| CommuteError::Transport(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CommuteError::Transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            let err = classify_failure(Some(status.as_u16()), &body);
            warn!("Gemini request failed: {}", err);
            return Err(err);
        }

        // Some proxies answer 200 with an error envelope.
        if serde_json::from_str::<ApiError>(&body).is_ok() {
            let err = classify_failure(None, &body);
            warn!("Gemini request failed: {}", err);
            return Err(err);
        }

        let text = extract_text(&body)?;
        debug!("Received {} chars from {}", text.len(), self.config.model);
        Ok(text)
    }

    fn name(&self) -> &str {
        "GeminiClient"
    }

    async fn is_ready(&self) -> bool {
        !self.config.model.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_503_is_busy() {
        let err = classify_failure(Some(503), "Service Unavailable");
        assert!(matches!(err, CommuteError::UpstreamBusy(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classify_envelope_status_and_message() {
        let unavailable = r#"{"error":{"code":429,"status":"UNAVAILABLE","message":"try later"}}"#;
        assert!(matches!(
            classify_failure(Some(429), unavailable),
            CommuteError::UpstreamBusy(_)
        ));

        let overloaded = r#"{"error":{"code":500,"status":"INTERNAL","message":"The model is overloaded."}}"#;
        assert!(matches!(
            classify_failure(Some(500), overloaded),
            CommuteError::UpstreamBusy(_)
        ));

        let bad_key = r#"{"error":{"code":400,"status":"INVALID_ARGUMENT","message":"API key not valid"}}"#;
        match classify_failure(Some(400), bad_key) {
            CommuteError::Transport(msg) => assert!(msg.contains("API key not valid")),
            other => panic!("Expected Transport error, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_envelope_code_without_http_status() {
        let body = r#"{"error":{"code":503,"message":"busy"}}"#;
        assert!(matches!(classify_failure(None, body), CommuteError::UpstreamBusy(_)));
    }

    #[test]
    fn test_extract_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"train\":[]}"}]}}]}"#;
        assert_eq!(extract_text(body).unwrap(), "{\"train\":[]}");
    }

    #[test]
    fn test_extract_text_missing_is_malformed() {
        assert!(matches!(
            extract_text(r#"{"candidates":[]}"#),
            Err(CommuteError::MalformedResponse(_))
        ));
        assert!(matches!(
            extract_text(r#"{"candidates":[{"content":{"parts":[{}]}}]}"#),
            Err(CommuteError::MalformedResponse(_))
        ));
        assert!(matches!(
            extract_text("<html>"),
            Err(CommuteError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(GenerateRequest::prompt("hi", None)).unwrap();
        assert_eq!(body, serde_json::json!({"contents": [{"parts": [{"text": "hi"}]}]}));

        let body = serde_json::to_value(GenerateRequest::prompt("hi", Some(0.5))).unwrap();
        assert_eq!(body["generationConfig"]["temperature"], 0.5);
    }

    #[tokio::test]
    async fn test_missing_key_is_configuration_error() {
        let client = GeminiClient::new(GeminiConfig::default()).unwrap();
        let result = client.generate("  ", "prompt").await;
        assert!(matches!(result, Err(CommuteError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport() {
        let config = GeminiConfig::builder()
            .api_url("http://127.0.0.1:9")
            .timeout(std::time::Duration::from_secs(2))
            .build();
        let client = GeminiClient::new(config).unwrap();
        let result = client.generate("key", "prompt").await;
        assert!(matches!(result, Err(CommuteError::Transport(_))));
    }

    // Integration test that requires network access and GEMINI_API_KEY
    #[tokio::test]
    #[ignore] // Run with: cargo test -- --ignored
    async fn test_live_generate() {
        dotenvy::dotenv().ok();
        let config = GeminiConfig::from_env();
        let key = config.api_key.clone().expect("GEMINI_API_KEY not set");
        let client = GeminiClient::new(config).unwrap();
        let text = client
            .generate(&key, r#"Reply with exactly {"ok": true}"#)
            .await
            .unwrap();
        assert!(text.contains("ok"));
    }
}
