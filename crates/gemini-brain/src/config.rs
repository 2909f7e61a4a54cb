//! Configuration for GeminiClient.

use std::env;
use std::time::Duration;

/// Default API host.
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Default API version path segment.
pub const DEFAULT_API_VERSION: &str = "v1";

/// Default model name.
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

/// Configuration for GeminiClient.
///
/// The credential normally lives in the user's settings and is passed per
/// call; `api_key` here is only a fallback seeded into empty settings.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API host URL.
    pub api_url: String,

    /// API version path segment (e.g. `v1`, `v1beta`).
    pub api_version: String,

    /// Model name to use.
    pub model: String,

    /// Temperature for generation; the service default when unset.
    pub temperature: Option<f32>,

    /// Request timeout.
    pub timeout: Duration,

    /// Fallback API key.
    pub api_key: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            timeout: Duration::from_secs(120),
            api_key: None,
        }
    }
}

impl GeminiConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `GEMINI_API_URL` - API URL (default: https://generativelanguage.googleapis.com)
    /// - `GEMINI_API_VERSION` - API version (default: v1)
    /// - `GEMINI_MODEL` - Model name (default: gemini-2.5-pro)
    /// - `GEMINI_TEMPERATURE` - Temperature (default: unset)
    /// - `GEMINI_TIMEOUT_SECS` - Request timeout in seconds (default: 120)
    /// - `GEMINI_API_KEY` - Fallback API key when settings have none
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_url = env::var("GEMINI_API_URL").unwrap_or(defaults.api_url);

        let api_version = env::var("GEMINI_API_VERSION").unwrap_or(defaults.api_version);

        let model = env::var("GEMINI_MODEL").unwrap_or(defaults.model);

        let temperature = env::var("GEMINI_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok());

        let timeout = env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        let api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty());

        Self {
            api_url,
            api_version,
            model,
            temperature,
            timeout,
            api_key,
        }
    }

    /// Create a new config builder.
    pub fn builder() -> GeminiConfigBuilder {
        GeminiConfigBuilder::default()
    }

    /// Full generateContent endpoint, without the key parameter.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.api_version.trim_matches('/'),
            self.model
        )
    }
}

/// Builder for GeminiConfig.
#[derive(Debug, Default)]
pub struct GeminiConfigBuilder {
    config: GeminiConfig,
}

impl GeminiConfigBuilder {
    /// Set the API URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the API version.
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.config.api_version = version.into();
        self
    }

    /// Set the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the temperature.
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = Some(temp);
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the fallback API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> GeminiConfig {
        self.config
    }
}
