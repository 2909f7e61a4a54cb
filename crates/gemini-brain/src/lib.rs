//! Gemini-based model client.
//!
//! This crate implements [`ModelClient`] over the Gemini `generateContent`
//! REST endpoint. The API key is supplied per call because it lives in the
//! user's settings rather than in process configuration.
//!
//! # Example
//!
//! ```rust,no_run
//! use gemini_brain::{GeminiClient, ModelClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GeminiClient::from_env()?;
//!     let reply = client.generate("my-api-key", "Say hello").await?;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```

mod api_types;
mod client;
mod config;

pub use client::{classify_failure, extract_text, GeminiClient};
pub use config::{GeminiConfig, GeminiConfigBuilder, DEFAULT_API_URL, DEFAULT_MODEL};

// Re-export commute-core types for convenience
pub use commute_core::{async_trait, CommuteError, ModelClient};
