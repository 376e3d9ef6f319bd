//! LLM backend implementations.
//!
//! This module provides a unified completion interface over the hosted
//! providers (Gemini, OpenAI, Anthropic). Exactly one backend is active per
//! process, selected by configuration.

pub mod anthropic;
pub mod gemini;
pub mod openai;

use crate::config::{ApiKey, BackendConfig, Config};
use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;

/// Something that turns a system instruction and a prompt into text.
#[async_trait]
pub trait Completion: Send + Sync {
    /// Generate a completion. The returned text is passed on verbatim.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ApiError>;
}

/// Enum-based backend for LLM providers.
pub enum Backend {
    Gemini(gemini::GeminiBackend),
    OpenAI(openai::OpenAIBackend),
    Anthropic(anthropic::AnthropicBackend),
}

impl Backend {
    /// Get the backend name.
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Gemini(_) => "gemini",
            Backend::OpenAI(_) => "openai",
            Backend::Anthropic(_) => "anthropic",
        }
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        match self {
            Backend::Gemini(b) => &b.model,
            Backend::OpenAI(b) => &b.model,
            Backend::Anthropic(b) => &b.model,
        }
    }
}

#[async_trait]
impl Completion for Backend {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ApiError> {
        match self {
            Backend::Gemini(b) => b.generate(system, prompt).await,
            Backend::OpenAI(b) => b.generate(system, prompt).await,
            Backend::Anthropic(b) => b.generate(system, prompt).await,
        }
    }
}

/// Create a backend from configuration and an already resolved key.
pub fn create_backend(config: &Config, api_key: ApiKey, client: Client) -> Backend {
    let generation = config.generation.clone();
    match &config.backend {
        BackendConfig::Gemini {
            model, base_url, ..
        } => Backend::Gemini(gemini::GeminiBackend::new(
            model.clone(),
            api_key,
            base_url.clone(),
            generation,
            client,
        )),
        BackendConfig::OpenAI {
            model, base_url, ..
        } => Backend::OpenAI(openai::OpenAIBackend::new(
            model.clone(),
            api_key,
            base_url.clone(),
            generation,
            client,
        )),
        BackendConfig::Anthropic {
            model, base_url, ..
        } => Backend::Anthropic(anthropic::AnthropicBackend::new(
            model.clone(),
            api_key,
            base_url.clone(),
            generation,
            client,
        )),
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Turn a non-success response into an error, keeping the vendor's message
/// when the body has the usual `{"error": {"message": ...}}` shape.
pub(crate) async fn status_error(service: &'static str, response: Response) -> ApiError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => "Unknown error".to_string(),
        Err(_) => body.trim().to_string(),
    };
    ApiError::Status {
        service,
        status,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ApiKey {
        Config::default()
            .api_key(|_| Some("test-key".to_string()))
            .unwrap()
    }

    #[test]
    fn test_create_backend_follows_config() {
        let mut config: Config = toml::from_str("[backend]\ntype = \"openai\"").unwrap();
        config.backend.set_model("gpt-4o".to_string());
        let backend = create_backend(&config, key(), Client::new());
        assert_eq!(backend.name(), "openai");
        assert_eq!(backend.model(), "gpt-4o");
    }

    #[test]
    fn test_default_backend_is_gemini() {
        let backend = create_backend(&Config::default(), key(), Client::new());
        assert_eq!(backend.name(), "gemini");
        assert_eq!(backend.model(), "gemini-2.0-flash");
    }
}
