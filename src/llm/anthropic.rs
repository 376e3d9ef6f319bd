//! Anthropic Claude backend implementation.

use crate::config::{ApiKey, Generation};
use crate::error::ApiError;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const SERVICE: &str = "Anthropic API";

/// Anthropic backend for Claude API.
pub struct AnthropicBackend {
    pub model: String,
    api_key: ApiKey,
    base_url: String,
    generation: Generation,
    client: Client,
}

impl AnthropicBackend {
    /// Create a new Anthropic backend.
    pub fn new(
        model: String,
        api_key: ApiKey,
        base_url: Option<String>,
        generation: Generation,
        client: Client,
    ) -> Self {
        Self {
            model,
            api_key,
            base_url: base_url.unwrap_or_else(|| ANTHROPIC_API_URL.to_string()),
            generation,
            client,
        }
    }

    /// Generate a completion from a system prompt and a user prompt.
    pub async fn generate(&self, system: &str, prompt: &str) -> Result<String, ApiError> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));

        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: self.generation.max_tokens,
            system: system.to_string(),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.generation.temperature,
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::transport(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(super::status_error(SERVICE, response).await);
        }

        let anthropic_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ApiError::malformed(SERVICE, e))?;

        let text: Vec<String> = anthropic_response
            .content
            .into_iter()
            .filter(|c| c.content_type == "text")
            .filter_map(|c| c.text)
            .collect();

        if text.is_empty() {
            return Err(ApiError::Empty { service: SERVICE });
        }
        Ok(text.concat())
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<AnthropicMessage>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}
