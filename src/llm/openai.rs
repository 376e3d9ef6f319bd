//! OpenAI backend implementation.
//!
//! Uses the chat completions API with GPT models.

use crate::config::{ApiKey, Generation};
use crate::error::ApiError;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const OPENAI_API_URL: &str = "https://api.openai.com";
const SERVICE: &str = "OpenAI API";

/// OpenAI backend for GPT API.
pub struct OpenAIBackend {
    pub model: String,
    api_key: ApiKey,
    base_url: String,
    generation: Generation,
    client: Client,
}

impl OpenAIBackend {
    /// Create a new OpenAI backend.
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
            base_url: base_url.unwrap_or_else(|| OPENAI_API_URL.to_string()),
            generation,
            client,
        }
    }

    /// Generate a completion from a system prompt and a user prompt.
    pub async fn generate(&self, system: &str, prompt: &str) -> Result<String, ApiError> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));

        let request = OpenAIRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAIMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                OpenAIMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            max_tokens: self.generation.max_tokens,
            temperature: self.generation.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::transport(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(super::status_error(SERVICE, response).await);
        }

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| ApiError::malformed(SERVICE, e))?;

        openai_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ApiError::Empty { service: SERVICE })
    }
}

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessageResponse,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> OpenAIBackend {
        let key = Config::default()
            .api_key(|_| Some("sk-test".to_string()))
            .unwrap();
        OpenAIBackend::new(
            "gpt-4o-mini".to_string(),
            key,
            Some(server.uri()),
            Generation::default(),
            Client::new(),
        )
    }

    #[tokio::test]
    async fn test_generate_sends_system_and_user_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "temperature": 0.2,
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "question"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "answer\n"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = backend(&server).generate("sys", "question").await.unwrap();
        assert_eq!(text, "answer\n");
    }

    #[tokio::test]
    async fn test_generate_reports_plain_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = backend(&server).generate("sys", "q").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "OpenAI API request failed with status 502 Bad Gateway: bad gateway"
        );
    }
}
