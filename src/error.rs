//! Error types shared across the assistant.

use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key not found. Set {var} in your .env file or add api_key to the config file")]
    MissingApiKey { var: &'static str },

    #[error("Failed to read config file: {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Failure talking to one of the external HTTP APIs.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Failed to connect to {service}: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} request failed with status {status}: {message}")]
    Status {
        service: &'static str,
        status: StatusCode,
        message: String,
    },

    #[error("Failed to parse {service} response: {detail}")]
    Malformed {
        service: &'static str,
        detail: String,
    },

    #[error("Empty response from {service}")]
    Empty { service: &'static str },
}

impl ApiError {
    pub(crate) fn transport(service: &'static str, source: reqwest::Error) -> Self {
        ApiError::Transport { service, source }
    }

    pub(crate) fn malformed(service: &'static str, detail: impl ToString) -> Self {
        ApiError::Malformed {
            service,
            detail: detail.to_string(),
        }
    }
}

/// Errors surfaced by the prompt relay to the front-end.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("Could not retrieve sales data: {0}")]
    Sales(ApiError),

    #[error("LLM request failed: {0}")]
    Llm(ApiError),
}
