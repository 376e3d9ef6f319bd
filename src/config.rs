//! Configuration management for sales-agent.
//!
//! Settings are loaded from `~/.config/sales-agent/config.toml` when present.
//! The API key is resolved from the config file or from the environment
//! (typically populated from a `.env` file at startup).

use crate::error::ConfigError;
use crate::relay::SalesIntent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// LLM backend configuration.
    #[serde(default)]
    pub backend: BackendConfig,
    /// Generation parameters shared by all backends.
    #[serde(default)]
    pub generation: Generation,
    /// Sales API settings.
    #[serde(default)]
    pub sales: SalesConfig,
    /// Outbound HTTP settings.
    #[serde(default)]
    pub http: HttpConfig,
}

/// Backend configuration for LLM providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Google Gemini API.
    Gemini {
        /// Model name (default: gemini-2.0-flash).
        #[serde(default = "default_gemini_model")]
        model: String,
        /// API key (prefer GEMINI_API_KEY env var).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
        /// Endpoint override, mostly useful for proxies.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },
    /// OpenAI API.
    OpenAI {
        /// Model name (default: gpt-4o-mini).
        #[serde(default = "default_openai_model")]
        model: String,
        /// API key (prefer OPENAI_API_KEY env var).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },
    /// Anthropic Claude API.
    Anthropic {
        /// Model name (default: claude-3-5-haiku-latest).
        #[serde(default = "default_anthropic_model")]
        model: String,
        /// API key (prefer ANTHROPIC_API_KEY env var).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Gemini {
            model: default_gemini_model(),
            api_key: None,
            base_url: None,
        }
    }
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

impl BackendConfig {
    /// Environment variable holding the API key for this backend.
    pub fn key_var(&self) -> &'static str {
        match self {
            BackendConfig::Gemini { .. } => "GEMINI_API_KEY",
            BackendConfig::OpenAI { .. } => "OPENAI_API_KEY",
            BackendConfig::Anthropic { .. } => "ANTHROPIC_API_KEY",
        }
    }

    fn configured_key(&self) -> Option<&str> {
        match self {
            BackendConfig::Gemini { api_key, .. }
            | BackendConfig::OpenAI { api_key, .. }
            | BackendConfig::Anthropic { api_key, .. } => api_key.as_deref(),
        }
    }

    /// Replace the model name, keeping every other setting.
    pub fn set_model(&mut self, name: String) {
        match self {
            BackendConfig::Gemini { model, .. }
            | BackendConfig::OpenAI { model, .. }
            | BackendConfig::Anthropic { model, .. } => *model = name,
        }
    }
}

/// Parameters applied to every completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for Generation {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_temperature() -> f64 {
    0.2
}

fn default_max_tokens() -> u32 {
    2048
}

/// Sales API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesConfig {
    /// Endpoint returning recent orders.
    #[serde(default = "default_sales_endpoint")]
    pub endpoint: String,
    /// How long a fetched payload is reused. Zero disables caching.
    #[serde(default = "default_cache_seconds")]
    pub cache_seconds: u64,
    /// When the relay should consult the Sales API.
    #[serde(default)]
    pub intent: SalesIntent,
}

impl Default for SalesConfig {
    fn default() -> Self {
        Self {
            endpoint: default_sales_endpoint(),
            cache_seconds: default_cache_seconds(),
            intent: SalesIntent::default(),
        }
    }
}

impl SalesConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_seconds)
    }
}

fn default_sales_endpoint() -> String {
    "https://sandbox.mkonnekt.net/ch-portal/api/v1/orders/recent".to_string()
}

fn default_cache_seconds() -> u64 {
    300
}

/// Outbound HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Upper bound for each outbound request.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// A resolved, non-empty API key. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

impl Config {
    /// Get the config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join("sales-agent"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Get the default config file path.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from `path`, or from the default location when
    /// `path` is `None`. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Write the configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Resolve the API key from the config file or the environment.
    ///
    /// `env` looks up a variable by name; startup passes `std::env::var`.
    pub fn api_key<F>(&self, env: F) -> Result<ApiKey, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = self.backend.key_var();
        self.backend
            .configured_key()
            .map(str::to_string)
            .or_else(|| env(var))
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(ApiKey)
            .ok_or(ConfigError::MissingApiKey { var })
    }

    /// Get the backend type as a string.
    pub fn backend_type(&self) -> &'static str {
        match &self.backend {
            BackendConfig::Gemini { .. } => "gemini",
            BackendConfig::OpenAI { .. } => "openai",
            BackendConfig::Anthropic { .. } => "anthropic",
        }
    }

    /// Get the model name.
    pub fn model_name(&self) -> &str {
        match &self.backend {
            BackendConfig::Gemini { model, .. }
            | BackendConfig::OpenAI { model, .. }
            | BackendConfig::Anthropic { model, .. } => model,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(matches!(config.backend, BackendConfig::Gemini { .. }));
        assert_eq!(config.model_name(), "gemini-2.0-flash");
        assert_eq!(config.sales.cache_seconds, 300);
        assert_eq!(config.sales.intent, SalesIntent::Auto);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("gemini"));
        assert!(!toml.contains("api_key"));
        assert!(toml.contains("temperature = 0.2\n"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml = r#"
[backend]
type = "openai"
model = "gpt-4o"

[sales]
intent = "always"
cache_seconds = 0
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(config.backend, BackendConfig::OpenAI { .. }));
        assert_eq!(config.model_name(), "gpt-4o");
        assert_eq!(config.sales.intent, SalesIntent::Always);
        assert_eq!(config.sales.cache_ttl(), Duration::ZERO);
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn test_missing_api_key_fails() {
        let config = Config::default();
        let err = config.api_key(no_env).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingApiKey {
                var: "GEMINI_API_KEY"
            }
        ));
    }

    #[test]
    fn test_blank_api_key_fails() {
        let config = Config::default();
        let err = config.api_key(|_| Some("   ".to_string())).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey { .. }));
    }

    #[test]
    fn test_api_key_from_env() {
        let config = Config::default();
        let key = config
            .api_key(|var| (var == "GEMINI_API_KEY").then(|| "secret\n".to_string()))
            .unwrap();
        assert_eq!(key.expose(), "secret");
        assert_eq!(format!("{:?}", key), "ApiKey(****)");
    }

    #[test]
    fn test_config_key_takes_precedence() {
        let config: Config = toml::from_str(
            r#"
[backend]
type = "anthropic"
api_key = "from-file"
"#,
        )
        .unwrap();
        let key = config.api_key(|_| Some("from-env".to_string())).unwrap();
        assert_eq!(key.expose(), "from-file");
        assert_eq!(config.backend.key_var(), "ANTHROPIC_API_KEY");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.backend_type(), "gemini");
    }

    #[test]
    fn test_load_invalid_file_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[backend\ntype = ").unwrap();
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let mut config = Config::default();
        config.backend.set_model("gemini-2.5-flash".to_string());
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.model_name(), "gemini-2.5-flash");
    }
}
