//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
    pub genai: GenAiConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared secret: login password, HMAC key and raw proxy credential.
    ///
    /// Left unset, every gated request answers "Server misconfigured".
    #[serde(default)]
    pub proxy_key: Option<String>,
    /// Session lifetime in seconds (default: 86400 = 24h)
    pub session_max_age: i64,
}

impl AuthConfig {
    /// The shared secret, if one is provisioned
    ///
    /// Blank values count as unset.
    pub fn shared_secret(&self) -> Option<&str> {
        self.proxy_key
            .as_deref()
            .filter(|secret| !secret.trim().is_empty())
    }
}

/// Cross-origin configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Frontend origin (e.g., "https://app.example.com")
    #[serde(default)]
    pub frontend_url: Option<String>,
    /// Additional exact origins
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// Host suffixes accepted for any https origin (e.g., ".github.io")
    #[serde(default)]
    pub allowed_origin_suffixes: Vec<String>,
}

/// Generative-AI provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GenAiConfig {
    /// Provider API key
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model name (e.g., "gemini-3-pro-preview")
    pub model: String,
    /// API base URL, without trailing slash
    pub base_url: String,
    /// Upstream request timeout in seconds
    pub timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "json", anything else prints compact text
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (PUBLICNESS__*)
    /// 5. Deployment variables `PROXY_KEY`, `FRONTEND_URL`, `API_KEY`
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("auth.session_max_age", 86400)?
            .set_default("cors.allowed_origins", Vec::<String>::new())?
            .set_default("cors.allowed_origin_suffixes", vec![".github.io"])?
            .set_default("genai.model", "gemini-3-pro-preview")?
            .set_default(
                "genai.base_url",
                "https://generativelanguage.googleapis.com",
            )?
            .set_default("genai.timeout_seconds", 60)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "compact")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (PUBLICNESS__*)
            .add_source(
                Environment::with_prefix("PUBLICNESS")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .with_list_parse_key("cors.allowed_origin_suffixes")
                    .try_parsing(true),
            )
            .set_override_option("auth.proxy_key", non_empty_env("PROXY_KEY"))?
            .set_override_option("cors.frontend_url", non_empty_env("FRONTEND_URL"))?
            .set_override_option("genai.api_key", non_empty_env("API_KEY"))?
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        if self.auth.session_max_age <= 0 {
            return Err(crate::error::AppError::Config(
                "auth.session_max_age must be greater than 0".to_string(),
            ));
        }

        if self.genai.timeout_seconds == 0 {
            return Err(crate::error::AppError::Config(
                "genai.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if let Some(suffix) = self
            .cors
            .allowed_origin_suffixes
            .iter()
            .find(|suffix| !suffix.starts_with('.'))
        {
            return Err(crate::error::AppError::Config(format!(
                "cors.allowed_origin_suffixes entries must start with '.', got {suffix:?}"
            )));
        }

        Ok(())
    }

    /// Log keys whose absence makes endpoints answer 500
    ///
    /// Missing keys do not stop startup, so the server can still answer
    /// health checks and report its own misconfiguration.
    pub fn warn_missing_keys(&self) {
        if self.auth.shared_secret().is_none() {
            tracing::warn!("auth.proxy_key is not set; gated endpoints will report misconfiguration");
        }

        if self.genai.api_key.as_deref().is_none_or(str::is_empty) {
            tracing::warn!("genai.api_key is not set; analysis requests will fail");
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}
