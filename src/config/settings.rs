//! Application settings and configuration
//!
//! Settings are read from environment variables (and an optional `.env`
//! file) with defaults that work for local development.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fmt;

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    #[value(alias = "dev")]
    Development,
    #[value(alias = "stage")]
    Staging,
    #[value(alias = "prod")]
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => anyhow::bail!(
                "Invalid environment: {}. Expected: development, staging, or production",
                s
            ),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            _ => anyhow::bail!("Invalid log format: {}. Expected: json or pretty", s),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    // App settings
    pub app_name: String,
    pub app_version: String,
    pub environment: Environment,
    pub log_level: String,
    pub log_format: LogFormat,

    // Server settings
    pub host: String,
    pub port: u16,

    // AWS settings; credentials come from the SDK default chain
    pub aws_region: String,
    pub bedrock_endpoint_url: Option<String>,

    // Azure OpenAI settings
    pub azure_endpoint: Option<String>,
    #[serde(skip_serializing)]
    pub azure_api_key: Option<String>,
    pub azure_api_version: String,

    // Fallback policy
    pub fallback_enabled: bool,
    pub fallback_model: String,
    pub fallback_on_unknown_model: bool,

    // Request defaults
    pub default_max_tokens: i32,

    // Timeouts
    pub bedrock_timeout_secs: u64,
    pub azure_timeout_secs: u64,
    pub connect_timeout_secs: u64,

    /// Router alias -> concrete Bedrock model id
    pub bedrock_model_ids: HashMap<String, String>,
}

impl Settings {
    /// Load settings from environment variables with defaults
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = Self {
            app_name: env_or_default("APP_NAME", "model-router"),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: env_or_default("ENVIRONMENT", "development")
                .parse()
                .unwrap_or_default(),
            log_level: env_or_default("LOG_LEVEL", "info"),
            log_format: env_or_default("LOG_FORMAT", "json")
                .parse()
                .unwrap_or_default(),

            host: env_or_default("HOST", "0.0.0.0"),
            port: env_or_default("PORT", "8000")
                .parse()
                .context("Invalid PORT value")?,

            aws_region: env_or_default("AWS_REGION", "us-east-1"),
            bedrock_endpoint_url: env::var("BEDROCK_ENDPOINT_URL").ok(),

            azure_endpoint: env::var("AZURE_OPENAI_ENDPOINT")
                .or_else(|_| env::var("ENDPOINT_URL"))
                .ok(),
            azure_api_key: env::var("AZURE_OPENAI_API_KEY").ok(),
            azure_api_version: env_or_default("AZURE_OPENAI_API_VERSION", DEFAULT_AZURE_API_VERSION),

            fallback_enabled: env_or_default("ROUTER_FALLBACK_ENABLED", "true")
                .parse()
                .unwrap_or(true),
            fallback_model: env_or_default("ROUTER_FALLBACK_MODEL", DEFAULT_FALLBACK_MODEL),
            fallback_on_unknown_model: env_or_default("ROUTER_FALLBACK_ON_UNKNOWN_MODEL", "false")
                .parse()
                .unwrap_or(false),

            default_max_tokens: env_or_default("ROUTER_DEFAULT_MAX_TOKENS", "4096")
                .parse()
                .context("Invalid ROUTER_DEFAULT_MAX_TOKENS value")?,

            bedrock_timeout_secs: env_or_default("BEDROCK_TIMEOUT_SECS", "120")
                .parse()
                .context("Invalid BEDROCK_TIMEOUT_SECS value")?,
            azure_timeout_secs: env_or_default("AZURE_TIMEOUT_SECS", "120")
                .parse()
                .context("Invalid AZURE_TIMEOUT_SECS value")?,
            connect_timeout_secs: env_or_default("CONNECT_TIMEOUT_SECS", "10")
                .parse()
                .context("Invalid CONNECT_TIMEOUT_SECS value")?,

            bedrock_model_ids: Self::load_bedrock_model_ids(
                env::var("BEDROCK_MODEL_OVERRIDES").ok().as_deref(),
            )?,
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("Port cannot be 0");
        }

        if self.default_max_tokens <= 0 {
            anyhow::bail!("ROUTER_DEFAULT_MAX_TOKENS must be > 0");
        }

        if self.bedrock_timeout_secs == 0 || self.azure_timeout_secs == 0 {
            anyhow::bail!("Provider timeouts must be > 0");
        }

        if self.fallback_enabled && self.fallback_model.trim().is_empty() {
            anyhow::bail!("ROUTER_FALLBACK_MODEL must not be empty while fallback is enabled");
        }

        // Azure is optional; requests to it fail at call time without these
        if self.azure_endpoint.is_none() || self.azure_api_key.is_none() {
            tracing::warn!("Azure OpenAI endpoint or API key not set; Azure models will be unavailable");
        }

        Ok(())
    }

    /// Default alias -> Bedrock model id table, with optional
    /// `alias=model_id` overrides separated by commas.
    fn load_bedrock_model_ids(overrides: Option<&str>) -> Result<HashMap<String, String>> {
        let mut ids: HashMap<String, String> = DEFAULT_BEDROCK_MODEL_IDS
            .iter()
            .map(|(alias, id)| (alias.to_string(), id.to_string()))
            .collect();

        for pair in overrides.unwrap_or_default().split(',').map(str::trim) {
            if pair.is_empty() {
                continue;
            }
            let (alias, id) = pair
                .split_once('=')
                .with_context(|| format!("Invalid BEDROCK_MODEL_OVERRIDES entry: {}", pair))?;
            ids.insert(alias.trim().to_string(), id.trim().to_string());
        }

        Ok(ids)
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Get the server address string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "model-router".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Environment::Development,
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            host: "0.0.0.0".to_string(),
            port: 8000,
            aws_region: "us-east-1".to_string(),
            bedrock_endpoint_url: None,
            azure_endpoint: None,
            azure_api_key: None,
            azure_api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            fallback_enabled: true,
            fallback_model: DEFAULT_FALLBACK_MODEL.to_string(),
            fallback_on_unknown_model: false,
            default_max_tokens: 4096,
            bedrock_timeout_secs: 120,
            azure_timeout_secs: 120,
            connect_timeout_secs: 10,
            bedrock_model_ids: DEFAULT_BEDROCK_MODEL_IDS
                .iter()
                .map(|(alias, id)| (alias.to_string(), id.to_string()))
                .collect(),
        }
    }
}

pub const DEFAULT_FALLBACK_MODEL: &str = "mistral-small";
pub const DEFAULT_AZURE_API_VERSION: &str = "2025-01-01-preview";

/// Router aliases and retired model ids mapped onto current Bedrock models
/// (cross-region inference profiles where Bedrock requires them).
const DEFAULT_BEDROCK_MODEL_IDS: &[(&str, &str)] = &[
    ("llama-3-2-3b", "us.meta.llama3-2-3b-instruct-v1:0"),
    ("llama-3-3-70b", "us.meta.llama3-3-70b-instruct-v1:0"),
    ("llama-3-1-70b", "us.meta.llama3-1-70b-instruct-v1:0"),
    ("mixtral-8x7b", "mistral.mixtral-8x7b-instruct-v0:1"),
    ("amazon-premier", "amazon.titan-text-premier-v1:0"),
    ("mistral-large", "mistral.mistral-large-2402-v1:0"),
    ("mistral-small", "mistral.mistral-small-2402-v1:0"),
    ("anthropic-sonnet", "us.anthropic.claude-3-5-sonnet-20241022-v2:0"),
    ("anthropic-haiku", "us.anthropic.claude-3-5-haiku-20241022-v1:0"),
    ("deepseek", "us.deepseek.r1-v1:0"),
    // Retired ids
    ("anthropic.claude-3-sonnet-20240229-v1:0", "us.anthropic.claude-3-5-sonnet-20241022-v2:0"),
    ("anthropic.claude-3-haiku-20240307-v1:0", "us.anthropic.claude-3-5-haiku-20241022-v1:0"),
    ("anthropic.claude-3-opus-20240229-v1:0", "us.anthropic.claude-3-5-sonnet-20241022-v2:0"),
    ("amazon.titan-text-express-v1", "amazon.titan-text-premier-v1:0"),
    ("amazon.titan-text-lite-v1", "amazon.titan-text-premier-v1:0"),
    ("meta.llama2-13b-chat-v1", "us.meta.llama3-2-3b-instruct-v1:0"),
    ("meta.llama2-70b-chat-v1", "us.meta.llama3-3-70b-instruct-v1:0"),
    ("meta.llama3-8b-instruct-v1:0", "us.meta.llama3-2-3b-instruct-v1:0"),
    ("meta.llama3-70b-instruct-v1:0", "us.meta.llama3-3-70b-instruct-v1:0"),
    ("mistral.mistral-7b-instruct-v0:2", "mistral.mistral-small-2402-v1:0"),
];

/// Helper function to get environment variable with default
fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
