//! Azure OpenAI adapter
//!
//! Posts chat completion bodies to
//! `{endpoint}/openai/deployments/{deployment}/chat/completions` with the
//! `api-key` header. The deployment is the request's `model`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::config::settings::DEFAULT_AZURE_API_VERSION;
use crate::config::Settings;
use crate::error::{ProviderApiError, ProviderErrorKind};
use crate::schemas::openai::{ChatCompletionRequest, ChatCompletionResponse, OpenAIErrorResponse};
use crate::schemas::router::Provider;
use crate::services::adapter::ProviderAdapter;

/// Azure OpenAI connection settings
#[derive(Debug, Clone)]
pub struct AzureOpenAIConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub api_version: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl AzureOpenAIConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            endpoint: settings.azure_endpoint.clone(),
            api_key: settings.azure_api_key.clone(),
            api_version: settings.azure_api_version.clone(),
            timeout: Duration::from_secs(settings.azure_timeout_secs),
            connect_timeout: Duration::from_secs(settings.connect_timeout_secs),
        }
    }
}

impl Default for AzureOpenAIConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Azure OpenAI chat completions adapter.
#[derive(Debug, Clone)]
pub struct AzureOpenAIService {
    client: Client,
    config: AzureOpenAIConfig,
}

impl AzureOpenAIService {
    /// Build the HTTP client. Missing endpoint or key is not an error here;
    /// calls fail with a configuration error instead.
    pub fn new(config: AzureOpenAIConfig) -> Result<Self, ProviderApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| {
                ProviderApiError::configuration(
                    Provider::Azure,
                    format!("Failed to build HTTP client: {}", e),
                )
            })?;

        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.endpoint.is_some() && self.config.api_key.is_some()
    }

    fn completions_url(&self, deployment: &str) -> Result<String, ProviderApiError> {
        let endpoint = self.config.endpoint.as_deref().ok_or_else(|| {
            ProviderApiError::configuration(
                Provider::Azure,
                "Azure OpenAI endpoint is not configured (set AZURE_OPENAI_ENDPOINT)",
            )
        })?;

        Ok(format!(
            "{}/openai/deployments/{}/chat/completions",
            endpoint.trim_end_matches('/'),
            deployment
        ))
    }

    fn api_key(&self) -> Result<&str, ProviderApiError> {
        self.config.api_key.as_deref().ok_or_else(|| {
            ProviderApiError::new(
                Provider::Azure,
                ProviderErrorKind::Authentication,
                "Azure OpenAI API key is not configured (set AZURE_OPENAI_API_KEY)",
            )
        })
    }
}

#[async_trait]
impl ProviderAdapter for AzureOpenAIService {
    type Request = ChatCompletionRequest;
    type Response = ChatCompletionResponse;

    fn provider(&self) -> Provider {
        Provider::Azure
    }

    async fn call(&self, request: ChatCompletionRequest) -> Result<ChatCompletionResponse, ProviderApiError> {
        let url = self.completions_url(&request.model)?;
        let api_key = self.api_key()?;

        tracing::debug!(
            deployment = %request.model,
            url = %url,
            message_count = request.messages.len(),
            "Calling Azure OpenAI chat completions API"
        );

        let resp = self
            .client
            .post(&url)
            .query(&[("api-version", self.config.api_version.as_str())])
            .header("api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        let body = resp.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let message = serde_json::from_str::<OpenAIErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            let kind = kind_for_status(status);

            tracing::warn!(status = status.as_u16(), kind = %kind, error = %message, "Azure OpenAI call failed");
            return Err(ProviderApiError::new(
                Provider::Azure,
                kind,
                format!("HTTP {}: {}", status.as_u16(), message),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, body = %body, "Failed to parse Azure OpenAI response");
            ProviderApiError::malformed(Provider::Azure, format!("Invalid response body: {}", e))
        })
    }
}

fn kind_for_status(status: StatusCode) -> ProviderErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderErrorKind::Authentication,
        StatusCode::TOO_MANY_REQUESTS => ProviderErrorKind::Throttled,
        StatusCode::NOT_FOUND => ProviderErrorKind::ModelNotFound,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ProviderErrorKind::Timeout,
        s if s.is_server_error() => ProviderErrorKind::ServiceUnavailable,
        s if s.is_client_error() => ProviderErrorKind::InvalidRequest,
        _ => ProviderErrorKind::Unknown,
    }
}

fn transport_error(err: reqwest::Error) -> ProviderApiError {
    let kind = if err.is_timeout() {
        ProviderErrorKind::Timeout
    } else if err.is_decode() {
        ProviderErrorKind::MalformedResponse
    } else {
        ProviderErrorKind::Transport
    };
    ProviderApiError::new(Provider::Azure, kind, err.to_string())
}
