//! Model router
//!
//! Resolves the provider for a request, builds the provider body, calls the
//! adapter and normalizes the response. A failed or empty primary attempt is
//! retried once against the fallback model; there is no further retry.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::config::{Settings, DEFAULT_FALLBACK_MODEL};
use crate::converters::{response, RequestNormalizer};
use crate::error::{AttemptFailure, ProviderApiError, RouterError};
use crate::schemas::router::{FallbackInfo, ModelRequest, ModelResponse, Provider};
use crate::services::adapter::{
    ChatCompletionAdapter, ConverseAdapter, ProviderRequest, RawProviderResponse,
};
use crate::services::azure::{AzureOpenAIConfig, AzureOpenAIService};
use crate::services::bedrock::BedrockService;
use crate::services::registry::ProviderRegistry;

/// When and where to fall back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPolicy {
    pub enabled: bool,
    /// Model tried when the requested one fails
    pub default_model: String,
    /// Also fall back when the requested model is not registered
    pub fallback_on_unknown_model: bool,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            default_model: DEFAULT_FALLBACK_MODEL.to_string(),
            fallback_on_unknown_model: false,
        }
    }
}

impl FallbackPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_fallback_on_unknown_model(mut self, enabled: bool) -> Self {
        self.fallback_on_unknown_model = enabled;
        self
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            enabled: settings.fallback_enabled,
            default_model: settings.fallback_model.clone(),
            fallback_on_unknown_model: settings.fallback_on_unknown_model,
        }
    }

    fn should_fall_back(&self, requested_model: &str, failure: &AttemptFailure) -> bool {
        if !self.enabled || requested_model == self.default_model {
            return false;
        }
        match failure {
            AttemptFailure::UnknownModel(_) => self.fallback_on_unknown_model,
            AttemptFailure::Provider(_) | AttemptFailure::EmptyResponse(_) => true,
        }
    }
}

/// Routes unified requests to Bedrock or Azure OpenAI.
pub struct ModelRouter {
    registry: RwLock<ProviderRegistry>,
    normalizer: RequestNormalizer,
    bedrock: ConverseAdapter,
    azure: ChatCompletionAdapter,
    policy: FallbackPolicy,
}

impl ModelRouter {
    pub fn new(
        registry: ProviderRegistry,
        normalizer: RequestNormalizer,
        bedrock: ConverseAdapter,
        azure: ChatCompletionAdapter,
        policy: FallbackPolicy,
    ) -> Self {
        Self {
            registry: RwLock::new(registry),
            normalizer,
            bedrock,
            azure,
            policy,
        }
    }

    /// Router with the built-in registry and both real adapters.
    pub async fn from_settings(settings: &Settings) -> Result<Self, RouterError> {
        let bedrock = Arc::new(BedrockService::from_settings(settings).await);
        let azure = Arc::new(AzureOpenAIService::new(AzureOpenAIConfig::from_settings(settings))?);

        tracing::info!(
            region = %settings.aws_region,
            azure_configured = settings.azure_endpoint.is_some() && settings.azure_api_key.is_some(),
            fallback_model = %settings.fallback_model,
            fallback_enabled = settings.fallback_enabled,
            "Initialized model router"
        );

        Ok(Self::new(
            ProviderRegistry::with_defaults(),
            RequestNormalizer::from_settings(settings),
            bedrock,
            azure,
            FallbackPolicy::from_settings(settings),
        ))
    }

    pub fn policy(&self) -> &FallbackPolicy {
        &self.policy
    }

    pub async fn resolve(&self, model: &str) -> Result<Provider, RouterError> {
        self.registry.read().await.resolve(model)
    }

    /// Add or replace a model mapping at runtime.
    pub async fn register_model(
        &self,
        model: impl Into<String>,
        provider: Provider,
    ) -> Result<Option<Provider>, RouterError> {
        self.registry.write().await.register(model, provider)
    }

    /// Registered models grouped by provider.
    pub async fn list_models(&self) -> BTreeMap<Provider, Vec<String>> {
        self.registry.read().await.list()
    }

    /// Route a request, falling back once when the policy allows it.
    pub async fn route(&self, request: ModelRequest) -> Result<ModelResponse, RouterError> {
        request.validate()?;
        let start = Instant::now();

        let failure = match self.attempt(&request).await {
            Ok(response) => {
                tracing::info!(
                    model = %response.model,
                    provider = %response.provider,
                    prompt_tokens = response.usage.prompt_tokens,
                    completion_tokens = response.usage.completion_tokens,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Request routed"
                );
                return Ok(response);
            }
            Err(failure) => failure,
        };

        if !self.policy.should_fall_back(&request.model, &failure) {
            return Err(failure.into());
        }

        let fallback_model = self.policy.default_model.clone();
        tracing::warn!(
            model = %request.model,
            fallback_model = %fallback_model,
            reason = %failure,
            "Primary model failed, trying fallback"
        );

        match self.attempt(&request.retarget(fallback_model.clone())).await {
            Ok(mut response) => {
                response.fallback = Some(FallbackInfo::new(request.model.clone(), failure.to_string()));
                tracing::info!(
                    model = %response.model,
                    original_model = %request.model,
                    provider = %response.provider,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Request routed via fallback"
                );
                Ok(response)
            }
            Err(fallback_failure) => {
                tracing::error!(
                    model = %request.model,
                    fallback_model = %fallback_model,
                    error = %failure,
                    fallback_error = %fallback_failure,
                    "Fallback model also failed"
                );
                Err(RouterError::FallbackExhausted {
                    original_model: request.model,
                    fallback_model,
                    original_cause: failure,
                    fallback_cause: fallback_failure,
                })
            }
        }
    }

    /// One resolve, normalize, call and normalize pass for a single model.
    async fn attempt(&self, request: &ModelRequest) -> Result<ModelResponse, AttemptFailure> {
        let provider = self
            .resolve(&request.model)
            .await
            .map_err(|_| AttemptFailure::UnknownModel(request.model.clone()))?;

        tracing::debug!(model = %request.model, provider = %provider, "Resolved provider");

        let body = self.normalizer.normalize(request, provider);
        let raw = self.dispatch(body).await?;
        let normalized = response::normalize(&raw, &request.model)?;

        if normalized.is_empty() {
            return Err(AttemptFailure::EmptyResponse(request.model.clone()));
        }
        Ok(normalized)
    }

    async fn dispatch(&self, body: ProviderRequest) -> Result<RawProviderResponse, ProviderApiError> {
        match body {
            ProviderRequest::Aws(body) => self.bedrock.call(body).await.map(RawProviderResponse::Aws),
            ProviderRequest::Azure(body) => self.azure.call(body).await.map(RawProviderResponse::Azure),
        }
    }
}
