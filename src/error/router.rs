//! Routing and provider error types

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::schemas::router::Provider;

/// Classification of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// Network failure or unreachable endpoint
    Transport,
    /// Missing, invalid or rejected credentials
    Authentication,
    /// Rate limited by the provider
    Throttled,
    /// Provider rejected the request body
    InvalidRequest,
    /// Unknown model or deployment on the provider side
    ModelNotFound,
    /// Provider-side outage or internal error
    ServiceUnavailable,
    /// Call exceeded its deadline
    Timeout,
    /// Response body could not be decoded
    MalformedResponse,
    /// Adapter is missing required settings
    Configuration,
    Unknown,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderErrorKind::Transport => "transport",
            ProviderErrorKind::Authentication => "authentication",
            ProviderErrorKind::Throttled => "throttled",
            ProviderErrorKind::InvalidRequest => "invalid_request",
            ProviderErrorKind::ModelNotFound => "model_not_found",
            ProviderErrorKind::ServiceUnavailable => "service_unavailable",
            ProviderErrorKind::Timeout => "timeout",
            ProviderErrorKind::MalformedResponse => "malformed_response",
            ProviderErrorKind::Configuration => "configuration",
            ProviderErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any failure raised by a provider adapter call.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{provider} provider error ({kind}): {message}")]
pub struct ProviderApiError {
    pub provider: Provider,
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderApiError {
    pub fn new(provider: Provider, kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            provider,
            kind,
            message: message.into(),
        }
    }

    pub fn configuration(provider: Provider, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Configuration, message)
    }

    pub fn malformed(provider: Provider, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::MalformedResponse, message)
    }

    pub fn timeout(provider: Provider, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Timeout, message)
    }
}

/// Why a single routing attempt did not produce a usable response.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AttemptFailure {
    #[error("Unrecognized model: {0}")]
    UnknownModel(String),

    #[error(transparent)]
    Provider(#[from] ProviderApiError),

    #[error("model '{0}' returned an empty response")]
    EmptyResponse(String),
}

/// Errors surfaced by the model router.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RouterError {
    #[error("Unrecognized model: {0}. Register it with a provider or use a known model name.")]
    UnknownModel(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Provider(#[from] ProviderApiError),

    #[error("Model '{0}' returned an empty response")]
    EmptyResponse(String),

    #[error(
        "Original model {original_model} failed: {original_cause}. \
         Fallback model {fallback_model} also failed: {fallback_cause}"
    )]
    FallbackExhausted {
        original_model: String,
        fallback_model: String,
        original_cause: AttemptFailure,
        fallback_cause: AttemptFailure,
    },
}

impl From<AttemptFailure> for RouterError {
    fn from(failure: AttemptFailure) -> Self {
        match failure {
            AttemptFailure::UnknownModel(model) => RouterError::UnknownModel(model),
            AttemptFailure::Provider(err) => RouterError::Provider(err),
            AttemptFailure::EmptyResponse(model) => RouterError::EmptyResponse(model),
        }
    }
}
