//! API error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use super::router::{ProviderErrorKind, RouterError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<RouterError> for ApiError {
    fn from(err: RouterError) -> Self {
        match &err {
            RouterError::UnknownModel(_) => ApiError::NotFound(err.to_string()),
            RouterError::InvalidRequest(msg) => ApiError::InvalidRequest(msg.clone()),
            RouterError::Provider(provider_err) => match provider_err.kind {
                ProviderErrorKind::InvalidRequest => ApiError::InvalidRequest(err.to_string()),
                ProviderErrorKind::Timeout => ApiError::UpstreamTimeout(err.to_string()),
                _ => ApiError::Upstream(err.to_string()),
            },
            RouterError::EmptyResponse(_) | RouterError::FallbackExhausted { .. } => {
                ApiError::Upstream(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request_error", msg)
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found_error", msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "api_error", msg),
            ApiError::UpstreamTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, "timeout_error", msg),
            ApiError::Internal(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "api_error",
                err.to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            type_: "error".to_string(),
            error: ErrorDetail {
                type_: error_type.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    #[serde(rename = "type")]
    type_: String,
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    type_: String,
    message: String,
}
