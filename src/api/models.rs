//! Model registry endpoints
//!
//! GET /v1/models lists registered models grouped by provider.
//! POST /v1/models adds or replaces one mapping.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ApiError;
use crate::schemas::Provider;
use crate::server::state::AppState;

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: BTreeMap<Provider, Vec<String>>,
    pub fallback_model: String,
    pub fallback_enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct RegisterModelRequest {
    pub model: String,
    pub provider: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterModelResponse {
    pub model: String,
    pub provider: Provider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaced: Option<Provider>,
}

pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let policy = state.router.policy();
    Json(ModelsResponse {
        models: state.router.list_models().await,
        fallback_model: policy.default_model.clone(),
        fallback_enabled: policy.enabled,
    })
}

pub async fn register_model(
    State(state): State<AppState>,
    Json(request): Json<RegisterModelRequest>,
) -> Result<(StatusCode, Json<RegisterModelResponse>), ApiError> {
    let provider: Provider = request.provider.parse()?;
    let replaced = state
        .router
        .register_model(request.model.clone(), provider)
        .await?;

    tracing::info!(
        model = %request.model,
        provider = %provider,
        replaced = ?replaced,
        "Registered model"
    );

    Ok((
        StatusCode::CREATED,
        Json(RegisterModelResponse {
            model: request.model,
            provider,
            replaced,
        }),
    ))
}
