//! Health check endpoints
//!
//! Health, readiness and liveness probes for load balancers and container
//! orchestrators.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::server::state::AppState;

/// Response for the main health check endpoint
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub uptime_seconds: u64,
}

/// Response for readiness probe
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: ReadinessChecks,
}

/// Individual readiness checks
#[derive(Debug, Serialize)]
pub struct ReadinessChecks {
    pub config_loaded: bool,
    pub registry_loaded: bool,
    pub fallback_model_resolves: bool,
    pub azure_configured: bool,
}

/// Response for liveness probe
#[derive(Serialize)]
pub struct LivenessResponse {
    pub alive: bool,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.settings.app_version.clone(),
        environment: state.settings.environment.to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Ready once the registry has entries and, with fallback on, the fallback
/// model resolves. Azure credentials are reported but not required.
///
/// GET /ready
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let policy = state.router.policy();
    let registry_loaded = !state.router.list_models().await.is_empty();
    let fallback_model_resolves =
        !policy.enabled || state.router.resolve(&policy.default_model).await.is_ok();

    let checks = ReadinessChecks {
        config_loaded: true,
        registry_loaded,
        fallback_model_resolves,
        azure_configured: state.settings.azure_endpoint.is_some()
            && state.settings.azure_api_key.is_some(),
    };

    let ready = checks.config_loaded && checks.registry_loaded && checks.fallback_model_resolves;

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    if !ready {
        tracing::warn!(checks = ?checks, "Service not ready");
    } else if !checks.azure_configured {
        tracing::debug!("Azure OpenAI is not configured; Azure models will fail");
    }

    (status, Json(ReadinessResponse { ready, checks }))
}

/// GET /liveness
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { alive: true })
}
