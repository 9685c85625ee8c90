//! Routing endpoint
//!
//! POST /v1/route takes a unified `ModelRequest` and returns the normalized
//! `ModelResponse` of whichever provider served it.

use axum::{extract::State, Extension, Json};

use crate::error::ApiError;
use crate::middleware::TraceId;
use crate::schemas::{ModelRequest, ModelResponse};
use crate::server::state::AppState;

pub async fn route_request(
    State(state): State<AppState>,
    trace_id: Option<Extension<TraceId>>,
    Json(request): Json<ModelRequest>,
) -> Result<Json<ModelResponse>, ApiError> {
    let trace_id = trace_id.map(|Extension(id)| id).unwrap_or_default();

    tracing::debug!(
        trace_id = %trace_id,
        model = %request.model,
        messages = request.messages.len(),
        tools = request.tools.as_ref().map_or(0, |t| t.len()),
        "Routing request"
    );

    let response = state.router.route(request).await.map_err(|e| {
        tracing::warn!(trace_id = %trace_id, error = %e, "Routing failed");
        ApiError::from(e)
    })?;

    Ok(Json(response))
}
