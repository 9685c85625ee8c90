//! Application routing
//!
//! This module defines all HTTP routes for the application.

use axum::{
    http::HeaderName,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{health, models, route, tools};
use crate::middleware::logging::{log_request, REQUEST_ID_HEADER, TRACE_ID_HEADER};
use crate::server::state::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness))
        .route("/liveness", get(health::liveness));

    let api_routes = Router::new()
        .route("/route", post(route::route_request))
        .route("/models", get(models::list_models).post(models::register_model))
        .route("/tools", get(tools::list_tools));

    Router::new()
        .nest("/v1", api_routes)
        .merge(health_routes)
        // Last added = outermost, so logging wraps CORS
        .layer(create_cors_layer())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Permissive CORS that exposes the trace headers
fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([
            HeaderName::from_static(TRACE_ID_HEADER),
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::converters::RequestNormalizer;
    use crate::error::ProviderApiError;
    use crate::schemas::bedrock::{BedrockConverseRequest, BedrockConverseResponse, BedrockTokenUsage};
    use crate::schemas::openai::{ChatCompletionRequest, ChatCompletionResponse, CompletionUsage};
    use crate::schemas::Provider;
    use crate::services::{FallbackPolicy, ModelRouter, ProviderAdapter, ProviderRegistry};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct EchoBedrock;

    #[async_trait]
    impl ProviderAdapter for EchoBedrock {
        type Request = BedrockConverseRequest;
        type Response = BedrockConverseResponse;

        fn provider(&self) -> Provider {
            Provider::Aws
        }

        async fn call(&self, request: Self::Request) -> Result<Self::Response, ProviderApiError> {
            Ok(BedrockConverseResponse::from_text(
                format!("echo from {}", request.model_id),
                BedrockTokenUsage::new(3, 4),
            ))
        }
    }

    struct EchoAzure;

    #[async_trait]
    impl ProviderAdapter for EchoAzure {
        type Request = ChatCompletionRequest;
        type Response = ChatCompletionResponse;

        fn provider(&self) -> Provider {
            Provider::Azure
        }

        async fn call(&self, request: Self::Request) -> Result<Self::Response, ProviderApiError> {
            Ok(ChatCompletionResponse::from_text(
                &request.model,
                "azure says hi",
                CompletionUsage::new(1, 2),
            ))
        }
    }

    fn test_app() -> Router {
        let router = ModelRouter::new(
            ProviderRegistry::with_defaults(),
            RequestNormalizer::default(),
            Arc::new(EchoBedrock),
            Arc::new(EchoAzure),
            FallbackPolicy::default(),
        );
        create_router(AppState::with_router(Settings::default(), router))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_route_endpoint() {
        let response = test_app()
            .oneshot(post_json(
                "/v1/route",
                json!({"model": "gpt-4.1-mini", "prompt": "hello"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(TRACE_ID_HEADER));

        let body = body_json(response).await;
        assert_eq!(body["content"], "azure says hi");
        assert_eq!(body["provider"], "azure");
        assert_eq!(body["usage"]["total_tokens"], 3);
        assert!(body.get("fallback_used").is_none());
    }

    #[tokio::test]
    async fn test_route_unknown_model() {
        let response = test_app()
            .oneshot(post_json("/v1/route", json!({"model": "not-a-real-model", "prompt": "hi"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["type"], "error");
        assert_eq!(body["error"]["type"], "not_found_error");
    }

    #[tokio::test]
    async fn test_register_then_list_models() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/v1/models",
                json!({"model": "my-deployment", "provider": "azure"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(Request::builder().uri("/v1/models").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let azure: Vec<String> = serde_json::from_value(body["models"]["azure"].clone()).unwrap();
        assert!(azure.contains(&"my-deployment".to_string()));
        assert_eq!(body["fallback_model"], "mistral-small");
    }

    #[tokio::test]
    async fn test_register_rejects_unknown_provider() {
        let response = test_app()
            .oneshot(post_json(
                "/v1/models",
                json!({"model": "x", "provider": "gcp"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_tools_endpoint() {
        let response = test_app()
            .oneshot(Request::builder().uri("/v1/tools").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let modules = body["modules"].as_array().unwrap();
        assert_eq!(modules.len(), 4);
        assert_eq!(modules[0]["id"], "time_and_date");
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["ready"], true);
        assert_eq!(body["checks"]["fallback_model_resolves"], true);
    }
}
