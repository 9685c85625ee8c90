//! Request logging middleware
//!
//! Logs each HTTP request with its duration and status, and tags it with a
//! trace id that is echoed back in the response headers.

use axum::{
    body::Body,
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use uuid::Uuid;

pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Accepted as the trace id when `x-trace-id` is absent
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceId(pub String);

impl TraceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Log a request and its outcome.
///
/// ```ignore
/// Router::new().layer(axum::middleware::from_fn(log_request))
/// ```
pub async fn log_request(mut request: Request, next: Next) -> Response<Body> {
    let start = Instant::now();
    let trace_id = extract_or_generate_trace_id(&request);
    request.extensions_mut().insert(trace_id.clone());

    let method = request.method().clone();
    let path = request.uri().path().to_string();

    tracing::debug!(trace_id = %trace_id, method = %method, path = %path, "Incoming request");

    let span = tracing::info_span!("http_request", trace_id = %trace_id, method = %method, path = %path);
    let mut response = {
        let _guard = span.enter();
        next.run(request).await
    };

    let status = response.status();
    let duration_ms = start.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(trace_id = %trace_id, method = %method, path = %path, status = status.as_u16(), duration_ms, "Server error");
    } else if status.is_client_error() {
        tracing::warn!(trace_id = %trace_id, method = %method, path = %path, status = status.as_u16(), duration_ms, "Client error");
    } else {
        tracing::info!(trace_id = %trace_id, method = %method, path = %path, status = status.as_u16(), duration_ms, "Request completed");
    }

    if let Ok(value) = HeaderValue::from_str(trace_id.as_str()) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }

    response
}

fn extract_or_generate_trace_id(request: &Request) -> TraceId {
    [TRACE_ID_HEADER, REQUEST_ID_HEADER]
        .iter()
        .find_map(|name| {
            request
                .headers()
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
        })
        .map(|id| TraceId(id.to_string()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_id_generation() {
        let trace_id = TraceId::new();
        assert_eq!(trace_id.as_str().len(), 36);
    }

    #[test]
    fn test_trace_id_prefers_trace_header() {
        let request = axum::http::Request::builder()
            .header(REQUEST_ID_HEADER, "req-1")
            .header(TRACE_ID_HEADER, "trace-1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_or_generate_trace_id(&request), TraceId("trace-1".to_string()));

        let request = axum::http::Request::builder()
            .header(REQUEST_ID_HEADER, "req-1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_or_generate_trace_id(&request).as_str(), "req-1");
    }
}
