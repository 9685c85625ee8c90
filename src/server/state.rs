//! Application state container
//!
//! Shared state passed to every request handler via Axum's state extraction.

use crate::config::Settings;
use crate::services::ModelRouter;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
///
/// Cheap to clone; the router and settings sit behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,

    pub router: Arc<ModelRouter>,

    /// Application start time (for uptime calculation)
    pub start_time: Instant,
}

impl AppState {
    /// Build the router from settings. AWS clients are initialized
    /// asynchronously; credentials are only checked on the first call.
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        tracing::debug!(
            region = %settings.aws_region,
            bedrock_endpoint = ?settings.bedrock_endpoint_url,
            azure_endpoint = ?settings.azure_endpoint,
            "Initializing model router"
        );

        let router = ModelRouter::from_settings(&settings).await?;

        tracing::info!("Application state initialized successfully");

        Ok(Self::with_router(settings, router))
    }

    /// State around an already built router.
    pub fn with_router(settings: Settings, router: ModelRouter) -> Self {
        Self {
            settings: Arc::new(settings),
            router: Arc::new(router),
            start_time: Instant::now(),
        }
    }

    /// Get the application uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
