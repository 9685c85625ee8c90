//! Timeout utilities for provider calls

use std::time::Duration;

use crate::config::Settings;

/// Per-provider call deadlines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Deadline for one Bedrock Converse call (default: 120s)
    pub bedrock_timeout: Duration,

    /// Deadline for one Azure chat completions call (default: 120s)
    pub azure_timeout: Duration,

    /// Connection timeout for HTTP clients (default: 10s)
    pub connect_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            bedrock_timeout: Duration::from_secs(120),
            azure_timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl TimeoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bedrock_timeout(mut self, timeout: Duration) -> Self {
        self.bedrock_timeout = timeout;
        self
    }

    pub fn with_azure_timeout(mut self, timeout: Duration) -> Self {
        self.azure_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            bedrock_timeout: Duration::from_secs(settings.bedrock_timeout_secs),
            azure_timeout: Duration::from_secs(settings.azure_timeout_secs),
            connect_timeout: Duration::from_secs(settings.connect_timeout_secs),
        }
    }
}

/// Apply a deadline to an async operation.
pub async fn with_timeout<T, E>(
    timeout: Duration,
    future: impl std::future::Future<Output = Result<T, E>>,
) -> Result<T, TimeoutError<E>> {
    match tokio::time::timeout(timeout, future).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(TimeoutError::Inner(err)),
        Err(_) => Err(TimeoutError::Timeout(timeout)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimeoutError<E> {
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Inner(E),
}

impl<E> TimeoutError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TimeoutError::Timeout(_))
    }
}
