//! Provider adapter seam
//!
//! Each provider adapter accepts its own request body and returns its own raw
//! response. The router dispatches on [`ProviderRequest`], so bodies and
//! responses never cross provider boundaries.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ProviderApiError;
use crate::schemas::bedrock::{BedrockConverseRequest, BedrockConverseResponse};
use crate::schemas::openai::{ChatCompletionRequest, ChatCompletionResponse};
use crate::schemas::router::Provider;

/// One network call to a model provider.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    type Request: Send + 'static;
    type Response: Send + 'static;

    fn provider(&self) -> Provider;

    /// Send a request body and return the raw response.
    async fn call(&self, request: Self::Request) -> Result<Self::Response, ProviderApiError>;
}

/// Bedrock Converse adapter handle
pub type ConverseAdapter =
    Arc<dyn ProviderAdapter<Request = BedrockConverseRequest, Response = BedrockConverseResponse>>;

/// Azure OpenAI chat completions adapter handle
pub type ChatCompletionAdapter =
    Arc<dyn ProviderAdapter<Request = ChatCompletionRequest, Response = ChatCompletionResponse>>;

/// A request body tagged with the provider it was built for.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderRequest {
    Aws(BedrockConverseRequest),
    Azure(ChatCompletionRequest),
}

impl ProviderRequest {
    pub fn provider(&self) -> Provider {
        match self {
            ProviderRequest::Aws(_) => Provider::Aws,
            ProviderRequest::Azure(_) => Provider::Azure,
        }
    }
}

/// A raw response tagged with the provider that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawProviderResponse {
    Aws(BedrockConverseResponse),
    Azure(ChatCompletionResponse),
}

impl RawProviderResponse {
    pub fn provider(&self) -> Provider {
        match self {
            RawProviderResponse::Aws(_) => Provider::Aws,
            RawProviderResponse::Azure(_) => Provider::Azure,
        }
    }
}
