//! Services module
//!
//! Provider registry, provider adapters and the model router.

pub mod adapter;
pub mod azure;
pub mod bedrock;
pub mod registry;
pub mod router;

pub use adapter::{
    ChatCompletionAdapter, ConverseAdapter, ProviderAdapter, ProviderRequest, RawProviderResponse,
};
pub use azure::{AzureOpenAIConfig, AzureOpenAIService};
pub use bedrock::BedrockService;
pub use registry::ProviderRegistry;
pub use router::{FallbackPolicy, ModelRouter};
