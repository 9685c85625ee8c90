//! Model router library
//!
//! Routes a unified prompt request to AWS Bedrock (Converse) or Azure OpenAI
//! (chat completions) and normalizes the answer, retrying once on a configured
//! fallback model when the first attempt fails.

// Public modules
pub mod api;
pub mod config;
pub mod converters;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod schemas;
pub mod server;
pub mod services;
pub mod tools;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use error::{ApiError, ProviderApiError, ProviderErrorKind, RouterError};
pub use schemas::{ModelRequest, ModelResponse, Provider, ToolDefinition, ToolSet};
pub use server::App;
pub use services::{FallbackPolicy, ModelRouter, ProviderAdapter, ProviderRegistry};
