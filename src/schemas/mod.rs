//! Schema module
//!
//! Unified router types plus the wire formats of each provider.

pub mod bedrock;
pub mod openai;
pub mod router;
pub mod tool;

pub use router::{
    ChatTurn, FallbackInfo, InferenceParams, ModelRequest, ModelResponse, Provider,
    RequestedToolCall, Role, TokenUsage,
};
pub use tool::{ToolDefinition, ToolSet};
