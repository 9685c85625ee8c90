//! Unified router request and response types
//!
//! These are the provider-independent shapes callers work with. Provider wire
//! formats live in [`super::bedrock`] and [`super::openai`]; converting between
//! the two worlds is the job of the converters module.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::tool::ToolSet;
use crate::error::RouterError;

// ============================================================================
// Provider Identity
// ============================================================================

/// Backend service capable of executing a model request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// AWS Bedrock Converse API
    Aws,
    /// Azure OpenAI chat completions
    Azure,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Aws => "aws",
            Provider::Azure => "azure",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aws" | "bedrock" => Ok(Provider::Aws),
            "azure" | "azure-openai" => Ok(Provider::Azure),
            other => Err(RouterError::InvalidRequest(format!(
                "Provider must be either 'aws' or 'azure', got '{}'",
                other
            ))),
        }
    }
}

// ============================================================================
// Conversation Turns
// ============================================================================

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One `{role, content}` entry of the message history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

// ============================================================================
// Inference Parameters
// ============================================================================

/// Recognized inference options plus one escape hatch for provider-specific
/// knobs.
///
/// Each provider's request normalizer decides which of these it consumes;
/// anything in `extra` is forwarded verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,

    /// Provider-specific extras (e.g. `presence_penalty`, `frequency_penalty`)
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

impl InferenceParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: i32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_top_k(mut self, top_k: i32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_stop_sequences(mut self, sequences: Vec<String>) -> Self {
        self.stop_sequences = Some(sequences);
        self
    }

    /// Add a provider-specific parameter.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

// ============================================================================
// Request
// ============================================================================

/// A provider-independent model request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    /// Model identifier (alias, Bedrock id or Azure deployment name)
    pub model: String,

    /// Prompt text; appended as the last user turn when `messages` is non-empty
    #[serde(default)]
    pub prompt: String,

    /// Conversation history in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<ChatTurn>,

    /// Tool schemas offered to the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolSet>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    #[serde(default, flatten)]
    pub params: InferenceParams,
}

impl ModelRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            messages: Vec::new(),
            tools: None,
            system_prompt: None,
            params: InferenceParams::default(),
        }
    }

    pub fn with_messages(mut self, messages: Vec<ChatTurn>) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_tools(mut self, tools: ToolSet) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_params(mut self, params: InferenceParams) -> Self {
        self.params = params;
        self
    }

    /// The same request aimed at a different model.
    pub fn retarget(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self.clone()
        }
    }

    /// Check the request-level invariants.
    pub fn validate(&self) -> Result<(), RouterError> {
        if self.model.trim().is_empty() {
            return Err(RouterError::InvalidRequest(
                "model must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Tools offered with this request, if any.
    pub fn tool_set(&self) -> Option<&ToolSet> {
        self.tools.as_ref().filter(|t| !t.is_empty())
    }
}

// ============================================================================
// Response
// ============================================================================

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestedToolCall {
    /// Provider-assigned call id, when the provider supplies one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub input: Value,
}

/// Token accounting for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Fallback annotations. Flattened into [`ModelResponse`] so the three keys
/// are either all present or all absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackInfo {
    pub fallback_used: bool,
    pub original_model: String,
    pub fallback_reason: String,
}

impl FallbackInfo {
    pub fn new(original_model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            fallback_used: true,
            original_model: original_model.into(),
            fallback_reason: reason.into(),
        }
    }
}

/// Unified model response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Concatenated text; empty for tool-call-only turns
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<RequestedToolCall>>,

    pub usage: TokenUsage,

    /// Model actually used (differs from the requested one after fallback)
    pub model: String,

    pub provider: Provider,

    #[serde(default, flatten)]
    pub fallback: Option<FallbackInfo>,
}

impl ModelResponse {
    /// True when the model produced neither text nor tool calls.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty() && !self.has_tool_calls()
    }

    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty())
    }

    pub fn fallback_used(&self) -> bool {
        self.fallback.as_ref().is_some_and(|f| f.fallback_used)
    }
}

// ============================================================================
// Tests
// ============================================================================
