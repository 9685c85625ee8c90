//! AWS Bedrock Converse API schema definitions
//!
//! Serializable mirrors of the Converse request and response. The request
//! normalizer produces a [`BedrockConverseRequest`]; the Bedrock adapter turns it
//! into SDK builders and turns the SDK output back into a
//! [`BedrockConverseResponse`], which keeps the rest of the crate free of SDK
//! types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Content Blocks
// ============================================================================

/// Tool invocation emitted by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BedrockToolUse {
    pub tool_use_id: String,
    pub name: String,
    pub input: Value,
}

/// The content block shapes the router sends or reads back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum BedrockContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        #[serde(rename = "toolUse")]
        tool_use: BedrockToolUse,
    },
}

impl BedrockContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        BedrockContentBlock::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            BedrockContentBlock::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn as_tool_use(&self) -> Option<&BedrockToolUse> {
        match self {
            BedrockContentBlock::ToolUse { tool_use } => Some(tool_use),
            _ => None,
        }
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Conversation message. Bedrock only accepts `user` and `assistant` here;
/// system text goes to [`BedrockConverseRequest::system`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BedrockMessage {
    pub role: String,
    pub content: Vec<BedrockContentBlock>,
}

impl BedrockMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: vec![BedrockContentBlock::text(text)],
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: vec![BedrockContentBlock::text(text)],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BedrockSystemMessage {
    pub text: String,
}

impl BedrockSystemMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

// ============================================================================
// Tool Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BedrockToolInputSchema {
    pub json: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BedrockToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: BedrockToolInputSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BedrockTool {
    pub tool_spec: BedrockToolSpec,
}

/// `toolConfig` block of a Converse request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BedrockToolConfig {
    pub tools: Vec<BedrockTool>,
}

// ============================================================================
// Inference Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BedrockInferenceConfig {
    pub max_tokens: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
}

impl BedrockInferenceConfig {
    pub fn new(max_tokens: i32) -> Self {
        Self {
            max_tokens,
            temperature: None,
            top_p: None,
            stop_sequences: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: Option<f32>) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn with_stop_sequences(mut self, sequences: Option<Vec<String>>) -> Self {
        self.stop_sequences = sequences.filter(|s| !s.is_empty());
        self
    }
}

// ============================================================================
// Request
// ============================================================================

/// Bedrock Converse API request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BedrockConverseRequest {
    pub model_id: String,
    pub messages: Vec<BedrockMessage>,
    pub inference_config: BedrockInferenceConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<Vec<BedrockSystemMessage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<BedrockToolConfig>,
    /// Model-specific fields Converse does not model (e.g. `top_k`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_model_request_fields: Option<Value>,
}

// ============================================================================
// Response
// ============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BedrockTokenUsage {
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub total_tokens: i32,
}

impl BedrockTokenUsage {
    pub fn new(input_tokens: i32, output_tokens: i32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BedrockOutputMessage {
    pub role: String,
    pub content: Vec<BedrockContentBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BedrockOutput {
    pub message: BedrockOutputMessage,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BedrockMetrics {
    pub latency_ms: i64,
}

/// Bedrock Converse API response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BedrockConverseResponse {
    pub output: BedrockOutput,
    pub stop_reason: String,
    pub usage: BedrockTokenUsage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<BedrockMetrics>,
}

impl BedrockConverseResponse {
    /// Build a plain text response; mostly useful for fakes and tests.
    pub fn from_text(text: impl Into<String>, usage: BedrockTokenUsage) -> Self {
        Self {
            output: BedrockOutput {
                message: BedrockOutputMessage {
                    role: "assistant".to_string(),
                    content: vec![BedrockContentBlock::text(text)],
                },
            },
            stop_reason: "end_turn".to_string(),
            usage,
            metrics: None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
