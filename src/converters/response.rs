//! Response normalization
//!
//! Converts raw provider responses into a [`ModelResponse`]. Normalization is
//! a pure function of the raw response and the model name, so it can run any
//! number of times on the same input.

use serde_json::Value;

use crate::error::ProviderApiError;
use crate::schemas::bedrock::{BedrockContentBlock, BedrockConverseResponse};
use crate::schemas::openai::ChatCompletionResponse;
use crate::schemas::router::{ModelResponse, Provider, RequestedToolCall, TokenUsage};
use crate::services::adapter::RawProviderResponse;

/// Normalize a raw response produced for `model`.
pub fn normalize(raw: &RawProviderResponse, model: &str) -> Result<ModelResponse, ProviderApiError> {
    match raw {
        RawProviderResponse::Aws(response) => Ok(from_bedrock(response, model)),
        RawProviderResponse::Azure(response) => from_azure(response, model),
    }
}

pub fn from_bedrock(response: &BedrockConverseResponse, model: &str) -> ModelResponse {
    let blocks = &response.output.message.content;

    let content: String = blocks.iter().filter_map(BedrockContentBlock::as_text).collect();

    let tool_calls: Vec<RequestedToolCall> = blocks
        .iter()
        .filter_map(BedrockContentBlock::as_tool_use)
        .map(|tool_use| RequestedToolCall {
            id: Some(tool_use.tool_use_id.clone()),
            name: tool_use.name.clone(),
            input: tool_use.input.clone(),
        })
        .collect();

    let usage = &response.usage;
    let prompt_tokens = non_negative(usage.input_tokens);
    let completion_tokens = non_negative(usage.output_tokens);

    tracing::debug!(
        model = %model,
        stop_reason = %response.stop_reason,
        text_len = content.len(),
        tool_calls = tool_calls.len(),
        "Normalized Bedrock response"
    );

    ModelResponse {
        content,
        tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
        usage: TokenUsage {
            prompt_tokens,
            completion_tokens,
            total_tokens: non_negative(usage.total_tokens),
        },
        model: model.to_string(),
        provider: Provider::Aws,
        fallback: None,
    }
}

pub fn from_azure(
    response: &ChatCompletionResponse,
    model: &str,
) -> Result<ModelResponse, ProviderApiError> {
    let choice = response.choices.first().ok_or_else(|| {
        ProviderApiError::malformed(Provider::Azure, "response contained no choices")
    })?;
    let message = &choice.message;

    let tool_calls = message
        .tool_calls
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|call| {
            Ok(RequestedToolCall {
                id: Some(call.id.clone()),
                name: call.function.name.clone(),
                input: parse_arguments(&call.function.name, &call.function.arguments)?,
            })
        })
        .collect::<Result<Vec<_>, ProviderApiError>>()?;

    let usage = response.usage.unwrap_or_default();

    tracing::debug!(
        model = %model,
        finish_reason = ?choice.finish_reason,
        tool_calls = tool_calls.len(),
        "Normalized Azure OpenAI response"
    );

    Ok(ModelResponse {
        content: message.content.clone().unwrap_or_default(),
        tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
        usage: TokenUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        },
        model: model.to_string(),
        provider: Provider::Azure,
        fallback: None,
    })
}

/// Decode a JSON-encoded tool argument string. An empty string means no
/// arguments.
fn parse_arguments(tool: &str, arguments: &str) -> Result<Value, ProviderApiError> {
    if arguments.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(arguments).map_err(|e| {
        ProviderApiError::malformed(
            Provider::Azure,
            format!("arguments for tool call '{}' are not valid JSON: {}", tool, e),
        )
    })
}

fn non_negative(count: i32) -> u32 {
    u32::try_from(count).unwrap_or(0)
}
