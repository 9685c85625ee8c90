//! Bedrock adapter
//!
//! Sends [`BedrockConverseRequest`] bodies through the AWS SDK Converse API
//! and maps the SDK output back into [`BedrockConverseResponse`].

use async_trait::async_trait;
use aws_sdk_bedrockruntime::{
    operation::converse::{ConverseError, ConverseOutput},
    types::{
        ContentBlock, ConversationRole, ConverseOutput as ConverseOutputBlock,
        InferenceConfiguration, Message as SdkMessage, SystemContentBlock, Tool,
        ToolConfiguration, ToolInputSchema, ToolSpecification, ToolUseBlock,
    },
    Client as BedrockRuntimeClient,
};
use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_types::error::display::DisplayErrorContext;
use std::time::Duration;

use crate::config::{create_bedrock_client, Settings};
use crate::error::{ProviderApiError, ProviderErrorKind};
use crate::schemas::bedrock::{
    BedrockContentBlock, BedrockConverseRequest, BedrockConverseResponse, BedrockInferenceConfig,
    BedrockMessage, BedrockMetrics, BedrockOutput, BedrockOutputMessage, BedrockSystemMessage,
    BedrockTokenUsage, BedrockToolConfig, BedrockToolUse,
};
use crate::schemas::router::Provider;
use crate::services::adapter::ProviderAdapter;
use crate::utils::{document_to_json, json_to_document, with_timeout, TimeoutConfig, TimeoutError};

/// AWS Bedrock Converse adapter.
#[derive(Clone)]
pub struct BedrockService {
    client: BedrockRuntimeClient,
    timeout: Duration,
}

impl BedrockService {
    pub fn new(client: BedrockRuntimeClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub async fn from_settings(settings: &Settings) -> Self {
        let client = create_bedrock_client(settings).await;
        Self::new(client, TimeoutConfig::from_settings(settings).bedrock_timeout)
    }

    pub fn client(&self) -> &BedrockRuntimeClient {
        &self.client
    }

    async fn converse(&self, request: BedrockConverseRequest) -> Result<ConverseOutput, ProviderApiError> {
        tracing::debug!(
            model_id = %request.model_id,
            message_count = request.messages.len(),
            "Calling Bedrock Converse API"
        );

        let mut converse_request = self
            .client
            .converse()
            .model_id(&request.model_id)
            .set_messages(Some(to_sdk_messages(&request.messages)?))
            .inference_config(to_sdk_inference_config(&request.inference_config));

        if let Some(system) = &request.system {
            converse_request = converse_request.set_system(Some(to_sdk_system(system)));
        }

        if let Some(tool_config) = &request.tool_config {
            converse_request = converse_request.tool_config(to_sdk_tool_config(tool_config)?);
        }

        if let Some(fields) = &request.additional_model_request_fields {
            converse_request = converse_request.additional_model_request_fields(json_to_document(fields));
        }

        let sent = async {
            converse_request
                .send()
                .await
                .map_err(provider_error_from_sdk)
        };

        match with_timeout(self.timeout, sent).await {
            Ok(output) => Ok(output),
            Err(TimeoutError::Timeout(after)) => Err(ProviderApiError::timeout(
                Provider::Aws,
                format!("Bedrock Converse call exceeded {:?}", after),
            )),
            Err(TimeoutError::Inner(err)) => Err(err),
        }
    }
}

#[async_trait]
impl ProviderAdapter for BedrockService {
    type Request = BedrockConverseRequest;
    type Response = BedrockConverseResponse;

    fn provider(&self) -> Provider {
        Provider::Aws
    }

    async fn call(&self, request: BedrockConverseRequest) -> Result<BedrockConverseResponse, ProviderApiError> {
        let output = self.converse(request).await?;

        tracing::debug!(
            stop_reason = %output.stop_reason().as_str(),
            "Bedrock Converse API call completed"
        );

        from_sdk_output(&output)
    }
}

// ============================================================================
// Request Conversion
// ============================================================================

fn to_sdk_messages(messages: &[BedrockMessage]) -> Result<Vec<SdkMessage>, ProviderApiError> {
    messages
        .iter()
        .map(|message| {
            let role = match message.role.as_str() {
                "assistant" => ConversationRole::Assistant,
                _ => ConversationRole::User,
            };
            let content = message
                .content
                .iter()
                .map(to_sdk_content_block)
                .collect::<Result<Vec<_>, _>>()?;

            SdkMessage::builder()
                .role(role)
                .set_content(Some(content))
                .build()
                .map_err(|e| invalid_request(format!("Failed to build message: {}", e)))
        })
        .collect()
}

fn to_sdk_content_block(block: &BedrockContentBlock) -> Result<ContentBlock, ProviderApiError> {
    match block {
        BedrockContentBlock::Text { text } => Ok(ContentBlock::Text(text.clone())),
        BedrockContentBlock::ToolUse { tool_use } => ToolUseBlock::builder()
            .tool_use_id(&tool_use.tool_use_id)
            .name(&tool_use.name)
            .input(json_to_document(&tool_use.input))
            .build()
            .map(ContentBlock::ToolUse)
            .map_err(|e| invalid_request(format!("Failed to build tool use block: {}", e))),
    }
}

fn to_sdk_system(system: &[BedrockSystemMessage]) -> Vec<SystemContentBlock> {
    system
        .iter()
        .map(|block| SystemContentBlock::Text(block.text.clone()))
        .collect()
}

fn to_sdk_inference_config(config: &BedrockInferenceConfig) -> InferenceConfiguration {
    InferenceConfiguration::builder()
        .max_tokens(config.max_tokens)
        .set_temperature(config.temperature)
        .set_top_p(config.top_p)
        .set_stop_sequences(config.stop_sequences.clone())
        .build()
}

fn to_sdk_tool_config(config: &BedrockToolConfig) -> Result<ToolConfiguration, ProviderApiError> {
    let tools = config
        .tools
        .iter()
        .map(|tool| {
            let spec = &tool.tool_spec;
            ToolSpecification::builder()
                .name(&spec.name)
                // Bedrock rejects an empty description, so leave it unset
                .set_description((!spec.description.is_empty()).then(|| spec.description.clone()))
                .input_schema(ToolInputSchema::Json(json_to_document(&spec.input_schema.json)))
                .build()
                .map(Tool::ToolSpec)
                .map_err(|e| invalid_request(format!("Failed to build tool spec '{}': {}", spec.name, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    ToolConfiguration::builder()
        .set_tools(Some(tools))
        .build()
        .map_err(|e| invalid_request(format!("Failed to build tool config: {}", e)))
}

fn invalid_request(message: String) -> ProviderApiError {
    ProviderApiError::new(Provider::Aws, ProviderErrorKind::InvalidRequest, message)
}

// ============================================================================
// Response Conversion
// ============================================================================

fn from_sdk_output(output: &ConverseOutput) -> Result<BedrockConverseResponse, ProviderApiError> {
    let message = match output.output() {
        Some(ConverseOutputBlock::Message(message)) => message,
        _ => {
            return Err(ProviderApiError::malformed(
                Provider::Aws,
                "Converse output contained no message",
            ))
        }
    };

    let usage = output
        .usage()
        .map(|u| BedrockTokenUsage {
            input_tokens: u.input_tokens(),
            output_tokens: u.output_tokens(),
            total_tokens: u.total_tokens(),
        })
        .unwrap_or_default();

    Ok(BedrockConverseResponse {
        output: BedrockOutput {
            message: BedrockOutputMessage {
                role: message.role().as_str().to_string(),
                content: from_sdk_content(message.content()),
            },
        },
        stop_reason: output.stop_reason().as_str().to_string(),
        usage,
        metrics: output.metrics().map(|m| BedrockMetrics {
            latency_ms: m.latency_ms(),
        }),
    })
}

/// Keep text and tool use blocks; reasoning and other block kinds are not
/// part of the unified response.
fn from_sdk_content(blocks: &[ContentBlock]) -> Vec<BedrockContentBlock> {
    blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text(text) => Some(BedrockContentBlock::text(text.clone())),
            ContentBlock::ToolUse(tool_use) => Some(BedrockContentBlock::ToolUse {
                tool_use: BedrockToolUse {
                    tool_use_id: tool_use.tool_use_id().to_string(),
                    name: tool_use.name().to_string(),
                    input: document_to_json(tool_use.input()),
                },
            }),
            other => {
                tracing::debug!(block = ?other, "Skipping unsupported Bedrock content block");
                None
            }
        })
        .collect()
}

// ============================================================================
// Error Mapping
// ============================================================================

fn provider_error_from_sdk<R>(err: SdkError<ConverseError, R>) -> ProviderApiError
where
    R: std::fmt::Debug,
{
    let (kind, message) = match &err {
        SdkError::ServiceError(service_err) => match service_err.err() {
            ConverseError::ThrottlingException(e) => (
                ProviderErrorKind::Throttled,
                e.message().unwrap_or("Rate limited").to_string(),
            ),
            ConverseError::ValidationException(e) => (
                ProviderErrorKind::InvalidRequest,
                e.message().unwrap_or("Validation failed").to_string(),
            ),
            ConverseError::ModelNotReadyException(e) => (
                ProviderErrorKind::ServiceUnavailable,
                e.message().unwrap_or("Model not ready").to_string(),
            ),
            ConverseError::ModelTimeoutException(e) => (
                ProviderErrorKind::Timeout,
                e.message().unwrap_or("Model timeout").to_string(),
            ),
            ConverseError::ModelErrorException(e) => (
                ProviderErrorKind::ServiceUnavailable,
                e.message().unwrap_or("Model error").to_string(),
            ),
            ConverseError::InternalServerException(e) => (
                ProviderErrorKind::ServiceUnavailable,
                e.message().unwrap_or("Internal server error").to_string(),
            ),
            ConverseError::AccessDeniedException(e) => (
                ProviderErrorKind::Authentication,
                e.message().unwrap_or("Access denied").to_string(),
            ),
            ConverseError::ResourceNotFoundException(e) => (
                ProviderErrorKind::ModelNotFound,
                e.message().unwrap_or("Resource not found").to_string(),
            ),
            other => (
                ProviderErrorKind::Unknown,
                DisplayErrorContext(other).to_string(),
            ),
        },
        SdkError::TimeoutError(_) => (
            ProviderErrorKind::Timeout,
            DisplayErrorContext(&err).to_string(),
        ),
        SdkError::DispatchFailure(_) => {
            let message = DisplayErrorContext(&err).to_string();
            // Credential resolution happens at dispatch time
            let kind = if message.to_lowercase().contains("credential") {
                ProviderErrorKind::Authentication
            } else {
                ProviderErrorKind::Transport
            };
            (kind, message)
        }
        SdkError::ResponseError(_) => (
            ProviderErrorKind::MalformedResponse,
            DisplayErrorContext(&err).to_string(),
        ),
        SdkError::ConstructionFailure(_) => (
            ProviderErrorKind::Configuration,
            DisplayErrorContext(&err).to_string(),
        ),
        _ => (ProviderErrorKind::Unknown, DisplayErrorContext(&err).to_string()),
    };

    tracing::warn!(kind = %kind, error = %message, "Bedrock Converse call failed");
    ProviderApiError::new(Provider::Aws, kind, message)
}
