//! Tool schema translation
//!
//! Converts a provider-neutral [`ToolSet`] into the tool declaration format of
//! each provider and back. Both directions preserve name, description and the
//! parameter schema (including `required`) exactly.

use serde_json::Value;

use crate::error::RouterError;
use crate::schemas::bedrock::{BedrockTool, BedrockToolConfig, BedrockToolInputSchema, BedrockToolSpec};
use crate::schemas::openai::{FunctionDef, Tool};
use crate::schemas::router::Provider;
use crate::schemas::tool::{ToolDefinition, ToolSet};

/// A tool declaration in one provider's format.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderTools {
    Aws(BedrockToolConfig),
    Azure(Vec<Tool>),
}

/// Translate a tool set for the given provider.
pub fn translate(tools: &ToolSet, provider: Provider) -> ProviderTools {
    match provider {
        Provider::Aws => ProviderTools::Aws(to_bedrock(tools)),
        Provider::Azure => ProviderTools::Azure(to_azure(tools)),
    }
}

/// Bedrock `toolConfig`: each tool becomes a `toolSpec` whose
/// `inputSchema.json` is the parameter schema.
pub fn to_bedrock(tools: &ToolSet) -> BedrockToolConfig {
    BedrockToolConfig {
        tools: tools
            .iter()
            .map(|tool| BedrockTool {
                tool_spec: BedrockToolSpec {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    input_schema: BedrockToolInputSchema {
                        json: tool.parameters.clone(),
                    },
                },
            })
            .collect(),
    }
}

/// Azure `tools` array of `{"type": "function", "function": {...}}` entries.
pub fn to_azure(tools: &ToolSet) -> Vec<Tool> {
    tools
        .iter()
        .map(|tool| {
            Tool::function(FunctionDef {
                name: tool.name.clone(),
                description: Some(tool.description.clone()),
                parameters: Some(tool.parameters.clone()),
            })
        })
        .collect()
}

pub fn from_bedrock(config: &BedrockToolConfig) -> Result<ToolSet, RouterError> {
    ToolSet::new(
        config
            .tools
            .iter()
            .map(|tool| {
                ToolDefinition::new(
                    tool.tool_spec.name.clone(),
                    tool.tool_spec.description.clone(),
                    tool.tool_spec.input_schema.json.clone(),
                )
            })
            .collect(),
    )
}

pub fn from_azure(tools: &[Tool]) -> Result<ToolSet, RouterError> {
    ToolSet::new(
        tools
            .iter()
            .map(|tool| {
                ToolDefinition::new(
                    tool.function.name.clone(),
                    tool.function.description.clone().unwrap_or_default(),
                    tool.function
                        .parameters
                        .clone()
                        .unwrap_or_else(|| Value::Object(Default::default())),
                )
            })
            .collect(),
    )
}

pub fn from_provider(tools: &ProviderTools) -> Result<ToolSet, RouterError> {
    match tools {
        ProviderTools::Aws(config) => from_bedrock(config),
        ProviderTools::Azure(tools) => from_azure(tools),
    }
}
