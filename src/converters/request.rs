//! Request normalization
//!
//! Turns a [`ModelRequest`] into the request body of the resolved provider.
//! The conversation is the message history followed by `prompt` as a final
//! user turn; an empty history with an empty prompt still yields a single
//! (empty) user turn.

use serde_json::{Map, Value};
use std::collections::HashMap;

use super::tools;
use crate::config::Settings;
use crate::schemas::bedrock::{
    BedrockConverseRequest, BedrockInferenceConfig, BedrockMessage, BedrockSystemMessage,
};
use crate::schemas::openai::{ChatCompletionRequest, ChatMessage, ChatRole};
use crate::schemas::router::{ChatTurn, ModelRequest, Provider, Role};
use crate::services::adapter::ProviderRequest;

const DEFAULT_MAX_TOKENS: i32 = 4096;

/// Bedrock temperature when the caller gives none. Model ids or aliases
/// containing one of the markers get the warmer value.
const WARM_TEMPERATURE: f32 = 0.9;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const WARM_MODEL_MARKERS: &[&str] = &[
    "llama",
    "anthropic",
    "amazon-premier",
    "titan-text-premier",
    "mistral-large",
    "mistral-small",
    "deepseek",
];

const AZURE_DEFAULT_TOP_P: f32 = 0.9;
const AZURE_DEFAULT_PENALTY: f32 = 0.0;

/// Chat completion knobs with no Converse counterpart. Kept out of
/// `additionalModelRequestFields`, which Bedrock model schemas validate.
const CHAT_ONLY_KEYS: &[&str] = &["presence_penalty", "frequency_penalty", "tool_choice", "stream"];

/// Named fields of the chat completion body. An extra with one of these
/// names would serialize as a duplicate key next to the field.
const CHAT_BODY_KEYS: &[&str] = &[
    "model",
    "messages",
    "temperature",
    "max_tokens",
    "top_p",
    "frequency_penalty",
    "presence_penalty",
    "stop",
    "stream",
    "tools",
    "tool_choice",
];

/// Builds provider request bodies from unified requests.
#[derive(Debug, Clone)]
pub struct RequestNormalizer {
    bedrock_model_ids: HashMap<String, String>,
    default_max_tokens: i32,
}

impl Default for RequestNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TOKENS)
    }
}

impl RequestNormalizer {
    pub fn new(default_max_tokens: i32) -> Self {
        Self {
            bedrock_model_ids: HashMap::new(),
            default_max_tokens,
        }
    }

    /// Alias table used to turn router names into Bedrock model ids.
    pub fn with_bedrock_model_ids(mut self, ids: HashMap<String, String>) -> Self {
        self.bedrock_model_ids = ids;
        self
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.default_max_tokens)
            .with_bedrock_model_ids(settings.bedrock_model_ids.clone())
    }

    /// Build the body for `provider`.
    pub fn normalize(&self, request: &ModelRequest, provider: Provider) -> ProviderRequest {
        match provider {
            Provider::Aws => ProviderRequest::Aws(self.to_bedrock(request)),
            Provider::Azure => ProviderRequest::Azure(self.to_azure(request)),
        }
    }

    /// Concrete Bedrock model id for a router model name; unknown names pass
    /// through untouched.
    pub fn bedrock_model_id(&self, model: &str) -> String {
        self.bedrock_model_ids
            .get(model)
            .cloned()
            .unwrap_or_else(|| model.to_string())
    }

    // ========================================================================
    // Bedrock
    // ========================================================================

    pub fn to_bedrock(&self, request: &ModelRequest) -> BedrockConverseRequest {
        let model_id = self.bedrock_model_id(&request.model);
        let params = &request.params;

        // Converse takes system text out of band, system_prompt first
        let mut system: Vec<BedrockSystemMessage> = non_blank(request.system_prompt.as_deref())
            .map(BedrockSystemMessage::new)
            .into_iter()
            .collect();

        let mut messages = Vec::new();
        for turn in conversation(request) {
            match turn.role {
                Role::System => system.push(BedrockSystemMessage::new(turn.content)),
                Role::User => messages.push(BedrockMessage::user(turn.content)),
                Role::Assistant => messages.push(BedrockMessage::assistant(turn.content)),
            }
        }

        let temperature = params
            .temperature
            .unwrap_or_else(|| default_bedrock_temperature(&request.model, &model_id));

        let inference_config = BedrockInferenceConfig::new(
            params.max_tokens.unwrap_or(self.default_max_tokens),
        )
        .with_temperature(temperature)
        .with_top_p(params.top_p)
        .with_stop_sequences(params.stop_sequences.clone());

        let mut additional = Map::new();
        if let Some(top_k) = params.top_k {
            additional.insert("top_k".to_string(), Value::from(top_k));
        }
        for (key, value) in &params.extra {
            if CHAT_ONLY_KEYS.contains(&key.as_str()) {
                tracing::debug!(model = %request.model, key = %key, "Bedrock has no such parameter; dropping it");
            } else {
                additional.insert(key.clone(), value.clone());
            }
        }

        tracing::debug!(
            model = %request.model,
            model_id = %model_id,
            messages = messages.len(),
            system_blocks = system.len(),
            "Built Bedrock Converse request"
        );

        BedrockConverseRequest {
            model_id,
            messages,
            inference_config,
            system: (!system.is_empty()).then_some(system),
            tool_config: request.tool_set().map(tools::to_bedrock),
            additional_model_request_fields: (!additional.is_empty())
                .then_some(Value::Object(additional)),
        }
    }

    // ========================================================================
    // Azure OpenAI
    // ========================================================================

    pub fn to_azure(&self, request: &ModelRequest) -> ChatCompletionRequest {
        let params = &request.params;
        let mut extra = params.extra.clone();

        let mut messages: Vec<ChatMessage> = non_blank(request.system_prompt.as_deref())
            .map(|text| ChatMessage::new(ChatRole::System, text))
            .into_iter()
            .collect();
        messages.extend(conversation(request).into_iter().map(|turn| {
            let role = match turn.role {
                Role::System => ChatRole::System,
                Role::User => ChatRole::User,
                Role::Assistant => ChatRole::Assistant,
            };
            ChatMessage::new(role, turn.content)
        }));

        if params.top_k.is_some() {
            tracing::debug!(model = %request.model, "Azure OpenAI has no top_k; dropping it");
        }

        let presence_penalty = take_f32(&mut extra, "presence_penalty").unwrap_or(AZURE_DEFAULT_PENALTY);
        let frequency_penalty = take_f32(&mut extra, "frequency_penalty").unwrap_or(AZURE_DEFAULT_PENALTY);

        let tools = request.tool_set().map(tools::to_azure);
        let requested_choice = extra.remove("tool_choice").filter(|v| !v.is_null());
        let tool_choice = tools
            .as_ref()
            .map(|_| requested_choice.unwrap_or_else(|| Value::from("auto")));

        for key in CHAT_BODY_KEYS {
            if extra.remove(*key).is_some() {
                tracing::debug!(model = %request.model, key = %key, "Ignoring extra that shadows a chat completion field");
            }
        }

        ChatCompletionRequest {
            model: request.model.clone(),
            messages,
            temperature: Some(params.temperature.unwrap_or(DEFAULT_TEMPERATURE)),
            max_tokens: Some(params.max_tokens.unwrap_or(self.default_max_tokens)),
            top_p: Some(params.top_p.unwrap_or(AZURE_DEFAULT_TOP_P)),
            frequency_penalty: Some(frequency_penalty),
            presence_penalty: Some(presence_penalty),
            stop: params.stop_sequences.clone().filter(|s| !s.is_empty()),
            stream: false,
            tools,
            tool_choice,
            extra,
        }
    }
}

/// History plus the prompt as the final user turn.
fn conversation(request: &ModelRequest) -> Vec<ChatTurn> {
    let mut turns = request.messages.clone();
    if turns.is_empty() || !request.prompt.is_empty() {
        turns.push(ChatTurn::user(request.prompt.clone()));
    }
    turns
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

fn default_bedrock_temperature(alias: &str, model_id: &str) -> f32 {
    let alias = alias.to_lowercase();
    let model_id = model_id.to_lowercase();
    let warm = WARM_MODEL_MARKERS
        .iter()
        .any(|marker| alias.contains(marker) || model_id.contains(marker));

    if warm {
        WARM_TEMPERATURE
    } else {
        DEFAULT_TEMPERATURE
    }
}

fn take_f32(extra: &mut Map<String, Value>, key: &str) -> Option<f32> {
    match extra.get(key).and_then(Value::as_f64) {
        Some(value) => {
            extra.remove(key);
            Some(value as f32)
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::router::InferenceParams;
    use crate::schemas::tool::{ToolDefinition, ToolSet};
    use serde_json::json;

    fn normalizer() -> RequestNormalizer {
        RequestNormalizer::from_settings(&Settings::default())
    }

    fn time_tools() -> ToolSet {
        ToolSet::new(vec![ToolDefinition::new(
            "get_current_time",
            "Get the current time",
            json!({"type": "object", "properties": {"timezone": {"type": "string"}}, "required": []}),
        )])
        .unwrap()
    }

    #[test]
    fn test_prompt_only_becomes_single_user_turn() {
        let body = normalizer().to_bedrock(&ModelRequest::new("anthropic-sonnet", "ping"));

        assert_eq!(body.model_id, "us.anthropic.claude-3-5-sonnet-20241022-v2:0");
        assert_eq!(body.messages, vec![BedrockMessage::user("ping")]);
        assert!(body.system.is_none());
        assert!(body.tool_config.is_none());
    }

    #[test]
    fn test_history_then_prompt() {
        let request = ModelRequest::new("gpt-4.1-mini", "and now?").with_messages(vec![
            ChatTurn::user("hi"),
            ChatTurn::assistant("hello"),
        ]);

        let body = normalizer().to_azure(&request);
        let roles: Vec<ChatRole> = body.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![ChatRole::User, ChatRole::Assistant, ChatRole::User]);
        assert_eq!(body.messages[2].content, "and now?");
    }

    #[test]
    fn test_empty_prompt_keeps_history_untouched() {
        let request = ModelRequest::new("mistral-small", "")
            .with_messages(vec![ChatTurn::user("only turn")]);

        let body = normalizer().to_bedrock(&request);
        assert_eq!(body.messages, vec![BedrockMessage::user("only turn")]);
    }

    #[test]
    fn test_empty_request_yields_one_empty_user_turn() {
        let body = normalizer().to_bedrock(&ModelRequest::new("mistral-small", ""));
        assert_eq!(body.messages, vec![BedrockMessage::user("")]);
    }

    #[test]
    fn test_bedrock_system_placement() {
        let request = ModelRequest::new("deepseek", "q")
            .with_system_prompt("Be terse")
            .with_messages(vec![ChatTurn::system("Answer in French"), ChatTurn::user("bonjour")]);

        let body = normalizer().to_bedrock(&request);
        let system: Vec<&str> = body.system.as_ref().unwrap().iter().map(|s| s.text.as_str()).collect();
        assert_eq!(system, vec!["Be terse", "Answer in French"]);
        assert!(body.messages.iter().all(|m| m.role != "system"));
        assert_eq!(body.messages.len(), 2);
    }

    #[test]
    fn test_blank_system_prompt_is_ignored() {
        let request = ModelRequest::new("gpt-4.1-mini", "q").with_system_prompt("   ");
        let body = normalizer().to_azure(&request);
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].role, ChatRole::User);
    }

    #[test]
    fn test_bedrock_default_temperature_by_family() {
        let n = normalizer();
        assert_eq!(n.to_bedrock(&ModelRequest::new("llama-3-3-70b", "x")).inference_config.temperature, Some(0.9));
        assert_eq!(n.to_bedrock(&ModelRequest::new("amazon-premier", "x")).inference_config.temperature, Some(0.9));
        assert_eq!(
            n.to_bedrock(&ModelRequest::new("cohere.command-r-v1:0", "x")).inference_config.temperature,
            Some(0.7)
        );
    }

    #[test]
    fn test_bedrock_params_and_extras() {
        let params = InferenceParams::new()
            .with_temperature(0.1)
            .with_max_tokens(300)
            .with_top_p(0.5)
            .with_top_k(40)
            .with_stop_sequences(vec!["END".to_string()])
            .with_extra("reasoning_config", json!({"type": "enabled"}));
        let request = ModelRequest::new("anthropic-haiku", "x").with_params(params);

        let body = normalizer().to_bedrock(&request);
        assert_eq!(body.inference_config.max_tokens, 300);
        assert_eq!(body.inference_config.temperature, Some(0.1));
        assert_eq!(body.inference_config.top_p, Some(0.5));
        assert_eq!(body.inference_config.stop_sequences, Some(vec!["END".to_string()]));
        assert_eq!(
            body.additional_model_request_fields,
            Some(json!({"top_k": 40, "reasoning_config": {"type": "enabled"}}))
        );
    }

    #[test]
    fn test_azure_defaults() {
        let body = normalizer().to_azure(&ModelRequest::new("gpt-4.1-mini", "x"));

        assert_eq!(body.model, "gpt-4.1-mini");
        assert_eq!(body.temperature, Some(0.7));
        assert_eq!(body.top_p, Some(0.9));
        assert_eq!(body.max_tokens, Some(4096));
        assert_eq!(body.presence_penalty, Some(0.0));
        assert_eq!(body.frequency_penalty, Some(0.0));
        assert!(!body.stream);
        assert!(body.tools.is_none());
        assert!(body.tool_choice.is_none());
        assert!(body.extra.is_empty());
    }

    #[test]
    fn test_azure_penalties_and_passthrough() {
        let params = InferenceParams::new()
            .with_top_k(5)
            .with_extra("presence_penalty", json!(0.6))
            .with_extra("seed", json!(42));
        let request = ModelRequest::new("gpt-4.1-mini", "x").with_params(params);

        let body = normalizer().to_azure(&request);
        assert_eq!(body.presence_penalty, Some(0.6));
        assert_eq!(body.extra.get("seed"), Some(&json!(42)));
        assert!(!body.extra.contains_key("presence_penalty"));

        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("top_k").is_none());
    }

    #[test]
    fn test_tools_attached_per_provider() {
        let request = ModelRequest::new("gpt-4.1-mini", "what time is it").with_tools(time_tools());
        let n = normalizer();

        let azure = n.to_azure(&request);
        assert_eq!(azure.tools.as_ref().unwrap().len(), 1);
        assert_eq!(azure.tool_choice, Some(json!("auto")));

        let bedrock = n.to_bedrock(&request.retarget("mistral-large"));
        assert_eq!(
            bedrock.tool_config.unwrap().tools[0].tool_spec.name,
            "get_current_time"
        );
    }

    #[test]
    fn test_empty_tool_set_is_omitted() {
        let request = ModelRequest::new("gpt-4.1-mini", "x").with_tools(ToolSet::default());
        let body = normalizer().to_azure(&request);
        assert!(body.tools.is_none());
        assert!(body.tool_choice.is_none());
    }

    #[test]
    fn test_normalize_tags_provider() {
        let n = normalizer();
        let request = ModelRequest::new("mistral-small", "x");
        assert_eq!(n.normalize(&request, Provider::Aws).provider(), Provider::Aws);
        assert_eq!(n.normalize(&request, Provider::Azure).provider(), Provider::Azure);
    }

    #[test]
    fn test_unmapped_model_passes_through() {
        let n = normalizer();
        assert_eq!(
            n.bedrock_model_id("anthropic.claude-3-7-sonnet-20250219-v1:0"),
            "anthropic.claude-3-7-sonnet-20250219-v1:0"
        );
    }

    #[test]
    fn test_chat_only_extras_stay_off_bedrock() {
        let params = InferenceParams::new()
            .with_extra("presence_penalty", json!(0.5))
            .with_extra("frequency_penalty", json!(0.2))
            .with_extra("tool_choice", json!("required"))
            .with_extra("stream", json!(true));
        let request = ModelRequest::new("gpt-4.1-mini", "x").with_params(params);

        // Same request after falling back to an AWS model
        let body = normalizer().to_bedrock(&request.retarget("mistral-small"));
        assert!(body.additional_model_request_fields.is_none());

        let params = InferenceParams::new()
            .with_top_k(10)
            .with_extra("presence_penalty", json!(0.5));
        let body = normalizer().to_bedrock(&ModelRequest::new("mistral-small", "x").with_params(params));
        assert_eq!(body.additional_model_request_fields, Some(json!({"top_k": 10})));
    }

    #[test]
    fn test_caller_tool_choice_overrides_auto() {
        let params = InferenceParams::new().with_extra("tool_choice", json!("required"));
        let request = ModelRequest::new("gpt-4.1-mini", "x")
            .with_params(params)
            .with_tools(time_tools());

        let body = normalizer().to_azure(&request);
        assert_eq!(body.tool_choice, Some(json!("required")));
        assert!(!body.extra.contains_key("tool_choice"));

        // Without tools there is nothing to choose from
        let params = InferenceParams::new().with_extra("tool_choice", json!("required"));
        let body = normalizer().to_azure(&ModelRequest::new("gpt-4.1-mini", "x").with_params(params));
        assert!(body.tool_choice.is_none());
    }

    #[test]
    fn test_azure_body_has_no_duplicate_keys() {
        let params = InferenceParams::new()
            .with_extra("stream", json!(true))
            .with_extra("tool_choice", json!("required"))
            .with_extra("model", json!("other-deployment"))
            .with_extra("messages", json!([]))
            .with_extra("max_tokens", json!(1))
            .with_extra("seed", json!(7));
        let request = ModelRequest::new("gpt-4.1-mini", "x")
            .with_params(params)
            .with_tools(time_tools());

        let body = normalizer().to_azure(&request);
        let text = serde_json::to_string(&body).unwrap();
        for key in CHAT_BODY_KEYS {
            let needle = format!("\"{}\":", key);
            assert!(text.matches(needle.as_str()).count() <= 1, "duplicate key {key} in {text}");
        }

        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["stream"], json!(false));
        assert_eq!(value["model"], json!("gpt-4.1-mini"));
        assert_eq!(value["max_tokens"], json!(4096));
        assert_eq!(value["tool_choice"], json!("required"));
        assert_eq!(value["seed"], json!(7));
    }
}
