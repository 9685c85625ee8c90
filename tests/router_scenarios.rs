//! End-to-end routing scenarios against in-process fake providers.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use model_router::converters::RequestNormalizer;
use model_router::error::AttemptFailure;
use model_router::schemas::bedrock::{
    BedrockContentBlock, BedrockConverseRequest, BedrockConverseResponse, BedrockTokenUsage,
    BedrockToolUse,
};
use model_router::schemas::openai::{
    ChatCompletionRequest, ChatCompletionResponse, ChatRole, CompletionUsage,
};
use model_router::schemas::{ChatTurn, ToolDefinition};
use model_router::{
    FallbackPolicy, ModelRequest, ModelRouter, Provider, ProviderAdapter, ProviderApiError,
    ProviderErrorKind, ProviderRegistry, RouterError, ToolSet,
};
use serde_json::json;

// ============================================================================
// Fake providers
// ============================================================================

/// Replays scripted results in order, then falls back to a default reply.
/// Every request body is recorded.
struct FakeProvider<Req, Resp> {
    provider: Provider,
    script: Mutex<VecDeque<Result<Resp, ProviderApiError>>>,
    default_reply: fn(&Req) -> Resp,
    calls: Mutex<Vec<Req>>,
}

impl<Req: Clone, Resp> FakeProvider<Req, Resp> {
    fn new(provider: Provider, default_reply: fn(&Req) -> Resp) -> Self {
        Self {
            provider,
            script: Mutex::new(VecDeque::new()),
            default_reply,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn then(self, result: Result<Resp, ProviderApiError>) -> Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    fn calls(&self) -> Vec<Req> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl<Req, Resp> ProviderAdapter for FakeProvider<Req, Resp>
where
    Req: Clone + Send + Sync + 'static,
    Resp: Send + Sync + 'static,
{
    type Request = Req;
    type Response = Resp;

    fn provider(&self) -> Provider {
        self.provider
    }

    async fn call(&self, request: Req) -> Result<Resp, ProviderApiError> {
        let reply = (self.default_reply)(&request);
        self.calls.lock().unwrap().push(request);
        self.script.lock().unwrap().pop_front().unwrap_or(Ok(reply))
    }
}

type FakeBedrock = FakeProvider<BedrockConverseRequest, BedrockConverseResponse>;
type FakeAzure = FakeProvider<ChatCompletionRequest, ChatCompletionResponse>;

fn bedrock_reply(request: &BedrockConverseRequest) -> BedrockConverseResponse {
    BedrockConverseResponse::from_text(
        format!("bedrock answer from {}", request.model_id),
        BedrockTokenUsage::new(12, 8),
    )
}

fn azure_reply(request: &ChatCompletionRequest) -> ChatCompletionResponse {
    ChatCompletionResponse::from_text(
        &request.model,
        "azure answer",
        CompletionUsage::new(20, 5),
    )
}

fn fake_bedrock() -> FakeBedrock {
    FakeProvider::new(Provider::Aws, bedrock_reply)
}

fn fake_azure() -> FakeAzure {
    FakeProvider::new(Provider::Azure, azure_reply)
}

fn throttled(provider: Provider) -> ProviderApiError {
    ProviderApiError::new(provider, ProviderErrorKind::Throttled, "Too many requests")
}

fn router_with(
    bedrock: Arc<FakeBedrock>,
    azure: Arc<FakeAzure>,
    policy: FallbackPolicy,
) -> ModelRouter {
    ModelRouter::new(
        ProviderRegistry::with_defaults(),
        RequestNormalizer::default(),
        bedrock,
        azure,
        policy,
    )
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_healthy_aws_request() {
    let bedrock = Arc::new(fake_bedrock());
    let azure = Arc::new(fake_azure());
    let router = router_with(bedrock.clone(), azure.clone(), FallbackPolicy::default());

    let response = router
        .route(ModelRequest::new("llama-3-3-70b", "Hello"))
        .await
        .unwrap();

    assert_eq!(response.provider, Provider::Aws);
    assert_eq!(response.model, "llama-3-3-70b");
    assert!(response.content.starts_with("bedrock answer"));
    assert_eq!(response.usage.prompt_tokens, 12);
    assert_eq!(response.usage.completion_tokens, 8);
    assert_eq!(response.usage.total_tokens, 20);
    assert!(!response.fallback_used());

    let calls = bedrock.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].messages.len(), 1);
    assert_eq!(calls[0].messages[0].role, "user");
    assert!(azure.calls().is_empty());

    let body = serde_json::to_value(&response).unwrap();
    assert!(body.get("fallback_used").is_none());
    assert!(body.get("tool_calls").is_none());
}

#[tokio::test]
async fn test_anthropic_ping_has_no_fallback_fields() {
    let bedrock = Arc::new(fake_bedrock());
    let azure = Arc::new(fake_azure());
    let router = router_with(bedrock.clone(), azure.clone(), FallbackPolicy::default());

    let response = router
        .route(ModelRequest::new("anthropic-sonnet", "ping"))
        .await
        .unwrap();

    assert_eq!(response.provider, Provider::Aws);
    assert_eq!(response.model, "anthropic-sonnet");
    assert!(!response.fallback_used());
    assert_eq!(bedrock.calls().len(), 1);
    assert!(azure.calls().is_empty());

    let body = serde_json::to_value(&response).unwrap();
    for key in ["fallback_used", "original_model", "fallback_reason"] {
        assert!(body.get(key).is_none(), "unexpected key {}", key);
    }
}

#[tokio::test]
async fn test_unknown_model_surfaces_without_calls() {
    let bedrock = Arc::new(fake_bedrock());
    let azure = Arc::new(fake_azure());
    let router = router_with(bedrock.clone(), azure.clone(), FallbackPolicy::default());

    let err = router
        .route(ModelRequest::new("not-a-real-model", "Hello"))
        .await
        .unwrap_err();

    assert_eq!(err, RouterError::UnknownModel("not-a-real-model".to_string()));
    assert!(bedrock.calls().is_empty());
    assert!(azure.calls().is_empty());
}

#[tokio::test]
async fn test_azure_message_ordering() {
    let bedrock = Arc::new(fake_bedrock());
    let azure = Arc::new(fake_azure());
    let router = router_with(bedrock, azure.clone(), FallbackPolicy::default());

    let request = ModelRequest::new("gpt-4.1-mini", "And now?")
        .with_system_prompt("Be brief.")
        .with_messages(vec![
            ChatTurn::user("Hi"),
            ChatTurn::assistant("Hello!"),
        ]);

    let response = router.route(request).await.unwrap();
    assert_eq!(response.provider, Provider::Azure);
    assert_eq!(response.content, "azure answer");

    let calls = azure.calls();
    assert_eq!(calls.len(), 1);
    let roles: Vec<ChatRole> = calls[0].messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![ChatRole::System, ChatRole::User, ChatRole::Assistant, ChatRole::User]
    );
    assert_eq!(calls[0].messages[0].content, "Be brief.");
    assert_eq!(calls[0].messages[3].content, "And now?");
}

#[tokio::test]
async fn test_forced_aws_failure_uses_fallback() {
    let bedrock = Arc::new(fake_bedrock().then(Err(throttled(Provider::Aws))));
    let azure = Arc::new(fake_azure());
    let router = router_with(bedrock.clone(), azure, FallbackPolicy::default());

    let response = router
        .route(ModelRequest::new("llama-3-3-70b", "Hello"))
        .await
        .unwrap();

    assert!(response.fallback_used());
    assert_eq!(response.model, "mistral-small");
    assert_eq!(response.provider, Provider::Aws);

    let fallback = response.fallback.as_ref().unwrap();
    assert_eq!(fallback.original_model, "llama-3-3-70b");
    assert!(fallback.fallback_reason.contains("throttled"));

    let calls = bedrock.calls();
    assert_eq!(calls.len(), 2);
    assert_ne!(calls[0].model_id, calls[1].model_id);

    let body = serde_json::to_value(&response).unwrap();
    assert_eq!(body["fallback_used"], true);
    assert_eq!(body["original_model"], "llama-3-3-70b");
    assert!(body["fallback_reason"].is_string());
}

#[tokio::test]
async fn test_azure_failure_falls_back_to_aws() {
    let bedrock = Arc::new(fake_bedrock());
    let azure = Arc::new(fake_azure().then(Err(ProviderApiError::new(
        Provider::Azure,
        ProviderErrorKind::Authentication,
        "Access denied due to invalid subscription key",
    ))));
    let router = router_with(bedrock.clone(), azure.clone(), FallbackPolicy::default());

    let response = router
        .route(ModelRequest::new("gpt-4.1-mini", "Hello"))
        .await
        .unwrap();

    assert_eq!(response.provider, Provider::Aws);
    assert_eq!(response.model, "mistral-small");
    assert_eq!(azure.calls().len(), 1);
    assert_eq!(bedrock.calls().len(), 1);
}

#[tokio::test]
async fn test_duplicate_tool_names_rejected() {
    let tool = ToolDefinition::new("search_web", "Search", json!({"type": "object"}));
    let err = ToolSet::new(vec![tool.clone(), tool]).unwrap_err();
    assert!(matches!(err, RouterError::InvalidRequest(_)));

    let parsed: Result<ModelRequest, _> = serde_json::from_value(json!({
        "model": "llama-3-3-70b",
        "prompt": "hi",
        "tools": [
            {"name": "a", "parameters": {"type": "object"}},
            {"name": "a", "parameters": {"type": "object"}}
        ]
    }));
    assert!(parsed.is_err());
}

#[tokio::test]
async fn test_fallback_exhausted_keeps_both_causes() {
    let bedrock = Arc::new(
        fake_bedrock()
            .then(Err(throttled(Provider::Aws)))
            .then(Err(ProviderApiError::timeout(Provider::Aws, "deadline exceeded"))),
    );
    let azure = Arc::new(fake_azure());
    let router = router_with(bedrock.clone(), azure, FallbackPolicy::default());

    let err = router
        .route(ModelRequest::new("anthropic-sonnet", "Hello"))
        .await
        .unwrap_err();

    match &err {
        RouterError::FallbackExhausted {
            original_model,
            fallback_model,
            original_cause,
            fallback_cause,
        } => {
            assert_eq!(original_model, "anthropic-sonnet");
            assert_eq!(fallback_model, "mistral-small");
            assert!(matches!(
                original_cause,
                AttemptFailure::Provider(e) if e.kind == ProviderErrorKind::Throttled
            ));
            assert!(matches!(
                fallback_cause,
                AttemptFailure::Provider(e) if e.kind == ProviderErrorKind::Timeout
            ));
        }
        other => panic!("expected FallbackExhausted, got {other:?}"),
    }

    let message = err.to_string();
    assert!(message.contains("anthropic-sonnet"));
    assert!(message.contains("mistral-small"));
    assert_eq!(bedrock.calls().len(), 2);
}

#[tokio::test]
async fn test_fallback_model_failure_is_not_retried() {
    let bedrock = Arc::new(fake_bedrock().then(Err(throttled(Provider::Aws))));
    let azure = Arc::new(fake_azure());
    let router = router_with(bedrock.clone(), azure, FallbackPolicy::default());

    let err = router
        .route(ModelRequest::new("mistral-small", "Hello"))
        .await
        .unwrap_err();

    assert_eq!(err, RouterError::Provider(throttled(Provider::Aws)));
    assert_eq!(bedrock.calls().len(), 1);
}

#[tokio::test]
async fn test_disabled_policy_returns_primary_error() {
    let bedrock = Arc::new(fake_bedrock().then(Err(throttled(Provider::Aws))));
    let azure = Arc::new(fake_azure());
    let router = router_with(bedrock.clone(), azure, FallbackPolicy::disabled());

    let err = router
        .route(ModelRequest::new("llama-3-3-70b", "Hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, RouterError::Provider(ref e) if e.kind == ProviderErrorKind::Throttled));
    assert_eq!(bedrock.calls().len(), 1);
}

#[tokio::test]
async fn test_empty_response_triggers_fallback() {
    let bedrock = Arc::new(fake_bedrock().then(Ok(BedrockConverseResponse::from_text(
        "   ",
        BedrockTokenUsage::new(4, 0),
    ))));
    let azure = Arc::new(fake_azure());
    let router = router_with(bedrock.clone(), azure, FallbackPolicy::default());

    let response = router
        .route(ModelRequest::new("deepseek", "Hello"))
        .await
        .unwrap();

    assert!(response.fallback_used());
    assert_eq!(response.model, "mistral-small");
    assert!(response
        .fallback
        .as_ref()
        .unwrap()
        .fallback_reason
        .contains("empty response"));
}

#[tokio::test]
async fn test_empty_response_without_fallback() {
    let bedrock = Arc::new(fake_bedrock().then(Ok(BedrockConverseResponse::from_text(
        "",
        BedrockTokenUsage::new(4, 0),
    ))));
    let azure = Arc::new(fake_azure());
    let router = router_with(bedrock, azure, FallbackPolicy::disabled());

    let err = router
        .route(ModelRequest::new("deepseek", "Hello"))
        .await
        .unwrap_err();
    assert_eq!(err, RouterError::EmptyResponse("deepseek".to_string()));
}

#[tokio::test]
async fn test_tool_call_only_response_is_success() {
    let mut reply = BedrockConverseResponse::from_text("", BedrockTokenUsage::new(30, 10));
    reply.output.message.content = vec![BedrockContentBlock::ToolUse {
        tool_use: BedrockToolUse {
            tool_use_id: "tooluse_1".to_string(),
            name: "search_web".to_string(),
            input: json!({"query": "rust"}),
        },
    }];
    reply.stop_reason = "tool_use".to_string();

    let bedrock = Arc::new(fake_bedrock().then(Ok(reply)));
    let azure = Arc::new(fake_azure());
    let router = router_with(bedrock.clone(), azure, FallbackPolicy::default());

    let tools = ToolSet::new(vec![ToolDefinition::new(
        "search_web",
        "Search the web",
        json!({"type": "object", "properties": {"query": {"type": "string"}}, "required": ["query"]}),
    )])
    .unwrap();

    let response = router
        .route(ModelRequest::new("anthropic-haiku", "Find rust news").with_tools(tools))
        .await
        .unwrap();

    assert!(!response.fallback_used());
    assert!(response.content.is_empty());
    let calls = response.tool_calls.as_ref().unwrap();
    assert_eq!(calls[0].name, "search_web");
    assert_eq!(calls[0].input, json!({"query": "rust"}));

    let sent = bedrock.calls();
    let tool_config = sent[0].tool_config.as_ref().unwrap();
    assert_eq!(tool_config.tools[0].tool_spec.name, "search_web");
}

#[tokio::test]
async fn test_fallback_on_unknown_model_when_enabled() {
    let bedrock = Arc::new(fake_bedrock());
    let azure = Arc::new(fake_azure());
    let router = router_with(
        bedrock.clone(),
        azure,
        FallbackPolicy::default().with_fallback_on_unknown_model(true),
    );

    let response = router
        .route(ModelRequest::new("not-a-real-model", "Hello"))
        .await
        .unwrap();

    assert!(response.fallback_used());
    assert_eq!(response.model, "mistral-small");
    assert_eq!(bedrock.calls().len(), 1);
}

#[tokio::test]
async fn test_runtime_registration() {
    let bedrock = Arc::new(fake_bedrock());
    let azure = Arc::new(fake_azure());
    let router = router_with(bedrock, azure.clone(), FallbackPolicy::default());

    assert!(router.resolve("my-gpt-deployment").await.is_err());
    let replaced = router
        .register_model("my-gpt-deployment", Provider::Azure)
        .await
        .unwrap();
    assert_eq!(replaced, None);

    let response = router
        .route(ModelRequest::new("my-gpt-deployment", "Hello"))
        .await
        .unwrap();
    assert_eq!(response.provider, Provider::Azure);
    assert_eq!(azure.calls()[0].model, "my-gpt-deployment");

    let models = router.list_models().await;
    assert!(models[&Provider::Azure].contains(&"my-gpt-deployment".to_string()));
}

#[tokio::test]
async fn test_empty_model_is_invalid() {
    let bedrock = Arc::new(fake_bedrock());
    let azure = Arc::new(fake_azure());
    let router = router_with(bedrock.clone(), azure, FallbackPolicy::default());

    let err = router.route(ModelRequest::new("", "Hello")).await.unwrap_err();
    assert!(matches!(err, RouterError::InvalidRequest(_)));
    assert!(bedrock.calls().is_empty());
}
