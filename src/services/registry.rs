//! Provider registry
//!
//! Maps model identifiers to the provider that serves them. Lookup tries an
//! exact key first and then the longest registered key that prefixes the
//! identifier, so registering `anthropic.` covers every Anthropic model id
//! while a more specific entry can still override it.

use std::collections::BTreeMap;

use crate::error::RouterError;
use crate::schemas::router::Provider;

/// Built-in aliases, model ids and family prefixes.
const BUILTIN_ENTRIES: &[(&str, Provider)] = &[
    // Router aliases served by Bedrock
    ("llama-3-2-3b", Provider::Aws),
    ("llama-3-3-70b", Provider::Aws),
    ("llama-3-1-70b", Provider::Aws),
    ("mixtral-8x7b", Provider::Aws),
    ("amazon-premier", Provider::Aws),
    ("mistral-large", Provider::Aws),
    ("mistral-small", Provider::Aws),
    ("anthropic-sonnet", Provider::Aws),
    ("anthropic-haiku", Provider::Aws),
    ("deepseek", Provider::Aws),
    // Retired Bedrock ids still accepted
    ("anthropic.claude-3-sonnet-20240229-v1:0", Provider::Aws),
    ("anthropic.claude-3-haiku-20240307-v1:0", Provider::Aws),
    ("anthropic.claude-3-opus-20240229-v1:0", Provider::Aws),
    ("amazon.titan-text-express-v1", Provider::Aws),
    ("amazon.titan-text-lite-v1", Provider::Aws),
    ("meta.llama2-13b-chat-v1", Provider::Aws),
    ("meta.llama2-70b-chat-v1", Provider::Aws),
    ("meta.llama3-8b-instruct-v1:0", Provider::Aws),
    ("meta.llama3-70b-instruct-v1:0", Provider::Aws),
    ("mistral.mistral-7b-instruct-v0:2", Provider::Aws),
    ("mistral.mixtral-8x7b-instruct-v0:1", Provider::Aws),
    ("cohere.command-r-v1:0", Provider::Aws),
    ("cohere.command-r-plus-v1:0", Provider::Aws),
    // Family prefixes
    ("anthropic.", Provider::Aws),
    ("amazon.", Provider::Aws),
    ("meta.", Provider::Aws),
    ("mistral.", Provider::Aws),
    ("mistral", Provider::Aws),
    ("cohere.", Provider::Aws),
    ("us.", Provider::Aws),
    // Azure deployments
    ("gpt-4.1-mini", Provider::Azure),
    ("gpt-", Provider::Azure),
    ("claude-", Provider::Azure),
];

/// Model identifier (or prefix) to provider table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRegistry {
    entries: BTreeMap<String, Provider>,
}

impl ProviderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// A registry preloaded with the built-in model table.
    pub fn with_defaults() -> Self {
        Self {
            entries: BUILTIN_ENTRIES
                .iter()
                .map(|(key, provider)| (key.to_string(), *provider))
                .collect(),
        }
    }

    /// Find the provider for a model identifier.
    pub fn resolve(&self, model_id: &str) -> Result<Provider, RouterError> {
        if let Some(provider) = self.entries.get(model_id) {
            return Ok(*provider);
        }

        self.entries
            .iter()
            .filter(|(key, _)| model_id.starts_with(key.as_str()))
            .max_by_key(|(key, _)| key.len())
            .map(|(_, provider)| *provider)
            .ok_or_else(|| RouterError::UnknownModel(model_id.to_string()))
    }

    /// Add or replace a mapping. Returns the provider previously registered
    /// under the same key.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        provider: Provider,
    ) -> Result<Option<Provider>, RouterError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(RouterError::InvalidRequest(
                "model identifier must not be empty".to_string(),
            ));
        }

        tracing::debug!(model = %key, provider = %provider, "Registering model mapping");
        Ok(self.entries.insert(key, provider))
    }

    /// Registered keys grouped by provider, each group sorted.
    pub fn list(&self) -> BTreeMap<Provider, Vec<String>> {
        let mut grouped: BTreeMap<Provider, Vec<String>> = BTreeMap::new();
        for (key, provider) in &self.entries {
            grouped.entry(*provider).or_default().push(key.clone());
        }
        grouped
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl<K: Into<String>> FromIterator<(K, Provider)> for ProviderRegistry {
    fn from_iter<I: IntoIterator<Item = (K, Provider)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, p)| (k.into(), p)).collect(),
        }
    }
}
