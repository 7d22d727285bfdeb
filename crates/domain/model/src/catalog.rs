//! Resolves a requested `(provider, model)` pair to a concrete
//! [`AiProvider`] instance.

use std::collections::HashMap;
use std::sync::Arc;

use crate::provider::AiProvider;
use crate::providers::{AnthropicProvider, GeminiProvider, OpenAiProvider};

#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider {provider} does not offer model {model}")]
    UnknownModel { provider: String, model: String },
}

/// Constructs one [`AiProvider`] per configured vendor API key and resolves
/// lookups by provider name. Holding one instance per provider (rather
/// than constructing one per request) is what lets `reqwest::Client`'s
/// connection pool actually amortize across requests (spec §5).
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn AiProvider>>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from provider-name-to-API-key pairs (typically
    /// `GatewayConfig::provider_api_keys`).
    #[must_use]
    pub fn from_api_keys(keys: &HashMap<String, String>) -> Self {
        let mut registry = Self::new();
        for (provider, key) in keys {
            match provider.as_str() {
                "openai" => registry.insert(Arc::new(OpenAiProvider::new(key.clone()))),
                "anthropic" => registry.insert(Arc::new(AnthropicProvider::new(key.clone()))),
                "gemini" => registry.insert(Arc::new(GeminiProvider::new(key.clone()))),
                _ => tracing::warn!(provider = %provider, "ignoring API key for unrecognized provider"),
            }
        }
        registry
    }

    pub fn insert(&mut self, provider: Arc<dyn AiProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    /// Resolves `provider`/`model`, validating both are known.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::UnknownProvider`] if no provider is
    /// registered under that name, or
    /// [`SelectionError::UnknownModel`] if the provider does not claim to
    /// support that model id.
    pub fn resolve(&self, provider: &str, model: &str) -> Result<Arc<dyn AiProvider>, SelectionError> {
        let instance = self
            .providers
            .get(provider)
            .ok_or_else(|| SelectionError::UnknownProvider(provider.to_string()))?;

        if !instance.supports_model(model) {
            return Err(SelectionError::UnknownModel {
                provider: provider.to_string(),
                model: model.to_string(),
            });
        }

        Ok(Arc::clone(instance))
    }

    #[must_use]
    pub fn has_provider(&self, provider: &str) -> bool {
        self.providers.contains_key(provider)
    }

    /// Returns the named provider's live instance without validating a
    /// model against it, for callers (the prompt-rewrite operation) that
    /// invoke a provider's own default model rather than a caller-chosen
    /// one.
    #[must_use]
    pub fn get(&self, provider: &str) -> Option<Arc<dyn AiProvider>> {
        self.providers.get(provider).map(Arc::clone)
    }

    /// The first registered provider in name order, used as the
    /// prompt-rewrite operation's fixed model when no specific provider is
    /// requested (spec §4.7: "invoke a fixed model").
    #[must_use]
    pub fn any_provider(&self) -> Option<Arc<dyn AiProvider>> {
        let mut names: Vec<&String> = self.providers.keys().collect();
        names.sort();
        names.first().and_then(|name| self.providers.get(*name)).map(Arc::clone)
    }
}
