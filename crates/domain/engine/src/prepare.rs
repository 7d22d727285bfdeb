//! Spec §4.6 "Inputs and guards": validates an [`AgentRequest`], resolves
//! its model-provider pair, assembles its [`ToolCatalog`], and composes
//! its system prompt — everything [`crate::agent::run`] needs before the
//! loop starts, bundled into a [`LoopInputs`].
//!
//! Field-shape validation (message length, temperature/max_tokens ranges)
//! happens one layer up, in `gateway-api`'s request DTOs — this module
//! only validates what requires domain knowledge the API layer doesn't
//! have: whether a provider/model pair is actually registered, and
//! whether the assembled catalog satisfies the requested completion mode.

use gateway_config::ProviderModelCatalog;
use gateway_model::{select_strategy, ProviderRegistry};

use crate::agent::LoopInputs;
use crate::catalog::ToolCatalog;
use crate::error::EngineError;
use crate::prompt::{compose_system_prompt, prepare_history};
use crate::registry::ServiceRegistry;
use crate::types::{AgentRequest, CompletionMode, Persona};

/// Process-wide collaborators [`prepare`] needs read-only access to.
/// Built once at startup and shared across every request (spec §5: "the
/// Service Registry is read-only after startup").
pub struct PrepareContext<'a> {
    pub service_registry: &'a ServiceRegistry,
    pub provider_registry: &'a ProviderRegistry,
    pub model_catalog: &'a ProviderModelCatalog,
    pub max_history_chars: usize,
}

/// Validates and assembles one [`AgentRequest`] into the [`LoopInputs`]
/// the agent loop is driven with.
///
/// # Errors
///
/// Returns [`EngineError::InvalidProvider`] / [`EngineError::InvalidModel`]
/// if the requested pair is not on the operator's allow-list or not
/// registered with a live provider instance, and
/// [`EngineError::ToolsRequiredButNoneAvailable`] if `completion_mode` is
/// `tools_required` but the assembled catalog is empty after filtering.
pub async fn prepare(request: AgentRequest, ctx: &PrepareContext<'_>) -> Result<LoopInputs, EngineError> {
    let provider_name = request.agent_config.provider.as_str();
    let model_name = request.agent_config.model.as_str();

    if !ctx.model_catalog.has_provider(provider_name) {
        return Err(EngineError::InvalidProvider(provider_name.to_string()));
    }
    if !ctx.model_catalog.allows(provider_name, model_name) {
        return Err(EngineError::InvalidModel(model_name.to_string()));
    }
    let provider = ctx.provider_registry.resolve(provider_name, model_name)?;

    let strategy = select_strategy(provider.supports_native_tool_calling());

    let mut catalog = ToolCatalog::assemble(ctx.service_registry, &request.services).await.filter_allowed(request.allowed_tools.as_deref());

    // Spec §4.6 completion-mode enforcement: `completion_only` never binds
    // tools to the model at all, regardless of what the caller requested.
    if request.completion_mode == CompletionMode::CompletionOnly {
        catalog = ToolCatalog::default();
    }

    if request.completion_mode == CompletionMode::ToolsRequired && catalog.is_empty() {
        return Err(EngineError::ToolsRequiredButNoneAvailable);
    }

    let persona = Persona::parse(&request.agent_config.persona);
    let system_prompt = compose_system_prompt(
        persona,
        request.agent_config.custom_system_prompt.as_deref(),
        Some(request.user_id.as_str()),
        strategy,
        !catalog.is_empty(),
    );

    let history = prepare_history(&request.conversation_history, ctx.max_history_chars);

    Ok(LoopInputs {
        conversation_id: request.conversation_id,
        provider,
        model: request.agent_config.model,
        temperature: request.agent_config.temperature,
        max_tokens: request.agent_config.max_tokens,
        system_prompt,
        history,
        user_message: request.message,
        catalog,
        strategy,
        completion_mode: request.completion_mode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_identifiers::{ConversationId, UserId};
    use gateway_traits::Credentials;

    fn base_request() -> AgentRequest {
        AgentRequest {
            user_id: UserId::new("user-1"),
            conversation_id: ConversationId::new("conv-1"),
            message: "hello".to_string(),
            completion_mode: CompletionMode::Auto,
            allowed_tools: None,
            agent_config: crate::types::AgentConfig {
                provider: "openai".to_string(),
                model: "gpt-4o".to_string(),
                temperature: 0.7,
                max_tokens: 512,
                persona: "assistant".to_string(),
                custom_system_prompt: None,
            },
            services: Vec::new(),
            conversation_history: Vec::new(),
        }
    }

    fn ctx(model_catalog: &ProviderModelCatalog, provider_registry: &ProviderRegistry, service_registry: &ServiceRegistry) -> PrepareContext<'_> {
        PrepareContext { service_registry, provider_registry, model_catalog, max_history_chars: 24_000 }
    }

    #[tokio::test]
    async fn unknown_provider_is_rejected_before_touching_the_registry() {
        let catalog = ProviderModelCatalog::default_catalog();
        let providers = ProviderRegistry::new();
        let services = ServiceRegistry::discover();
        let mut request = base_request();
        request.agent_config.provider = "not-a-real-vendor".to_string();

        let err = prepare(request, &ctx(&catalog, &providers, &services)).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidProvider(_)));
    }

    #[tokio::test]
    async fn unknown_model_for_known_provider_is_rejected() {
        let catalog = ProviderModelCatalog::default_catalog();
        let providers = ProviderRegistry::new();
        let services = ServiceRegistry::discover();
        let mut request = base_request();
        request.agent_config.model = "not-a-real-model".to_string();

        let err = prepare(request, &ctx(&catalog, &providers, &services)).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidModel(_)));
    }

    #[tokio::test]
    async fn tools_required_with_no_services_is_rejected() {
        let catalog = ProviderModelCatalog::default_catalog();
        let mut providers = ProviderRegistry::new();
        providers.insert(std::sync::Arc::new(gateway_model::providers::OpenAiProvider::new("test-key".to_string())));
        let services = ServiceRegistry::discover();
        let mut request = base_request();
        request.completion_mode = CompletionMode::ToolsRequired;

        let err = prepare(request, &ctx(&catalog, &providers, &services)).await.unwrap_err();
        assert!(matches!(err, EngineError::ToolsRequiredButNoneAvailable));
    }

    #[tokio::test]
    async fn completion_only_empties_the_catalog_even_with_bindings() {
        let catalog = ProviderModelCatalog::default_catalog();
        let mut providers = ProviderRegistry::new();
        providers.insert(std::sync::Arc::new(gateway_model::providers::OpenAiProvider::new("test-key".to_string())));
        let services = ServiceRegistry::discover();
        let mut request = base_request();
        request.completion_mode = CompletionMode::CompletionOnly;
        request.services = vec![crate::types::ServiceBinding {
            class_id: "builtin".to_string(),
            selection_mode: crate::types::SelectionMode::All,
            selected_tools: Vec::new(),
            credentials: Credentials::default(),
            config: serde_json::Value::Null,
        }];

        let inputs = prepare(request, &ctx(&catalog, &providers, &services)).await.unwrap();
        assert!(inputs.catalog.is_empty());
    }
}
