//! The prompt-rewrite operation (spec §4.7): a one-shot, non-streaming
//! call that expands a user-authored system prompt with a fixed
//! meta-prompt. Does not use tools and does not enter the agent loop.

use gateway_model::{AiProvider, ChatMessage, GenerationRequest, Role};

use crate::error::EngineError;

/// Spec §4.7: "Inputs bounded <= 5,000 chars".
pub const MAX_INPUT_CHARS: usize = 5_000;
/// Spec §4.7: "output bounded by max_tokens = 2000".
pub const MAX_OUTPUT_TOKENS: u32 = 2_000;

const META_PROMPT: &str = "\
You are a prompt engineering expert. Rewrite the system prompt below into a \
more detailed, effective version. Preserve the original's intent and \
constraints exactly; add clarity, structure, and concrete guidance a \
language model can follow more reliably. Respond with only the rewritten \
prompt, no commentary.\n\nOriginal system prompt:\n";

/// Spec §4.7: "empty input triggers a generic default" — used verbatim
/// when the caller supplies an empty or whitespace-only prompt, skipping
/// the model call entirely.
const DEFAULT_PROMPT: &str = "You are a helpful, accurate, and friendly AI assistant. Respond clearly \
and concisely, ask clarifying questions when a request is ambiguous, and \
admit uncertainty rather than guessing.";

#[derive(Debug, Clone)]
pub struct EnhancedPrompt {
    pub enhanced_prompt: String,
    pub original_length: usize,
}

/// Runs the prompt-rewrite operation.
///
/// # Errors
///
/// Returns [`EngineError::Validation`] if `current_prompt` exceeds
/// [`MAX_INPUT_CHARS`], or the mapped [`EngineError`] variant if the model
/// call itself fails.
pub async fn enhance_prompt(provider: &dyn AiProvider, model: &str, current_prompt: &str) -> Result<EnhancedPrompt, EngineError> {
    let original_length = current_prompt.chars().count();

    if original_length > MAX_INPUT_CHARS {
        return Err(EngineError::Validation(format!(
            "current_prompt exceeds the {MAX_INPUT_CHARS}-character limit ({original_length} chars given)"
        )));
    }

    if current_prompt.trim().is_empty() {
        return Ok(EnhancedPrompt { enhanced_prompt: DEFAULT_PROMPT.to_string(), original_length: 0 });
    }

    let messages = vec![ChatMessage::new(Role::User, format!("{META_PROMPT}{current_prompt}"))];
    let request = GenerationRequest { model, messages: &messages, temperature: 0.7, max_tokens: MAX_OUTPUT_TOKENS };

    let completion = provider.generate(request).await?;

    Ok(EnhancedPrompt { enhanced_prompt: completion.content, original_length })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gateway_model::{ModelPricing, ProviderError, StreamChunk, TextCompletion, ToolAwareCompletion};
    use gateway_traits::ToolDescriptor;
    use std::pin::Pin;

    #[derive(Debug)]
    struct StubProvider;

    #[async_trait]
    impl AiProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }
        fn supports_model(&self, _model: &str) -> bool {
            true
        }
        fn default_model(&self) -> &str {
            "stub-model"
        }
        fn get_pricing(&self, _model: &str) -> ModelPricing {
            ModelPricing { input_cost_per_1k: 0.0, output_cost_per_1k: 0.0 }
        }
        fn supports_native_tool_calling(&self) -> bool {
            true
        }
        fn supports_streaming(&self) -> bool {
            true
        }
        async fn generate(&self, _request: GenerationRequest<'_>) -> Result<TextCompletion, ProviderError> {
            Ok(TextCompletion { content: "rewritten prompt".to_string(), usage: None })
        }
        async fn generate_with_tools(&self, _request: GenerationRequest<'_>, _tools: &[ToolDescriptor]) -> Result<ToolAwareCompletion, ProviderError> {
            unreachable!("enhance_prompt never requests tools")
        }
        async fn generate_stream(
            &self,
            _request: GenerationRequest<'_>,
        ) -> Result<Pin<Box<dyn futures_util::Stream<Item = Result<StreamChunk, ProviderError>> + Send>>, ProviderError> {
            unreachable!("enhance_prompt is non-streaming")
        }
        async fn generate_with_tools_stream(
            &self,
            _request: GenerationRequest<'_>,
            _tools: &[ToolDescriptor],
        ) -> Result<Pin<Box<dyn futures_util::Stream<Item = Result<StreamChunk, ProviderError>> + Send>>, ProviderError> {
            unreachable!("enhance_prompt is non-streaming")
        }
    }

    #[tokio::test]
    async fn empty_input_returns_default_without_calling_the_model() {
        let result = enhance_prompt(&StubProvider, "stub-model", "").await.unwrap();
        assert_eq!(result.original_length, 0);
        assert_eq!(result.enhanced_prompt, DEFAULT_PROMPT);
    }

    #[tokio::test]
    async fn non_empty_input_is_rewritten_by_the_model() {
        let result = enhance_prompt(&StubProvider, "stub-model", "Be a pirate.").await.unwrap();
        assert_eq!(result.original_length, 12);
        assert_eq!(result.enhanced_prompt, "rewritten prompt");
    }

    #[tokio::test]
    async fn oversized_input_is_rejected() {
        let huge = "a".repeat(MAX_INPUT_CHARS + 1);
        let err = enhance_prompt(&StubProvider, "stub-model", &huge).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
