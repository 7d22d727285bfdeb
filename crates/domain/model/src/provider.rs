//! The uniform facade every vendor provider implements.
//!
//! Generalizes the teacher's `AiProvider` trait
//! (`domain/ai/src/services/providers/provider_trait.rs`) down to what the
//! gateway actually needs: a single request shape carrying optional tools,
//! and streaming variants. Capabilities the teacher exposes that this spec
//! has no caller for (structured-output schemas, Google Search grounding,
//! JSON mode) are dropped rather than carried as unused surface.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use gateway_traits::ToolDescriptor;

use crate::message::{ChatMessage, StreamChunk, TextCompletion, ToolAwareCompletion};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("model {0} is not offered by this provider")]
    UnsupportedModel(String),
    #[error("this provider does not support streaming")]
    StreamingUnsupported,
    #[error("upstream vendor API rejected the request: {0}")]
    VendorRejected(String),
    #[error("upstream vendor API is unreachable: {0}")]
    Unavailable(String),
    #[error("request to vendor API timed out")]
    Timeout,
    #[error("vendor response could not be parsed: {0}")]
    MalformedResponse(String),
}

/// Per-1k-token pricing, used for `done.metadata` cost reporting.
#[derive(Debug, Clone, Copy)]
pub struct ModelPricing {
    pub input_cost_per_1k: f32,
    pub output_cost_per_1k: f32,
}

/// Parameters common to every generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait AiProvider: Send + Sync {
    fn name(&self) -> &str;

    fn supports_model(&self, model: &str) -> bool;

    fn default_model(&self) -> &str;

    fn get_pricing(&self, model: &str) -> ModelPricing;

    /// True if this vendor offers reliable native function/tool calling
    /// (spec §4.6: determines whether the engine drives a function-calling
    /// agent or falls back to the text-protocol agent).
    fn supports_native_tool_calling(&self) -> bool;

    fn supports_streaming(&self) -> bool;

    async fn generate(&self, request: GenerationRequest<'_>) -> Result<TextCompletion, ProviderError>;

    async fn generate_with_tools(
        &self,
        request: GenerationRequest<'_>,
        tools: &[ToolDescriptor],
    ) -> Result<ToolAwareCompletion, ProviderError>;

    async fn generate_stream(
        &self,
        request: GenerationRequest<'_>,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamChunk, ProviderError>> + Send>>, ProviderError>;

    async fn generate_with_tools_stream(
        &self,
        request: GenerationRequest<'_>,
        tools: &[ToolDescriptor],
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamChunk, ProviderError>> + Send>>, ProviderError>;
}
