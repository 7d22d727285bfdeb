//! The uniform model-provider facade: a single `AiProvider` trait over
//! OpenAI, Anthropic, and Gemini chat completion, JSON-Schema-to-vendor
//! tool-schema mapping, and the function-calling / text-protocol agent
//! strategy selection (spec §4.6).

pub mod catalog;
pub mod message;
pub mod provider;
pub mod providers;
pub mod schema;
pub mod strategy;

pub use catalog::{ProviderRegistry, SelectionError};
pub use message::{ChatMessage, Role, StreamChunk, TextCompletion, ToolAwareCompletion, ToolCallRequest, TokenUsage};
pub use provider::{AiProvider, GenerationRequest, ModelPricing, ProviderError};
pub use strategy::{select_strategy, AgentStrategy, ParseError, ParsedStep};
