//! Provider-agnostic chat message and tool-call shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One turn of conversation history, already filtered of empty-content
/// turns by the caller (the engine does this during system-prompt
/// composition, per spec §4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A tool invocation the model requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// The result of a generation call that did not request tools.
#[derive(Debug, Clone)]
pub struct TextCompletion {
    pub content: String,
    pub usage: Option<TokenUsage>,
}

/// The result of a generation call that may have requested tools instead
/// of, or alongside, producing text.
#[derive(Debug, Clone)]
pub struct ToolAwareCompletion {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// An incremental piece of a streamed generation.
#[derive(Debug, Clone)]
pub enum StreamChunk {
    TextDelta(String),
    ToolCall(ToolCallRequest),
    Usage(TokenUsage),
}
