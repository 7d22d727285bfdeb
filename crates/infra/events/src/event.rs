//! The wire shape of one agent-run event.
//!
//! Mirrors the five variants named in the specification's streaming event
//! bus section verbatim: `token`, `tool_start`, `tool_end`, `done`,
//! `error`. Serialized with an adjacently-tagged `type` field so the SSE
//! payload is a flat, predictable JSON object for browser consumers.

use gateway_identifiers::{ConversationId, ToolCallId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Best-effort token accounting for one agent run, reported only on the
/// terminal `done` event (never on intermediate events).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One completed tool invocation, as reported in `done.tool_calls`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool_call_id: ToolCallId,
    pub tool_name: String,
    pub input: Value,
    pub output: Option<Value>,
    pub status: ToolCallStatus,
    pub execution_time_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    Completed,
    Failed,
}

/// One event on the bus. Exactly one [`Event::Done`] or [`Event::Error`]
/// terminates a stream; everything before it is `Token` and
/// `ToolStart`/`ToolEnd` pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Token {
        content: String,
    },
    ToolStart {
        tool_id: ToolCallId,
        tool_name: String,
        input: Value,
        /// Sum of the lengths of all prior `token.content`s, letting a UI
        /// anchor a tool card between text runs.
        insert_position: usize,
    },
    ToolEnd {
        tool_id: ToolCallId,
        status: ToolCallStatus,
        output: Option<Value>,
        error: Option<String>,
        execution_time_ms: u64,
    },
    Done {
        conversation_id: ConversationId,
        message: String,
        tool_calls: Vec<ToolCallRecord>,
        metadata: DoneMetadata,
    },
    Error {
        code: String,
        message: String,
    },
}

/// `done.metadata`: model/provider identity, token usage, and timing —
/// reported once, on the terminal event, never mid-stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoneMetadata {
    pub provider: String,
    pub model: String,
    pub token_usage: TokenUsage,
    pub total_processing_time_ms: u64,
    pub tool_call_count: usize,
}

impl Event {
    /// True for the two variants allowed to close a stream.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::Done { .. } | Event::Error { .. })
    }
}
