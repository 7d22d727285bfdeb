//! The bounded single-producer/single-consumer event channel.
//!
//! [`EventSender::finish_done`] and [`EventSender::finish_error`] consume
//! `self`, so "exactly one terminal event" is enforced by the type system
//! rather than by a runtime check: once a terminal event is sent there is
//! no sender left to call again.

use std::time::Duration;

use gateway_identifiers::ToolCallId;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::event::{DoneMetadata, Event, ToolCallRecord, ToolCallStatus};

/// Per-event consumer read timeout (spec §5: "60 s idle").
pub const CONSUMER_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default bus capacity. Small and bounded: a slow consumer applies
/// backpressure to the producer rather than letting memory grow.
pub const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("event bus consumer disconnected")]
    Closed,
    #[error("no event arrived within the {0:?} consumer idle timeout")]
    Timeout(Duration),
}

/// Creates a bounded event channel for one agent run.
#[must_use]
pub fn channel(capacity: usize) -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        EventSender {
            tx,
            accumulated_token_len: 0,
        },
        EventReceiver { rx },
    )
}

/// Producer half, owned by the agent execution engine for one request.
#[derive(Debug)]
pub struct EventSender {
    tx: mpsc::Sender<Event>,
    accumulated_token_len: usize,
}

impl EventSender {
    /// Current insert position: the sum of the lengths of all `token`
    /// contents emitted so far on this sender.
    #[must_use]
    pub fn insert_position(&self) -> usize {
        self.accumulated_token_len
    }

    /// Emits an assistant text fragment and advances the insert-position
    /// counter used for subsequent `tool_start` events.
    pub async fn emit_token(&mut self, content: impl Into<String>) -> Result<(), EventError> {
        let content = content.into();
        self.accumulated_token_len += content.chars().count();
        self.send(Event::Token { content }).await
    }

    /// Emits `tool_start` anchored at the current insert position and
    /// returns the tool-call id assigned to it.
    pub async fn emit_tool_start(
        &mut self,
        tool_name: impl Into<String>,
        input: Value,
    ) -> Result<ToolCallId, EventError> {
        let tool_id = ToolCallId::generate();
        self.send(Event::ToolStart {
            tool_id: tool_id.clone(),
            tool_name: tool_name.into(),
            input,
            insert_position: self.accumulated_token_len,
        })
        .await?;
        Ok(tool_id)
    }

    /// Emits the `tool_end` paired with an earlier `tool_start`.
    pub async fn emit_tool_end(
        &mut self,
        tool_id: ToolCallId,
        status: ToolCallStatus,
        output: Option<Value>,
        error: Option<String>,
        execution_time_ms: u64,
    ) -> Result<(), EventError> {
        self.send(Event::ToolEnd {
            tool_id,
            status,
            output,
            error,
            execution_time_ms,
        })
        .await
    }

    /// Emits the terminal `done` event, consuming the sender.
    pub async fn finish_done(
        self,
        conversation_id: gateway_identifiers::ConversationId,
        message: String,
        tool_calls: Vec<ToolCallRecord>,
        metadata: DoneMetadata,
    ) -> Result<(), EventError> {
        self.send(Event::Done {
            conversation_id,
            message,
            tool_calls,
            metadata,
        })
        .await
    }

    /// Emits the terminal `error` event, consuming the sender.
    pub async fn finish_error(
        self,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<(), EventError> {
        self.send(Event::Error {
            code: code.into(),
            message: message.into(),
        })
        .await
    }

    async fn send(&self, event: Event) -> Result<(), EventError> {
        self.tx.send(event).await.map_err(|_| EventError::Closed)
    }
}

/// Consumer half, drained by the SSE framer.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<Event>,
}

impl EventReceiver {
    /// Waits for the next event, closing the stream with
    /// [`EventError::Timeout`] if none arrives within
    /// [`CONSUMER_IDLE_TIMEOUT`]. Returns `Ok(None)` once the producer has
    /// dropped the sender after a terminal event.
    pub async fn recv(&mut self) -> Result<Option<Event>, EventError> {
        match timeout(CONSUMER_IDLE_TIMEOUT, self.rx.recv()).await {
            Ok(event) => Ok(event),
            Err(_) => Err(EventError::Timeout(CONSUMER_IDLE_TIMEOUT)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn token_emission_advances_insert_position() {
        let (mut tx, mut rx) = channel(DEFAULT_CAPACITY);
        tx.emit_token("hello ").await.unwrap();
        assert_eq!(tx.insert_position(), 6);
        let tool_id = tx.emit_tool_start("calculator", json!({"a": 1})).await.unwrap();
        tx.emit_tool_end(tool_id, ToolCallStatus::Completed, Some(json!(2)), None, 5)
            .await
            .unwrap();

        let first = rx.recv().await.unwrap().unwrap();
        assert!(matches!(first, Event::Token { .. }));
        let second = rx.recv().await.unwrap().unwrap();
        match second {
            Event::ToolStart { insert_position, .. } => assert_eq!(insert_position, 6),
            other => panic!("expected ToolStart, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn exactly_one_terminal_event_is_structurally_enforced() {
        let (tx, mut rx) = channel(DEFAULT_CAPACITY);
        tx.finish_done(
            gateway_identifiers::ConversationId::new("c1"),
            "done".to_string(),
            vec![],
            DoneMetadata {
                provider: "openai".to_string(),
                model: "gpt-4o".to_string(),
                token_usage: Default::default(),
                total_processing_time_ms: 10,
                tool_call_count: 0,
            },
        )
        .await
        .unwrap();

        let event = rx.recv().await.unwrap().unwrap();
        assert!(event.is_terminal());
        assert!(rx.recv().await.unwrap().is_none());
    }
}
