//! Framing an [`EventReceiver`] as an axum `text/event-stream` body.

use std::convert::Infallible;

use axum::response::sse;
use futures_util::Stream;

use crate::bus::EventReceiver;
use crate::event::Event;

/// Drains `receiver` into a stream of SSE frames, each carrying one
/// `data: <json>` line per spec §6. The stream ends after the first
/// terminal event or consumer-idle timeout; no partial `done` is ever
/// produced after a timeout because the timeout itself becomes the
/// closing `error` frame.
pub fn into_sse_stream(
    mut receiver: EventReceiver,
) -> impl Stream<Item = Result<sse::Event, Infallible>> {
    async_stream::stream! {
        loop {
            match receiver.recv().await {
                Ok(Some(event)) => {
                    let terminal = event.is_terminal();
                    yield Ok(to_sse_event(&event));
                    if terminal {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    let timeout_event = Event::Error {
                        code: "TIMEOUT".to_string(),
                        message: err.to_string(),
                    };
                    yield Ok(to_sse_event(&timeout_event));
                    break;
                }
            }
        }
    }
}

fn to_sse_event(event: &Event) -> sse::Event {
    let payload = serde_json::to_string(event).unwrap_or_else(|_| {
        r#"{"type":"error","code":"INTERNAL_ERROR","message":"event serialization failed"}"#
            .to_string()
    });
    sse::Event::default().data(payload)
}
