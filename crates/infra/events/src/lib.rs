//! The per-request event bus: a bounded, totally-ordered channel of
//! [`Event`]s from the agent execution engine to the SSE framer.
//!
//! There is exactly one producer and one consumer per request; no
//! cross-request sharing (spec §5). The type-level contract on
//! [`EventSender`] (terminal-sending methods consume `self`) is what
//! guarantees "exactly one terminal event" rather than a runtime check.

mod bus;
mod event;
mod sse;

pub use bus::{channel, EventError, EventReceiver, EventSender, CONSUMER_IDLE_TIMEOUT, DEFAULT_CAPACITY};
pub use event::{DoneMetadata, Event, TokenUsage, ToolCallRecord, ToolCallStatus};
pub use sse::into_sse_stream;
