//! `POST /chat` and `POST /chat/stream` (spec §6): the two framings of the
//! same agent run — one that waits for the terminal event and returns it
//! as a JSON body, one that streams every intermediate event as SSE.

use axum::extract::State;
use axum::response::sse::Sse;
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use gateway_engine::prepare::{prepare, PrepareContext};
use gateway_events::{channel, into_sse_stream, Event, DEFAULT_CAPACITY};
use gateway_identifiers::UserId;
use serde_json::json;

use crate::dto::{AgentRequestDto, ChatResponse};
use crate::error::GatewayError;
use crate::state::AppState;

fn prepare_context(state: &AppState) -> PrepareContext<'_> {
    PrepareContext {
        service_registry: &state.service_registry,
        provider_registry: &state.provider_registry,
        model_catalog: &state.config.model_catalog,
        max_history_chars: state.config.max_history_chars,
    }
}

/// Non-streaming framing: runs the agent loop to completion and returns
/// its terminal event as a single JSON body.
pub async fn chat(State(state): State<AppState>, Extension(caller): Extension<UserId>, Json(mut body): Json<AgentRequestDto>) -> Result<Json<ChatResponse>, GatewayError> {
    body.user_id = caller.into_inner();
    let request = body.into_domain()?;
    let inputs = prepare(request, &prepare_context(&state)).await?;

    let (sender, mut receiver) = channel(DEFAULT_CAPACITY);
    tokio::spawn(gateway_engine::run(inputs, sender));

    loop {
        match receiver.recv().await {
            Ok(Some(Event::Done { conversation_id, message, tool_calls, metadata })) => {
                return Ok(Json(ChatResponse {
                    conversation_id: conversation_id.into_inner(),
                    message,
                    tool_calls: tool_calls.into_iter().map(|call| serde_json::to_value(call).unwrap_or(json!(null))).collect(),
                    metadata: serde_json::to_value(metadata).unwrap_or(json!(null)),
                }));
            }
            Ok(Some(Event::Error { code, message })) => return Err(GatewayError::Engine(gateway_engine::EngineError::Internal(format!("{code}: {message}")))),
            Ok(Some(_)) => continue,
            Ok(None) => return Err(GatewayError::Engine(gateway_engine::EngineError::Internal("agent run ended without a terminal event".to_string()))),
            Err(err) => return Err(GatewayError::Engine(gateway_engine::EngineError::Internal(err.to_string()))),
        }
    }
}

/// Streaming framing: the agent loop runs in a spawned task, its event bus
/// drained and reframed as `text/event-stream` for the caller.
pub async fn chat_stream(State(state): State<AppState>, Extension(caller): Extension<UserId>, Json(mut body): Json<AgentRequestDto>) -> Result<impl IntoResponse, GatewayError> {
    body.user_id = caller.into_inner();
    let request = body.into_domain()?;
    let inputs = prepare(request, &prepare_context(&state)).await?;

    let (sender, receiver) = channel(DEFAULT_CAPACITY);
    tokio::spawn(gateway_engine::run(inputs, sender));

    Ok(Sse::new(into_sse_stream(receiver)))
}
