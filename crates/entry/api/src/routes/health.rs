//! `GET /health` (spec §6): liveness plus per-provider credential presence,
//! generalized from the teacher's `services/health` module down to what a
//! stateless gateway needs — no database, no long-running process
//! monitor, just "is this process up and which vendors can it reach".

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

const KNOWN_PROVIDERS: [&str; 3] = ["openai", "anthropic", "gemini"];

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let providers: Value = KNOWN_PROVIDERS
        .iter()
        .map(|name| (name.to_string(), Value::Bool(state.config.has_provider(name))))
        .collect::<serde_json::Map<_, _>>()
        .into();

    Json(json!({
        "status": "ok",
        "providers": providers,
    }))
}
