pub mod chat;
pub mod enhance;
pub mod health;
pub mod services;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tower_http::normalize_path::NormalizePathLayer;

use crate::middleware::{build_cors_layer, require_auth, RequestIdLayer, RouterExt};
use crate::state::AppState;

/// Assembles the full HTTP surface (spec §6) with its middleware stack
/// applied in the teacher's order: request id outermost (so it covers
/// every response, even a rejected one), then tracing, then CORS, then
/// rate limiting, then the authentication gate in front of the
/// authenticated route group.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let authenticated = Router::new()
        .route("/chat", post(chat::chat))
        .route("/chat/stream", post(chat::chat_stream))
        .route("/enhance-prompt", post(enhance::enhance_prompt))
        .route("/services", get(services::list_services))
        .route("/services/{class_id}/tools", get(services::list_tools))
        .route("/services/{class_id}/execute", post(services::execute_tool))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth));

    let rate_limit_per_second = 10;
    let rate_limit_burst = 30;

    Router::new()
        .route("/health", get(health::health))
        .merge(authenticated)
        .with_rate_limit(rate_limit_per_second, rate_limit_burst)
        .layer(build_cors_layer(&state.config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .layer(NormalizePathLayer::trim_trailing_slash())
        .layer(RequestIdLayer)
        .with_state(state)
}
