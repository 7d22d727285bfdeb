//! Process entry point: load configuration, initialize logging, build the
//! router, and serve it — mirrors the teacher's `ApiServer::serve`
//! (`services/server/builder.rs`) generalized down to what a single
//! stateless gateway process needs (no database, no scheduler, no agent
//! reconciliation).

use std::env;

use anyhow::{Context, Result};
use gateway_api::{build_router, AppState};
use gateway_config::GatewayConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let json_logs = env::var("GATEWAY_LOG_JSON").map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
    gateway_logging::init(json_logs);

    let config = GatewayConfig::from_env().context("failed to load gateway configuration")?;
    let bind_addr = env::var("GATEWAY_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let state = AppState::new(config);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await.with_context(|| format!("failed to bind to {bind_addr}"))?;

    tracing::info!(address = %bind_addr, "gateway listening");
    axum::serve(listener, router.into_make_service()).await.context("server error")?;
    Ok(())
}
