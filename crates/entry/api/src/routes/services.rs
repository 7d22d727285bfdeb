//! `GET /services`, `GET /services/{class}/tools`, `POST
//! /services/{class}/execute` (spec §6): direct registry access, bypassing
//! the agent loop entirely — a caller that already knows which tool it
//! wants can invoke it without paying for a model round trip.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::dto::{ExecuteToolRequestDto, ExecuteToolResponse};
use crate::error::GatewayError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ServiceSummary {
    pub class_id: &'static str,
    pub display_name: &'static str,
    pub kind: String,
    pub credential_schema: Value,
}

pub async fn list_services(State(state): State<AppState>) -> Json<Vec<ServiceSummary>> {
    let services = state
        .service_registry
        .list_services()
        .into_iter()
        .map(|metadata| ServiceSummary {
            class_id: metadata.class_id,
            display_name: metadata.display_name,
            kind: metadata.kind.to_string(),
            credential_schema: metadata.credential_schema,
        })
        .collect();
    Json(services)
}

pub async fn list_tools(State(state): State<AppState>, Path(class_id): Path<String>) -> Result<Json<Value>, GatewayError> {
    let tools = state.service_registry.list_tools(&class_id).map_err(GatewayError::Engine)?;
    Ok(Json(serde_json::to_value(tools).unwrap_or(Value::Null)))
}

/// Executes one tool directly against a freshly instantiated Service —
/// the registry never caches instances across requests (spec §4.1: "(c)
/// *Instantiate Service X with (config, credentials)*").
pub async fn execute_tool(State(state): State<AppState>, Path(class_id): Path<String>, Json(body): Json<ExecuteToolRequestDto>) -> Json<ExecuteToolResponse> {
    let credentials = gateway_traits::Credentials::new(body.auth.into_iter().collect());
    let service = match state.service_registry.instantiate(&class_id, body.config, credentials) {
        Ok(service) => service,
        Err(err) => return Json(ExecuteToolResponse { success: false, result: None, error: Some(err.to_string()) }),
    };

    match service.invoke(&body.tool_name, body.arguments).await {
        Ok(result) => Json(ExecuteToolResponse { success: true, result: Some(result), error: None }),
        Err(err) => Json(ExecuteToolResponse { success: false, result: None, error: Some(err.to_string()) }),
    }
}
