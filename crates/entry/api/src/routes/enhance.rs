//! `POST /enhance-prompt` (spec §4.7): the one-shot prompt-rewrite
//! operation, independent of the agentic loop and its tool catalog.

use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::dto::{EnhancePromptRequestDto, EnhancePromptResponse};
use crate::error::GatewayError;
use crate::state::AppState;

const PREFERRED_PROVIDER: &str = "openai";

pub async fn enhance_prompt(State(state): State<AppState>, Json(body): Json<EnhancePromptRequestDto>) -> Result<Json<EnhancePromptResponse>, GatewayError> {
    let provider = state
        .provider_registry
        .get(PREFERRED_PROVIDER)
        .or_else(|| state.provider_registry.any_provider())
        .ok_or_else(|| GatewayError::validation("no model provider is configured for the prompt-rewrite operation"))?;

    let model = provider.default_model().to_string();
    let result = gateway_engine::enhance_prompt(provider.as_ref(), &model, &body.current_prompt).await?;

    Ok(Json(EnhancePromptResponse {
        enhanced_prompt: result.enhanced_prompt,
        metadata: json!({ "original_length": result.original_length }),
    }))
}
