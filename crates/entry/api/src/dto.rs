//! Wire shapes for the HTTP surface (spec §6) and their conversion into
//! `gateway-engine`'s domain types.
//!
//! Kept deliberately separate from `gateway_engine::AgentRequest`: the
//! wire shape carries raw strings for the fields whose validity depends on
//! the taxonomy's distinct error codes (`completion_mode` ->
//! `INVALID_COMPLETION_MODE`, selection mode -> plain validation), so a
//! malformed value produces the correct code instead of a generic 400 from
//! serde's own enum-deserialization failure.

use std::collections::BTreeMap;

use gateway_engine::{AgentConfig, AgentRequest, CompletionMode, SelectionMode, ServiceBinding};
use gateway_identifiers::{ConversationId, UserId};
use gateway_model::{ChatMessage, Role};
use gateway_traits::Credentials;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::error::GatewayError;

#[derive(Debug, Deserialize, Validate)]
pub struct AgentConfigDto {
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(default)]
    pub persona: String,
    pub custom_system_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceBindingDto {
    pub class_id: String,
    #[serde(default)]
    pub selection_mode: Option<String>,
    #[serde(default)]
    pub selected_tools: Vec<String>,
    #[serde(default)]
    pub credentials: BTreeMap<String, String>,
    #[serde(default)]
    pub config: Value,
}

#[derive(Debug, Deserialize)]
pub struct ConversationTurnDto {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AgentRequestDto {
    pub user_id: String,
    pub conversation_id: String,
    #[validate(length(min = 1, max = 10_000))]
    pub message: String,
    #[serde(default)]
    pub completion_mode: Option<String>,
    #[serde(default)]
    pub allowed_tools: Option<Vec<String>>,
    pub agent_config: AgentConfigDto,
    #[serde(default)]
    pub services: Vec<ServiceBindingDto>,
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurnDto>,
}

/// Spec §6: `completion_mode` defaults to `"auto"`.
fn parse_completion_mode(raw: Option<&str>) -> Result<CompletionMode, GatewayError> {
    match raw.unwrap_or("auto") {
        "auto" => Ok(CompletionMode::Auto),
        "tools_required" => Ok(CompletionMode::ToolsRequired),
        "completion_only" => Ok(CompletionMode::CompletionOnly),
        other => Err(GatewayError::Engine(gateway_engine::EngineError::InvalidCompletionMode(other.to_string()))),
    }
}

fn parse_selection_mode(raw: Option<&str>) -> SelectionMode {
    match raw {
        Some("selected") => SelectionMode::Selected,
        _ => SelectionMode::All,
    }
}

fn parse_role(raw: &str) -> Role {
    match raw {
        "assistant" => Role::Assistant,
        "system" => Role::System,
        _ => Role::User,
    }
}

impl AgentConfigDto {
    /// Range checks the `validator` derive can't express across an
    /// `f32`/`u32` boundary cleanly alongside the rest of the DTO; kept as
    /// a small explicit check rather than a second derive pass.
    fn validate_ranges(&self) -> Result<(), GatewayError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(GatewayError::validation(format!("agent_config.temperature must be within 0.0..=2.0, got {}", self.temperature)));
        }
        if !(1..=8_000).contains(&self.max_tokens) {
            return Err(GatewayError::validation(format!("agent_config.max_tokens must be within 1..=8000, got {}", self.max_tokens)));
        }
        Ok(())
    }
}

impl AgentRequestDto {
    /// Validates shape (spec §8 boundary behaviors: message length
    /// 0/10000/10001) and converts to the domain [`AgentRequest`] the
    /// engine operates on.
    pub fn into_domain(self) -> Result<AgentRequest, GatewayError> {
        self.validate().map_err(|err| GatewayError::validation(err.to_string()))?;
        self.agent_config.validate_ranges()?;
        let completion_mode = parse_completion_mode(self.completion_mode.as_deref())?;

        let services = self
            .services
            .into_iter()
            .map(|binding| ServiceBinding {
                class_id: binding.class_id,
                selection_mode: parse_selection_mode(binding.selection_mode.as_deref()),
                selected_tools: binding.selected_tools,
                credentials: Credentials::new(binding.credentials),
                config: binding.config,
            })
            .collect();

        let conversation_history = self
            .conversation_history
            .into_iter()
            .map(|turn| ChatMessage::new(parse_role(&turn.role), turn.content))
            .collect();

        Ok(AgentRequest {
            user_id: UserId::new(self.user_id),
            conversation_id: ConversationId::new(self.conversation_id),
            message: self.message,
            completion_mode,
            allowed_tools: self.allowed_tools,
            agent_config: AgentConfig {
                provider: self.agent_config.provider,
                model: self.agent_config.model,
                temperature: self.agent_config.temperature,
                max_tokens: self.agent_config.max_tokens,
                persona: self.agent_config.persona,
                custom_system_prompt: self.agent_config.custom_system_prompt,
            },
            services,
            conversation_history,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub conversation_id: String,
    pub message: String,
    pub tool_calls: Vec<Value>,
    pub metadata: Value,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EnhancePromptRequestDto {
    #[serde(default)]
    pub current_prompt: String,
}

#[derive(Debug, Serialize)]
pub struct EnhancePromptResponse {
    pub enhanced_prompt: String,
    pub metadata: Value,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteToolRequestDto {
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Value,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub auth: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct ExecuteToolResponse {
    pub success: bool,
    pub result: Option<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_dto() -> AgentRequestDto {
        AgentRequestDto {
            user_id: "user-1".to_string(),
            conversation_id: "conv-1".to_string(),
            message: "hello".to_string(),
            completion_mode: None,
            allowed_tools: None,
            agent_config: AgentConfigDto { provider: "openai".to_string(), model: "gpt-4o".to_string(), temperature: 0.7, max_tokens: 512, persona: "assistant".to_string(), custom_system_prompt: None },
            services: Vec::new(),
            conversation_history: Vec::new(),
        }
    }

    #[test]
    fn empty_message_is_rejected() {
        let mut dto = base_dto();
        dto.message = String::new();
        assert!(dto.into_domain().is_err());
    }

    #[test]
    fn message_at_the_max_boundary_is_accepted() {
        let mut dto = base_dto();
        dto.message = "a".repeat(10_000);
        assert!(dto.into_domain().is_ok());
    }

    #[test]
    fn message_past_the_max_boundary_is_rejected() {
        let mut dto = base_dto();
        dto.message = "a".repeat(10_001);
        assert!(dto.into_domain().is_err());
    }

    #[test]
    fn unknown_completion_mode_is_rejected_with_the_taxonomy_code() {
        let mut dto = base_dto();
        dto.completion_mode = Some("not_a_real_mode".to_string());
        let err = dto.into_domain().unwrap_err();
        assert_eq!(err.code(), "INVALID_COMPLETION_MODE");
    }

    #[test]
    fn out_of_range_temperature_is_rejected() {
        let mut dto = base_dto();
        dto.agent_config.temperature = 3.0;
        assert!(dto.into_domain().is_err());
    }
}
