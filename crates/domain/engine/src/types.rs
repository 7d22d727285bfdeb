//! The request-lifetime data model (spec §3): `ServiceBinding`,
//! `AgentRequest`, completion mode, and the persona/config shape carried
//! inside it.

use gateway_identifiers::{ConversationId, UserId};
use gateway_model::ChatMessage;
use gateway_traits::Credentials;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether a [`ServiceBinding`] exposes every tool its Service offers, or
/// only an explicit subset (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    All,
    Selected,
}

/// A caller-requested instantiation of one registered Service (spec §3).
///
/// Invariant upheld by callers, never by this type: credentials are never
/// logged and are not persisted by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceBinding {
    pub class_id: String,
    pub selection_mode: SelectionMode,
    #[serde(default)]
    pub selected_tools: Vec<String>,
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub config: Value,
}

/// The policy governing whether tools are bound to the model and required
/// to be used (spec §4.6, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionMode {
    Auto,
    ToolsRequired,
    CompletionOnly,
}

impl Default for CompletionMode {
    fn default() -> Self {
        Self::Auto
    }
}

/// Persona identifiers the system-prompt persona table is keyed by (spec
/// §4.6). Unknown personas fall back to [`Persona::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    None,
    Assistant,
    Creative,
    Analytical,
    Concise,
}

impl Default for Persona {
    fn default() -> Self {
        Self::Assistant
    }
}

impl Persona {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "none" => Self::None,
            "creative" => Self::Creative,
            "analytical" => Self::Analytical,
            "concise" => Self::Concise,
            _ => Self::Assistant,
        }
    }
}

/// Model selection and generation parameters the caller attaches to one
/// request (spec §6 `agent_config`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(default)]
    pub persona: String,
    pub custom_system_prompt: Option<String>,
}

/// One complete request to the Agent Execution Engine (spec §3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    pub user_id: UserId,
    pub conversation_id: ConversationId,
    pub message: String,
    #[serde(default)]
    pub completion_mode: CompletionMode,
    pub allowed_tools: Option<Vec<String>>,
    pub agent_config: AgentConfig,
    #[serde(default)]
    pub services: Vec<ServiceBinding>,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
}
