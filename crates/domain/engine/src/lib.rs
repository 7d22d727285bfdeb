//! The Service/Tool Registry and the Agent Execution Engine (spec §4.1,
//! §4.6): the reason → invoke tool → observe → respond loop at the
//! center of the gateway, plus the one-shot prompt-rewrite operation
//! (spec §4.7).
//!
//! `gateway-api` is the only caller of this crate. It builds an
//! [`AgentRequest`], hands it to [`prepare::prepare`] to validate inputs
//! and assemble a [`agent::LoopInputs`], then drives [`agent::run`] to
//! completion against an [`gateway_events::EventSender`] it owns.

pub mod agent;
pub mod catalog;
pub mod enhance;
pub mod error;
pub mod prepare;
pub mod prompt;
pub mod registry;
pub mod types;

pub use agent::{run, LoopInputs, MAX_ITERATIONS, MAX_WALL_TIME};
pub use catalog::{BoundTool, ToolCatalog};
pub use enhance::{enhance_prompt, EnhancedPrompt};
pub use error::EngineError;
pub use prepare::prepare;
pub use registry::{ServiceMetadata, ServiceRegistry};
pub use types::{AgentConfig, AgentRequest, CompletionMode, Persona, SelectionMode, ServiceBinding};
