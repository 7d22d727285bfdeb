use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The closed set of tool-source kinds the gateway understands.
///
/// §9 REDESIGN FLAGS calls for a closed tagged variant in place of abstract
/// base classes with virtual dispatch — this is that variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    BuiltIn,
    ApiWrapper,
    RemoteCatalog,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BuiltIn => "built_in",
            Self::ApiWrapper => "api_wrapper",
            Self::RemoteCatalog => "remote_catalog",
        };
        f.write_str(s)
    }
}

/// Metadata for one callable tool, frozen at registration time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// A JSON-Schema-shaped object tree: typed properties plus a `required` list.
    pub input_schema: Value,
    pub category: String,
    pub tags: Vec<String>,
}

/// An opaque, write-only bag of per-request credentials.
///
/// `Debug` never prints the contents — credentials must never reach a log
/// line, and the derived `Debug` on a `HashMap<String, String>` would do
/// exactly that.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Credentials(BTreeMap<String, String>);

impl Credentials {
    #[must_use]
    pub fn new(values: BTreeMap<String, String>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("keys", &self.0.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The taxonomy a tool invocation can fail with. Never a panic, never an
/// exception — §9 asks for tool failure as a return value the engine can
/// re-inject into the model's scratchpad.
#[derive(Debug, Error, Clone)]
pub enum ToolError {
    #[error("missing credential: {0}")]
    MissingCredential(String),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("tool timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("upstream error: {0}")]
    Upstream(String),
    #[error("rate limited{}", .retry_after_secs.map(|s| format!(", retry after {s}s")).unwrap_or_default())]
    RateLimited { retry_after_secs: Option<u64> },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

/// The uniform surface every tool source — built-in function, API wrapper,
/// or remote-catalog proxy — is invoked through.
#[async_trait]
pub trait Service: Send + Sync + fmt::Debug {
    fn class_id(&self) -> &str;

    fn kind(&self) -> ServiceKind;

    /// Invariant: non-empty, and every tool name is unique within the class.
    fn tools(&self) -> Vec<ToolDescriptor>;

    async fn invoke(&self, tool_name: &str, arguments: Value) -> Result<String, ToolError>;
}

/// Declarative registration record. One `inventory::submit!` per service
/// module; the registry walks all submitted factories once at startup and
/// never mutates the resulting table afterwards.
pub struct ServiceFactory {
    pub class_id: &'static str,
    pub display_name: &'static str,
    pub kind: ServiceKind,
    pub credential_schema: fn() -> Value,
    pub tools: fn() -> Vec<ToolDescriptor>,
    pub construct: fn(Value, Credentials) -> Arc<dyn Service>,
}

inventory::collect!(ServiceFactory);
