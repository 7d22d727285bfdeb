//! The engine's slice of the error taxonomy (spec §7).
//!
//! `gateway-api` composes this into one `GatewayError` at the HTTP
//! boundary, adding the variants that only make sense at that boundary
//! (authentication, authorization, rate limiting). Every variant here
//! already knows its taxonomy code and mapped HTTP status so that
//! composition is a thin wrapper, not a second source of truth.

use gateway_model::{ProviderError, SelectionError};
use gateway_traits::ToolError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("unknown provider: {0}")]
    InvalidProvider(String),
    #[error("unknown model: {0}")]
    InvalidModel(String),
    #[error("unknown completion mode: {0}")]
    InvalidCompletionMode(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("completion mode tools_required was requested but no tools are available")]
    ToolsRequiredButNoneAvailable,
    #[error("completion mode tools_required was requested but the model produced no tool call")]
    ToolsRequiredButNotUsed,
    #[error("tool execution failed: {0}")]
    ToolExecution(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("model vendor API error: {0}")]
    ModelApi(String),
    #[error("upstream service unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("request exceeded its time budget")]
    Timeout,
}

impl EngineError {
    /// The stable taxonomy code from spec §7, used in the uniform error
    /// response body and as an `error.code` SSE terminal event field.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidProvider(_) => "INVALID_PROVIDER",
            Self::InvalidModel(_) => "INVALID_MODEL",
            Self::InvalidCompletionMode(_) => "INVALID_COMPLETION_MODE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::ToolsRequiredButNoneAvailable => "TOOLS_REQUIRED_BUT_NONE_AVAILABLE",
            Self::ToolsRequiredButNotUsed => "TOOLS_REQUIRED_BUT_NOT_USED",
            Self::ToolExecution(_) => "TOOL_EXECUTION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::ModelApi(_) => "MODEL_API_ERROR",
            Self::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            Self::Timeout => "TIMEOUT",
        }
    }

    /// The HTTP status spec §7 maps this code to.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::InvalidProvider(_) | Self::InvalidModel(_) | Self::InvalidCompletionMode(_) => 400,
            Self::NotFound(_) => 404,
            Self::ToolsRequiredButNoneAvailable | Self::ToolsRequiredButNotUsed | Self::ToolExecution(_) => 422,
            Self::Internal(_) => 500,
            Self::ModelApi(_) => 503,
            Self::UpstreamUnavailable(_) => 503,
            Self::Timeout => 504,
        }
    }
}

impl From<SelectionError> for EngineError {
    fn from(err: SelectionError) -> Self {
        match err {
            SelectionError::UnknownProvider(provider) => Self::InvalidProvider(provider),
            SelectionError::UnknownModel { model, .. } => Self::InvalidModel(model),
        }
    }
}

impl From<ProviderError> for EngineError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::UnsupportedModel(model) => Self::InvalidModel(model),
            ProviderError::StreamingUnsupported => Self::Internal(err.to_string()),
            ProviderError::VendorRejected(message) => Self::ModelApi(message),
            ProviderError::Unavailable(message) => Self::UpstreamUnavailable(message),
            ProviderError::Timeout => Self::Timeout,
            ProviderError::MalformedResponse(message) => Self::ModelApi(message),
        }
    }
}

impl From<ToolError> for EngineError {
    fn from(err: ToolError) -> Self {
        Self::ToolExecution(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_the_taxonomy_table() {
        assert_eq!(EngineError::ToolsRequiredButNoneAvailable.code(), "TOOLS_REQUIRED_BUT_NONE_AVAILABLE");
        assert_eq!(EngineError::ToolsRequiredButNoneAvailable.status(), 422);
        assert_eq!(EngineError::Timeout.code(), "TIMEOUT");
        assert_eq!(EngineError::Timeout.status(), 504);
    }
}
