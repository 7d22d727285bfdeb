//! The uniform HTTP error response (spec §6, §7).
//!
//! [`GatewayError`] composes `gateway-engine`'s [`EngineError`] — which
//! already knows its taxonomy code and HTTP status — with the variants
//! that only make sense at this boundary: caller authentication,
//! authorization, and rate limiting. `IntoResponse` is the only place the
//! taxonomy table of spec §7 is translated into an actual HTTP status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gateway_identifiers::RequestId;
use gateway_engine::EngineError;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("caller token is missing, malformed, or failed to verify")]
    Authentication,
    #[error("caller lacks permission for this resource")]
    Authorization,
    #[error("too many requests")]
    RateLimited,
}

impl GatewayError {
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Engine(EngineError::Validation(message.into()))
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::Engine(EngineError::NotFound(message.into()))
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Engine(err) => err.code(),
            Self::Authentication => "AUTHENTICATION_ERROR",
            Self::Authorization => "AUTHORIZATION_ERROR",
            Self::RateLimited => "RATE_LIMIT_EXCEEDED",
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Engine(err) => StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Attaches a `request_id` and renders the uniform error body (spec §6).
    #[must_use]
    pub fn into_response_with_id(self, request_id: RequestId) -> Response {
        let status = self.status();
        let code = self.code();
        let body = ErrorBody {
            error: ErrorDetail { code, message: self.to_string(), details: None, request_id: request_id.into_inner() },
        };
        (status, Json(body)).into_response()
    }
}

/// Fallback path for errors that reach axum's own `IntoResponse` machinery
/// (e.g. extractor rejections) without a caller-supplied request id.
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        self.into_response_with_id(RequestId::generate())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
    request_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tools_required_but_none_available_maps_to_422() {
        let err = GatewayError::Engine(EngineError::ToolsRequiredButNoneAvailable);
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "TOOLS_REQUIRED_BUT_NONE_AVAILABLE");
    }

    #[test]
    fn authentication_failure_maps_to_401() {
        assert_eq!(GatewayError::Authentication.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn rate_limited_maps_to_429() {
        assert_eq!(GatewayError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
