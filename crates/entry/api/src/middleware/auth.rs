//! Caller JWT authentication (spec §1, §6).
//!
//! Generalized from the teacher's `Bearer`-header extraction
//! (`services/middleware/jwt/token.rs`) down to what this gateway needs: no
//! session store, no cookie fallback, no user-existence lookup against a
//! database — this core validates the token a caller presents and attaches
//! the resulting [`UserId`] to the request, nothing more (spec §1
//! Non-goals: no account/session management).

use axum::extract::State;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::Response;
use gateway_identifiers::UserId;

use crate::error::GatewayError;
use crate::state::AppState;

fn extract_bearer_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers.get(header::AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ").filter(|token| !token.is_empty())
}

/// Validates the caller's bearer token and attaches its [`UserId`] to the
/// request's extensions for downstream handlers to read.
pub async fn require_auth(State(state): State<AppState>, mut request: Request<axum::body::Body>, next: Next) -> Result<Response, GatewayError> {
    let token = extract_bearer_token(request.headers()).ok_or(GatewayError::Authentication)?;
    let user_id: UserId = gateway_security::validate_jwt(token, &state.config.jwt_signing_key).map_err(|_| GatewayError::Authentication)?;
    request.extensions_mut().insert(user_id);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderMap;
    use axum::http::HeaderValue;

    use super::extract_bearer_token;

    #[test]
    fn missing_header_yields_none() {
        let headers = HeaderMap::new();
        assert!(extract_bearer_token(&headers).is_none());
    }

    #[test]
    fn well_formed_bearer_header_yields_the_token() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(extract_bearer_token(&headers), Some("abc123"));
    }

    #[test]
    fn empty_bearer_token_yields_none() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(extract_bearer_token(&headers).is_none());
    }
}
