//! Caller JWT validation.
//!
//! This is the thin, external-collaborator-level surface the spec calls
//! for (§1): the gateway validates the token a caller presents and reads
//! the subject out of it, it does not issue tokens, manage accounts, or
//! enforce quotas.

use gateway_identifiers::UserId;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("token is malformed or its signature does not verify")]
    Invalid,
    #[error("token has expired")]
    Expired,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// Validates `token` against `signing_key` (HS256) and returns the caller's
/// user id from the `sub` claim.
///
/// # Errors
///
/// Returns [`JwtError::Expired`] for an expired token and
/// [`JwtError::Invalid`] for any other validation failure (bad signature,
/// malformed structure, missing claims).
pub fn validate(token: &str, signing_key: &str) -> Result<UserId, JwtError> {
    let key = DecodingKey::from_secret(signing_key.as_bytes());
    let validation = Validation::new(Algorithm::HS256);

    let data = decode::<Claims>(token, &key, &validation).map_err(|err| {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Invalid,
        }
    })?;

    Ok(UserId::new(data.claims.sub))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        exp: usize,
    }

    fn sign(sub: &str, exp: usize, key: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &TestClaims { sub: sub.to_string(), exp },
            &EncodingKey::from_secret(key.as_bytes()),
        )
        .unwrap()
    }

    const FIXED_FUTURE_TIMESTAMP: usize = 4_102_444_800; // 2100-01-01, far past any test run

    #[test]
    fn validates_well_formed_token() {
        let token = sign("user-1", FIXED_FUTURE_TIMESTAMP, "secret");
        let user = validate(&token, "secret").unwrap();
        assert_eq!(user.as_str(), "user-1");
    }

    #[test]
    fn rejects_wrong_key() {
        let token = sign("user-1", FIXED_FUTURE_TIMESTAMP, "secret");
        assert!(matches!(validate(&token, "other"), Err(JwtError::Invalid)));
    }

    #[test]
    fn rejects_expired_token() {
        let token = sign("user-1", 1, "secret");
        assert!(matches!(validate(&token, "secret"), Err(JwtError::Expired)));
    }
}
