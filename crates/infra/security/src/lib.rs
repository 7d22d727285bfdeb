//! Caller authentication and at-rest secret encryption.
//!
//! Both surfaces here are intentionally thin: validating a JWT the caller
//! already holds, and wrapping/unwrapping a secret a collaborator outside
//! the core decided to persist. Issuing tokens, managing accounts, and
//! deciding what to persist are out of scope (spec §1 Non-goals).

mod encryption;
mod jwt;

pub use encryption::{decrypt, encrypt, EncryptionError, EncryptionKey};
pub use jwt::{validate as validate_jwt, JwtError};
