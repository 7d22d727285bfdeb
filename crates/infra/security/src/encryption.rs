//! Symmetric encryption for secrets collaborators ask the gateway to wrap
//! before persisting at rest (spec §5: "the core never re-encrypts, it
//! only receives and uses").

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;

const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum EncryptionError {
    #[error("encryption key must be exactly 32 bytes, got {0}")]
    InvalidKeyLength(usize),
    #[error("ciphertext is malformed or shorter than the nonce")]
    MalformedCiphertext,
    #[error("decryption failed: key mismatch or tampered ciphertext")]
    DecryptionFailed,
    #[error("failed to encrypt plaintext")]
    EncryptionFailed,
    #[error("ciphertext is not valid base64")]
    InvalidEncoding,
}

/// A 32-byte ChaCha20-Poly1305 key derived from the configured encryption
/// key material.
pub struct EncryptionKey(Key);

impl EncryptionKey {
    /// Builds a key from raw bytes, which must be exactly 32 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EncryptionError::InvalidKeyLength`] otherwise.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EncryptionError> {
        if bytes.len() != 32 {
            return Err(EncryptionError::InvalidKeyLength(bytes.len()));
        }
        Ok(Self(*Key::from_slice(bytes)))
    }

    /// Derives a key from an arbitrary-length secret string by hashing it
    /// down to 32 bytes, so operators can configure a human-typed
    /// passphrase rather than having to generate raw key bytes.
    #[must_use]
    pub fn from_passphrase(passphrase: &str) -> Self {
        use sha2::{Digest, Sha256};
        let digest = Sha256::digest(passphrase.as_bytes());
        Self(*Key::from_slice(&digest))
    }
}

/// Encrypts `plaintext`, returning a base64 string of `nonce || ciphertext`.
///
/// # Errors
///
/// Returns [`EncryptionError::EncryptionFailed`] if the underlying AEAD
/// operation fails (only possible on a corrupt key).
pub fn encrypt(key: &EncryptionKey, plaintext: &[u8]) -> Result<String, EncryptionError> {
    let cipher = ChaCha20Poly1305::new(&key.0);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| EncryptionError::EncryptionFailed)?;

    let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    combined.extend_from_slice(&nonce_bytes);
    combined.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(combined))
}

/// Decrypts a value produced by [`encrypt`].
///
/// # Errors
///
/// Returns [`EncryptionError::InvalidEncoding`] if `encoded` is not valid
/// base64, [`EncryptionError::MalformedCiphertext`] if it is too short to
/// contain a nonce, and [`EncryptionError::DecryptionFailed`] on an
/// authentication failure (wrong key or tampered ciphertext).
pub fn decrypt(key: &EncryptionKey, encoded: &str) -> Result<Vec<u8>, EncryptionError> {
    let combined = BASE64
        .decode(encoded)
        .map_err(|_| EncryptionError::InvalidEncoding)?;

    if combined.len() < NONCE_LEN {
        return Err(EncryptionError::MalformedCiphertext);
    }

    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);
    let cipher = ChaCha20Poly1305::new(&key.0);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| EncryptionError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_plaintext() {
        let key = EncryptionKey::from_passphrase("correct horse battery staple");
        let ciphertext = encrypt(&key, b"slack-bot-token-xyz").unwrap();
        let plaintext = decrypt(&key, &ciphertext).unwrap();
        assert_eq!(plaintext, b"slack-bot-token-xyz");
    }

    #[test]
    fn wrong_key_fails_to_decrypt() {
        let key_a = EncryptionKey::from_passphrase("alpha");
        let key_b = EncryptionKey::from_passphrase("beta");
        let ciphertext = encrypt(&key_a, b"secret").unwrap();
        assert!(matches!(
            decrypt(&key_b, &ciphertext),
            Err(EncryptionError::DecryptionFailed)
        ));
    }

    #[test]
    fn rejects_short_key() {
        assert!(matches!(
            EncryptionKey::from_bytes(b"too-short"),
            Err(EncryptionError::InvalidKeyLength(_))
        ));
    }

    #[test]
    fn two_encryptions_of_same_plaintext_differ() {
        let key = EncryptionKey::from_passphrase("k");
        let a = encrypt(&key, b"same plaintext").unwrap();
        let b = encrypt(&key, b"same plaintext").unwrap();
        assert_ne!(a, b, "nonce must be fresh per call");
    }
}
