//! Cryptographic hashing (md5, sha1, sha256, sha512) of text.

use md5::Md5;
use serde_json::{json, Value};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

pub fn hash_text_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "text": {"type": "string"},
            "algorithm": {"type": "string", "enum": ["md5", "sha1", "sha256", "sha512"]}
        },
        "required": ["text", "algorithm"]
    })
}

pub fn hash_text(arguments: &Value) -> String {
    let Some(text) = arguments.get("text").and_then(Value::as_str) else {
        return "Error: missing required field 'text'".to_string();
    };
    let Some(algorithm) = arguments.get("algorithm").and_then(Value::as_str) else {
        return "Error: missing required field 'algorithm'".to_string();
    };
    match algorithm {
        "md5" => hex::encode(Md5::digest(text.as_bytes())),
        "sha1" => hex::encode(Sha1::digest(text.as_bytes())),
        "sha256" => hex::encode(Sha256::digest(text.as_bytes())),
        "sha512" => hex::encode(Sha512::digest(text.as_bytes())),
        other => format!("Error: unknown algorithm '{other}', expected md5, sha1, sha256, or sha512"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_matches_known_digest() {
        let out = hash_text(&json!({"text": "hello", "algorithm": "sha256"}));
        assert_eq!(out, "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824");
    }

    #[test]
    fn unknown_algorithm_is_an_error_string() {
        let out = hash_text(&json!({"text": "hello", "algorithm": "sha3"}));
        assert!(out.starts_with("Error:"));
    }
}
