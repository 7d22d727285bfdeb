//! Base64, URL encoding, and UUID generation.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};

pub fn single_text_schema() -> Value {
    json!({
        "type": "object",
        "properties": {"text": {"type": "string"}},
        "required": ["text"]
    })
}

pub fn base64_encode(arguments: &Value) -> String {
    let Some(text) = arguments.get("text").and_then(Value::as_str) else {
        return "Error: missing required field 'text'".to_string();
    };
    BASE64.encode(text.as_bytes())
}

pub fn base64_decode(arguments: &Value) -> String {
    let Some(text) = arguments.get("text").and_then(Value::as_str) else {
        return "Error: missing required field 'text'".to_string();
    };
    match BASE64.decode(text) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(decoded) => decoded,
            Err(_) => "Error: decoded bytes are not valid UTF-8".to_string(),
        },
        Err(err) => format!("Error: invalid base64: {err}"),
    }
}

pub fn url_encode(arguments: &Value) -> String {
    let Some(text) = arguments.get("text").and_then(Value::as_str) else {
        return "Error: missing required field 'text'".to_string();
    };
    urlencoding::encode(text).into_owned()
}

pub fn url_decode(arguments: &Value) -> String {
    let Some(text) = arguments.get("text").and_then(Value::as_str) else {
        return "Error: missing required field 'text'".to_string();
    };
    match urlencoding::decode(text) {
        Ok(decoded) => decoded.into_owned(),
        Err(err) => format!("Error: invalid percent-encoding: {err}"),
    }
}

pub fn generate_uuid(_arguments: &Value) -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_round_trips() {
        let encoded = base64_encode(&json!({"text": "hello, world"}));
        let decoded = base64_decode(&json!({"text": encoded}));
        assert_eq!(decoded, "hello, world");
    }

    #[test]
    fn url_round_trips() {
        let encoded = url_encode(&json!({"text": "a b/c?d=e"}));
        let decoded = url_decode(&json!({"text": encoded}));
        assert_eq!(decoded, "a b/c?d=e");
    }

    #[test]
    fn uuid_is_v4() {
        let out = generate_uuid(&json!({}));
        let parsed = uuid::Uuid::parse_str(&out).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn invalid_base64_is_an_error_string() {
        let out = base64_decode(&json!({"text": "not valid base64!!"}));
        assert!(out.starts_with("Error:"));
    }
}
