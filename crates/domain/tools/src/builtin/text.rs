//! Character/word/line counting, case transforms, regex, and JSON formatting.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

pub fn count_text_schema() -> Value {
    json!({
        "type": "object",
        "properties": {"text": {"type": "string"}},
        "required": ["text"]
    })
}

pub fn count_text(arguments: &Value) -> String {
    let Some(text) = arguments.get("text").and_then(Value::as_str) else {
        return "Error: missing required field 'text'".to_string();
    };
    let chars = text.chars().count();
    let words = text.split_whitespace().count();
    let lines = if text.is_empty() { 0 } else { text.lines().count() };
    format!("characters: {chars}, words: {words}, lines: {lines}")
}

pub fn change_case_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "text": {"type": "string"},
            "case": {"type": "string", "enum": ["upper", "lower", "title", "snake"]}
        },
        "required": ["text", "case"]
    })
}

pub fn change_case(arguments: &Value) -> String {
    let Some(text) = arguments.get("text").and_then(Value::as_str) else {
        return "Error: missing required field 'text'".to_string();
    };
    let Some(case) = arguments.get("case").and_then(Value::as_str) else {
        return "Error: missing required field 'case'".to_string();
    };
    match case {
        "upper" => text.to_uppercase(),
        "lower" => text.to_lowercase(),
        "title" => text
            .split_whitespace()
            .map(title_case_word)
            .collect::<Vec<_>>()
            .join(" "),
        "snake" => text
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("_"),
        other => format!("Error: unknown case '{other}', expected upper, lower, title, or snake"),
    }
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

pub fn regex_search_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "text": {"type": "string"},
            "pattern": {"type": "string"}
        },
        "required": ["text", "pattern"]
    })
}

static REGEX_CACHE: Lazy<Mutex<HashMap<String, Regex>>> = Lazy::new(|| Mutex::new(HashMap::new()));

fn compile_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut cache = REGEX_CACHE.lock().expect("regex cache mutex is never poisoned");
    if let Some(compiled) = cache.get(pattern) {
        return Ok(compiled.clone());
    }
    let compiled = Regex::new(pattern)?;
    cache.insert(pattern.to_string(), compiled.clone());
    Ok(compiled)
}

pub fn regex_search(arguments: &Value) -> String {
    let Some(text) = arguments.get("text").and_then(Value::as_str) else {
        return "Error: missing required field 'text'".to_string();
    };
    let Some(pattern) = arguments.get("pattern").and_then(Value::as_str) else {
        return "Error: missing required field 'pattern'".to_string();
    };
    match compile_regex(pattern) {
        Ok(regex) => {
            let matches: Vec<&str> = regex.find_iter(text).map(|m| m.as_str()).collect();
            if matches.is_empty() {
                "no matches".to_string()
            } else {
                matches.join(", ")
            }
        }
        Err(err) => format!("Error: invalid regular expression: {err}"),
    }
}

pub fn regex_replace_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "text": {"type": "string"},
            "pattern": {"type": "string"},
            "replacement": {"type": "string"}
        },
        "required": ["text", "pattern", "replacement"]
    })
}

pub fn regex_replace(arguments: &Value) -> String {
    let Some(text) = arguments.get("text").and_then(Value::as_str) else {
        return "Error: missing required field 'text'".to_string();
    };
    let Some(pattern) = arguments.get("pattern").and_then(Value::as_str) else {
        return "Error: missing required field 'pattern'".to_string();
    };
    let Some(replacement) = arguments.get("replacement").and_then(Value::as_str) else {
        return "Error: missing required field 'replacement'".to_string();
    };
    match compile_regex(pattern) {
        Ok(regex) => regex.replace_all(text, replacement).into_owned(),
        Err(err) => format!("Error: invalid regular expression: {err}"),
    }
}

pub fn json_format_schema() -> Value {
    json!({
        "type": "object",
        "properties": {"json": {"type": "string"}},
        "required": ["json"]
    })
}

pub fn json_format(arguments: &Value) -> String {
    let Some(raw) = arguments.get("json").and_then(Value::as_str) else {
        return "Error: missing required field 'json'".to_string();
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(parsed) => serde_json::to_string_pretty(&parsed).unwrap_or_else(|_| raw.to_string()),
        Err(err) => format!("Error: invalid JSON: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_characters_words_lines() {
        let out = count_text(&json!({"text": "hello world\nsecond line"}));
        assert_eq!(out, "characters: 23, words: 4, lines: 2");
    }

    #[test]
    fn changes_case_variants() {
        assert_eq!(change_case(&json!({"text": "hello world", "case": "upper"})), "HELLO WORLD");
        assert_eq!(change_case(&json!({"text": "HELLO", "case": "lower"})), "hello");
        assert_eq!(change_case(&json!({"text": "hello world", "case": "title"})), "Hello World");
        assert_eq!(change_case(&json!({"text": "Hello World", "case": "snake"})), "hello_world");
    }

    #[test]
    fn regex_search_finds_matches() {
        let out = regex_search(&json!({"text": "cat bat hat", "pattern": r"\w at"}));
        assert!(out.contains("at"));
    }

    #[test]
    fn regex_replace_substitutes() {
        let out = regex_replace(&json!({"text": "a1b2c3", "pattern": r"\d", "replacement": "#"}));
        assert_eq!(out, "a#b#c#");
    }

    #[test]
    fn json_format_pretty_prints() {
        let out = json_format(&json!({"json": r#"{"a":1}"#}));
        assert!(out.contains('\n'));
    }

    #[test]
    fn json_format_reports_parse_error() {
        let out = json_format(&json!({"json": "not json"}));
        assert!(out.starts_with("Error:"));
    }
}
