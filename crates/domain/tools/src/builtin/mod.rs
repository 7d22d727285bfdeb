//! The built-in pure-function tool family (spec §4.2).
//!
//! Every function here is synchronous, allocates no I/O, and never panics;
//! each returns a human-readable string, with failures distinguished only
//! by content — a string prefixed `"Error:"` (or, for the calculator,
//! `"エラー:"`, matching the original Python tool's behavior, preserved
//! because model reasoning over tool output must see the exact same
//! failure shape it always has). The engine never inspects this prefix
//! itself; it is shown to the model as-is.

mod calc;
mod convert;
mod encode;
mod hash;
mod text;
mod time;

use std::sync::Arc;

use async_trait::async_trait;
use gateway_traits::{Credentials, Service, ServiceFactory, ServiceKind, ToolDescriptor, ToolError};
use serde_json::{json, Value};

pub const CLASS_ID: &str = "builtin";

type ToolFn = fn(&Value) -> String;

struct ToolEntry {
    name: &'static str,
    description: &'static str,
    input_schema: fn() -> Value,
    category: &'static str,
    tags: &'static [&'static str],
    run: ToolFn,
}

fn entries() -> Vec<ToolEntry> {
    vec![
        ToolEntry {
            name: "current_time",
            description: "Returns the current UTC date and time in ISO 8601 format.",
            input_schema: || json!({"type": "object", "properties": {}, "required": []}),
            category: "time",
            tags: &["time"],
            run: time::current_time,
        },
        ToolEntry {
            name: "date_add",
            description: "Adds (or subtracts, with a negative count) a number of days to an ISO 8601 date.",
            input_schema: time::date_add_schema,
            category: "time",
            tags: &["time", "date"],
            run: time::date_add,
        },
        ToolEntry {
            name: "date_diff",
            description: "Returns the number of whole days between two ISO 8601 dates.",
            input_schema: time::date_diff_schema,
            category: "time",
            tags: &["time", "date"],
            run: time::date_diff,
        },
        ToolEntry {
            name: "calculate",
            description: "Evaluates an arithmetic expression using +, -, *, /, parentheses, and decimals.",
            input_schema: calc::calculate_schema,
            category: "math",
            tags: &["math"],
            run: calc::calculate,
        },
        ToolEntry {
            name: "statistics",
            description: "Computes mean, median, min, max, and standard deviation of a list of numbers.",
            input_schema: calc::statistics_schema,
            category: "math",
            tags: &["math", "statistics"],
            run: calc::statistics,
        },
        ToolEntry {
            name: "percentage",
            description: "Computes what percentage `part` is of `whole`, or applies a percentage to a value.",
            input_schema: calc::percentage_schema,
            category: "math",
            tags: &["math"],
            run: calc::percentage,
        },
        ToolEntry {
            name: "count_text",
            description: "Counts characters, words, and lines in a piece of text.",
            input_schema: text::count_text_schema,
            category: "text",
            tags: &["text"],
            run: text::count_text,
        },
        ToolEntry {
            name: "change_case",
            description: "Converts text to upper, lower, title, or snake case.",
            input_schema: text::change_case_schema,
            category: "text",
            tags: &["text"],
            run: text::change_case,
        },
        ToolEntry {
            name: "regex_search",
            description: "Finds all matches of a regular expression in text.",
            input_schema: text::regex_search_schema,
            category: "text",
            tags: &["text", "regex"],
            run: text::regex_search,
        },
        ToolEntry {
            name: "regex_replace",
            description: "Replaces all matches of a regular expression in text with a replacement string.",
            input_schema: text::regex_replace_schema,
            category: "text",
            tags: &["text", "regex"],
            run: text::regex_replace,
        },
        ToolEntry {
            name: "json_format",
            description: "Pretty-prints a JSON string with two-space indentation.",
            input_schema: text::json_format_schema,
            category: "text",
            tags: &["text", "json"],
            run: text::json_format,
        },
        ToolEntry {
            name: "base64_encode",
            description: "Encodes a UTF-8 string as base64.",
            input_schema: encode::single_text_schema,
            category: "encoding",
            tags: &["encoding"],
            run: encode::base64_encode,
        },
        ToolEntry {
            name: "base64_decode",
            description: "Decodes a base64 string to UTF-8 text.",
            input_schema: encode::single_text_schema,
            category: "encoding",
            tags: &["encoding"],
            run: encode::base64_decode,
        },
        ToolEntry {
            name: "url_encode",
            description: "Percent-encodes a string for safe use in a URL.",
            input_schema: encode::single_text_schema,
            category: "encoding",
            tags: &["encoding"],
            run: encode::url_encode,
        },
        ToolEntry {
            name: "url_decode",
            description: "Decodes a percent-encoded URL string.",
            input_schema: encode::single_text_schema,
            category: "encoding",
            tags: &["encoding"],
            run: encode::url_decode,
        },
        ToolEntry {
            name: "generate_uuid",
            description: "Generates a random UUIDv4.",
            input_schema: || json!({"type": "object", "properties": {}, "required": []}),
            category: "encoding",
            tags: &["encoding", "uuid"],
            run: encode::generate_uuid,
        },
        ToolEntry {
            name: "hash_text",
            description: "Computes a cryptographic hash (md5, sha1, sha256, or sha512) of text.",
            input_schema: hash::hash_text_schema,
            category: "encoding",
            tags: &["encoding", "hash"],
            run: hash::hash_text,
        },
        ToolEntry {
            name: "convert_temperature",
            description: "Converts a temperature between Celsius, Fahrenheit, and Kelvin.",
            input_schema: convert::convert_temperature_schema,
            category: "conversion",
            tags: &["conversion", "units"],
            run: convert::convert_temperature,
        },
        ToolEntry {
            name: "convert_length",
            description: "Converts a length between meters, feet, miles, kilometers, and inches.",
            input_schema: convert::convert_length_schema,
            category: "conversion",
            tags: &["conversion", "units"],
            run: convert::convert_length,
        },
    ]
}

fn descriptors() -> Vec<ToolDescriptor> {
    entries()
        .into_iter()
        .map(|entry| ToolDescriptor {
            name: entry.name.to_string(),
            description: entry.description.to_string(),
            input_schema: (entry.input_schema)(),
            category: entry.category.to_string(),
            tags: entry.tags.iter().map(|s| (*s).to_string()).collect(),
        })
        .collect()
}

/// The always-available, credential-free built-in tool service.
#[derive(Debug, Default)]
pub struct BuiltInService;

#[async_trait]
impl Service for BuiltInService {
    fn class_id(&self) -> &str {
        CLASS_ID
    }

    fn kind(&self) -> ServiceKind {
        ServiceKind::BuiltIn
    }

    fn tools(&self) -> Vec<ToolDescriptor> {
        descriptors()
    }

    async fn invoke(&self, tool_name: &str, arguments: Value) -> Result<String, ToolError> {
        let entry = entries()
            .into_iter()
            .find(|entry| entry.name == tool_name)
            .ok_or_else(|| ToolError::NotFound(tool_name.to_string()))?;
        Ok((entry.run)(&arguments))
    }
}

fn construct(_config: Value, _credentials: Credentials) -> Arc<dyn Service> {
    Arc::new(BuiltInService)
}

inventory::submit! {
    ServiceFactory {
        class_id: CLASS_ID,
        display_name: "Built-in utilities",
        kind: ServiceKind::BuiltIn,
        credential_schema: || json!({"type": "object", "properties": {}, "required": []}),
        tools: descriptors,
        construct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_tool_name_is_unique() {
        let mut names: Vec<_> = descriptors().into_iter().map(|d| d.name).collect();
        let before = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), before);
    }

    #[tokio::test]
    async fn descriptors_are_non_empty_with_non_empty_descriptions() {
        let descriptors = descriptors();
        assert!(!descriptors.is_empty());
        for descriptor in descriptors {
            assert!(!descriptor.description.is_empty());
        }
    }

    #[tokio::test]
    async fn unknown_tool_name_is_not_found() {
        let service = BuiltInService;
        let err = service.invoke("does_not_exist", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }
}
