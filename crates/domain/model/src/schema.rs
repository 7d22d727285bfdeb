//! Maps a registry [`ToolDescriptor`] into each vendor's function-calling
//! wire format.
//!
//! Every vendor wants the same three facts — name, description, JSON
//! Schema of arguments — wrapped differently. `input_schema` is passed
//! straight through unmodified: the registry already produces valid JSON
//! Schema (`gateway-traits::ToolDescriptor`), so there is no structural
//! transformation to do, only re-wrapping.

use gateway_traits::ToolDescriptor;
use serde_json::{json, Value};

/// OpenAI (and Gemini, which accepts an equivalent shape) function-calling
/// tool entry: `{"type": "function", "function": {name, description,
/// parameters}}`.
#[must_use]
pub fn to_openai_tool(tool: &ToolDescriptor) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.input_schema,
        }
    })
}

/// Anthropic tool-use entry: `{name, description, input_schema}`.
#[must_use]
pub fn to_anthropic_tool(tool: &ToolDescriptor) -> Value {
    json!({
        "name": tool.name,
        "description": tool.description,
        "input_schema": tool.input_schema,
    })
}

/// Gemini's `functionDeclarations` entry — same fields as OpenAI's
/// `function` object, but Gemini wants `parameters` only (no outer
/// `type`/`function` wrapper, and it is nested under
/// `tools: [{ functionDeclarations: [...] }]` by the caller).
#[must_use]
pub fn to_gemini_function_declaration(tool: &ToolDescriptor) -> Value {
    json!({
        "name": tool.name,
        "description": tool.description,
        "parameters": tool.input_schema,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tool() -> ToolDescriptor {
        ToolDescriptor {
            name: "calculator".to_string(),
            description: "Evaluate an arithmetic expression".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": { "expression": { "type": "string" } },
                "required": ["expression"],
            }),
            category: "builtin".to_string(),
            tags: vec![],
        }
    }

    #[test]
    fn openai_wrapping_preserves_schema_untouched() {
        let tool = sample_tool();
        let wrapped = to_openai_tool(&tool);
        assert_eq!(wrapped["function"]["parameters"], tool.input_schema);
        assert_eq!(wrapped["type"], "function");
    }

    #[test]
    fn anthropic_wrapping_uses_input_schema_key() {
        let tool = sample_tool();
        let wrapped = to_anthropic_tool(&tool);
        assert_eq!(wrapped["input_schema"], tool.input_schema);
        assert!(wrapped.get("type").is_none());
    }
}
