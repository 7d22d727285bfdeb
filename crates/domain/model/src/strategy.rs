//! Agent shape selection and the text-protocol fallback grammar.
//!
//! Spec §4.6: vendors with native tool calling get a function-calling
//! agent; vendors without it get a text-protocol agent that is instructed,
//! in the system prompt, to emit a `Thought / Action / Action Input /
//! Observation / Final Answer` grammar which this module parses.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStrategy {
    FunctionCalling,
    TextProtocol,
}

/// Chooses the agent shape for a provider based on its native tool-calling
/// support (spec §4.6).
#[must_use]
pub fn select_strategy(supports_native_tool_calling: bool) -> AgentStrategy {
    if supports_native_tool_calling {
        AgentStrategy::FunctionCalling
    } else {
        AgentStrategy::TextProtocol
    }
}

/// The directive appended to the system prompt for [`AgentStrategy::TextProtocol`].
pub const TEXT_PROTOCOL_DIRECTIVE: &str = "\
When you need a tool, respond with exactly this grammar and nothing else:\n\
Thought: <your reasoning>\n\
Action: <tool name>\n\
Action Input: <JSON object of arguments>\n\
When you are done and have a final answer, respond with exactly:\n\
Thought: <your reasoning>\n\
Final Answer: <your answer to the user>\n";

/// One step parsed out of a text-protocol model response.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedStep {
    Action { tool_name: String, input: Value },
    FinalAnswer { content: String },
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("model output did not match the Thought/Action/Final Answer grammar")]
pub struct ParseError;

/// Parses one model response against the text-protocol grammar.
///
/// Tolerant: a `Final Answer:` line anywhere in the text is recognized even
/// without an `Action`. Returns [`ParseError`] if neither an `Action`/
/// `Action Input` pair nor a `Final Answer` can be found; the caller is
/// expected to feed this back as an observation and retry once (spec
/// §4.6: "one recovery attempt... before the iteration cap takes effect").
pub fn parse_step(response: &str) -> Result<ParsedStep, ParseError> {
    if let Some(final_answer) = extract_after(response, "Final Answer:") {
        return Ok(ParsedStep::FinalAnswer {
            content: final_answer.trim().to_string(),
        });
    }

    let tool_name = extract_after(response, "Action:").ok_or(ParseError)?;
    let raw_input = extract_after(response, "Action Input:").ok_or(ParseError)?;

    let input: Value = serde_json::from_str(raw_input.trim()).unwrap_or_else(|_| {
        Value::Object(serde_json::Map::from_iter([(
            "input".to_string(),
            Value::String(raw_input.trim().to_string()),
        )]))
    });

    Ok(ParsedStep::Action {
        tool_name: tool_name.trim().to_string(),
        input,
    })
}

/// Returns the text on the same line following `marker`, stopping at the
/// next newline.
fn extract_after<'a>(haystack: &'a str, marker: &str) -> Option<&'a str> {
    let start = haystack.find(marker)? + marker.len();
    let rest = &haystack[start..];
    Some(rest.lines().next().unwrap_or(rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_action_step() {
        let text = "Thought: I need the weather\nAction: weather\nAction Input: {\"city\": \"Berlin\"}\n";
        let step = parse_step(text).unwrap();
        assert_eq!(
            step,
            ParsedStep::Action {
                tool_name: "weather".to_string(),
                input: serde_json::json!({"city": "Berlin"}),
            }
        );
    }

    #[test]
    fn parses_final_answer() {
        let text = "Thought: I know this\nFinal Answer: The sky is blue.";
        let step = parse_step(text).unwrap();
        assert_eq!(
            step,
            ParsedStep::FinalAnswer {
                content: "The sky is blue.".to_string()
            }
        );
    }

    #[test]
    fn falls_back_to_raw_string_input_on_bad_json() {
        let text = "Action: weather\nAction Input: Berlin, no quotes\n";
        let step = parse_step(text).unwrap();
        match step {
            ParsedStep::Action { input, .. } => {
                assert_eq!(input["input"], "Berlin, no quotes");
            }
            other => panic!("expected Action, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_text_is_an_error() {
        assert_eq!(parse_step("I am just rambling with no grammar"), Err(ParseError));
    }

    #[test]
    fn native_tool_calling_selects_function_calling_strategy() {
        assert_eq!(select_strategy(true), AgentStrategy::FunctionCalling);
        assert_eq!(select_strategy(false), AgentStrategy::TextProtocol);
    }
}
