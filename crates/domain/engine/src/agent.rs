//! The Agent Execution Engine (spec §4.6): the bounded *reason → invoke
//! tool → observe → respond* loop that turns one validated request into a
//! terminal `done`/`error` event.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use gateway_events::{DoneMetadata, EventSender, ToolCallRecord, ToolCallStatus, TokenUsage as EventTokenUsage};
use gateway_identifiers::ConversationId;
use gateway_model::strategy::{parse_step, ParsedStep};
use gateway_model::{AgentStrategy, AiProvider, ChatMessage, GenerationRequest, ProviderError, Role, StreamChunk};
use gateway_traits::ToolDescriptor;
use serde_json::Value;
use tracing::warn;

use crate::catalog::ToolCatalog;
use crate::error::EngineError;
use crate::types::CompletionMode;

/// Hard bound on reasoning iterations (spec §4.6).
pub const MAX_ITERATIONS: u32 = 10;
/// Hard wall-clock bound for one request, from entry to terminal event
/// (spec §4.6, §5).
pub const MAX_WALL_TIME: Duration = Duration::from_secs(120);

/// Everything the loop needs, already validated and resolved (spec §4.6
/// "Inputs and guards" must have already run before this is constructed —
/// see [`crate::prepare::prepare`]).
pub struct LoopInputs {
    pub conversation_id: ConversationId,
    pub provider: Arc<dyn AiProvider>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: String,
    pub history: Vec<ChatMessage>,
    pub user_message: String,
    pub catalog: ToolCatalog,
    pub strategy: AgentStrategy,
    pub completion_mode: CompletionMode,
}

/// Runs the agent loop to completion, emitting every intermediate event
/// on `sender` and exactly one terminal event at the end. Never returns
/// an `Err` to the caller — every failure becomes `Event::Error` (spec
/// §9: "tool/model failure as a return value", not exception-driven
/// control flow at this boundary).
pub async fn run(inputs: LoopInputs, mut sender: EventSender) {
    let start = Instant::now();
    match tokio::time::timeout(MAX_WALL_TIME, drive(&inputs, &mut sender, start)).await {
        Ok(Ok(outcome)) => {
            if let Err(err) = finalize(&inputs, sender, outcome, start).await {
                warn!(error = %err, "failed to deliver terminal done event");
            }
        }
        Ok(Err(err)) => {
            let _ = sender.finish_error(err.code(), err.to_string()).await;
        }
        Err(_) => {
            let _ = sender.finish_error(EngineError::Timeout.code(), EngineError::Timeout.to_string()).await;
        }
    }
}

struct Outcome {
    final_message: String,
    tool_calls: Vec<ToolCallRecord>,
    usage: EventTokenUsage,
}

async fn finalize(inputs: &LoopInputs, sender: EventSender, outcome: Outcome, start: Instant) -> Result<(), gateway_events::EventError> {
    sender
        .finish_done(
            inputs.conversation_id.clone(),
            outcome.final_message,
            outcome.tool_calls.clone(),
            DoneMetadata {
                provider: inputs.provider.name().to_string(),
                model: inputs.model.clone(),
                token_usage: outcome.usage,
                total_processing_time_ms: start.elapsed().as_millis() as u64,
                tool_call_count: outcome.tool_calls.len(),
            },
        )
        .await
}

async fn drive(inputs: &LoopInputs, sender: &mut EventSender, _start: Instant) -> Result<Outcome, EngineError> {
    let mut messages = vec![ChatMessage::new(Role::System, inputs.system_prompt.clone())];
    messages.extend(inputs.history.iter().cloned());
    messages.push(ChatMessage::new(Role::User, inputs.user_message.clone()));

    let tool_descriptors = inputs.catalog.descriptors();
    let mut tool_calls_made: Vec<ToolCallRecord> = Vec::new();
    let mut final_message = String::new();
    let mut usage = EventTokenUsage::default();
    let mut grammar_retry_used = false;

    for _iteration in 0..MAX_ITERATIONS {
        let request = GenerationRequest { model: &inputs.model, messages: &messages, temperature: inputs.temperature, max_tokens: inputs.max_tokens };

        let (iteration_text, tool_requests) = run_one_generation(inputs, &request, &tool_descriptors, sender, &mut usage).await?;

        match inputs.strategy {
            AgentStrategy::FunctionCalling => {
                if tool_requests.is_empty() {
                    final_message.push_str(&iteration_text);
                    return Ok(Outcome { final_message: finish_message(inputs, &final_message, &tool_calls_made)?, tool_calls: tool_calls_made, usage });
                }

                messages.push(ChatMessage::new(Role::Assistant, iteration_text));
                for request in tool_requests {
                    let record = execute_tool_call(inputs, sender, &request.name, request.arguments).await;
                    messages.push(observation_turn(&request.name, &record));
                    tool_calls_made.push(record);
                }
            }
            AgentStrategy::TextProtocol => match parse_step(&iteration_text) {
                Ok(ParsedStep::FinalAnswer { content }) => {
                    return Ok(Outcome { final_message: finish_message(inputs, &content, &tool_calls_made)?, tool_calls: tool_calls_made, usage });
                }
                Ok(ParsedStep::Action { tool_name, input }) => {
                    messages.push(ChatMessage::new(Role::Assistant, iteration_text));
                    let record = execute_tool_call(inputs, sender, &tool_name, input).await;
                    messages.push(observation_turn(&tool_name, &record));
                    tool_calls_made.push(record);
                }
                Err(_) if !grammar_retry_used => {
                    grammar_retry_used = true;
                    messages.push(ChatMessage::new(Role::Assistant, iteration_text));
                    messages.push(ChatMessage::new(
                        Role::User,
                        "Observation: your previous response did not match the required Thought/Action/Action Input or Thought/Final Answer grammar. Respond again using exactly that grammar.".to_string(),
                    ));
                }
                Err(_) => {
                    return Ok(Outcome { final_message: finish_message(inputs, &iteration_text, &tool_calls_made)?, tool_calls: tool_calls_made, usage });
                }
            },
        }
    }

    Ok(Outcome { final_message: finish_message(inputs, &final_message, &tool_calls_made)?, tool_calls: tool_calls_made, usage })
}

/// Applies spec §4.6 "Completion-mode enforcement" before accepting any
/// terminal message, whether the loop ended on iteration 1 or after
/// exhausting [`MAX_ITERATIONS`] — every early return goes through here,
/// not just the loop-exhausted path.
fn finish_message(inputs: &LoopInputs, message: &str, tool_calls: &[ToolCallRecord]) -> Result<String, EngineError> {
    enforce_completion_mode(inputs, tool_calls)?;
    Ok(message.to_string())
}

/// Spec §4.6 "Completion-mode enforcement": a `tools_required` request
/// that reaches loop exit without ever invoking a tool is a failure.
fn enforce_completion_mode(inputs: &LoopInputs, tool_calls: &[ToolCallRecord]) -> Result<(), EngineError> {
    if inputs.completion_mode == CompletionMode::ToolsRequired && tool_calls.is_empty() {
        return Err(EngineError::ToolsRequiredButNotUsed);
    }
    Ok(())
}

async fn run_one_generation(
    inputs: &LoopInputs,
    request: &GenerationRequest<'_>,
    tool_descriptors: &[ToolDescriptor],
    sender: &mut EventSender,
    usage: &mut EventTokenUsage,
) -> Result<(String, Vec<gateway_model::ToolCallRequest>), EngineError> {
    let mut stream = match inputs.strategy {
        AgentStrategy::FunctionCalling if !tool_descriptors.is_empty() => {
            inputs.provider.generate_with_tools_stream(request.clone(), tool_descriptors).await?
        }
        _ => inputs.provider.generate_stream(request.clone()).await?,
    };

    let mut text = String::new();
    let mut tool_requests = Vec::new();

    while let Some(chunk) = stream.next().await {
        match chunk? {
            StreamChunk::TextDelta(delta) => {
                text.push_str(&delta);
                sender.emit_token(delta).await.map_err(|err| EngineError::Internal(err.to_string()))?;
            }
            StreamChunk::ToolCall(call) => tool_requests.push(call),
            StreamChunk::Usage(reported) => {
                usage.prompt_tokens += reported.prompt_tokens;
                usage.completion_tokens += reported.completion_tokens;
                usage.total_tokens = usage.prompt_tokens + usage.completion_tokens;
            }
        }
    }

    Ok((text, tool_requests))
}

/// Spec §4.6 "Tool invocation": `tool_start` at the current insert
/// position, run with the tool's own declared timeout, truncate output to
/// 500 chars for the event, `tool_end` with status/elapsed, full output
/// into the scratchpad. Never fatal: failures become `status: failed`.
async fn execute_tool_call(inputs: &LoopInputs, sender: &mut EventSender, tool_name: &str, arguments: Value) -> ToolCallRecord {
    const OUTPUT_EVENT_BUDGET: usize = 500;

    let tool_id = match sender.emit_tool_start(tool_name, arguments.clone()).await {
        Ok(id) => id,
        Err(_) => gateway_identifiers::ToolCallId::generate(),
    };

    let started = Instant::now();
    let outcome = match inputs.catalog.find(tool_name) {
        Some(bound) => bound.invoke(arguments.clone()).await,
        None => Err(gateway_traits::ToolError::NotFound(tool_name.to_string())),
    };
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let (status, output, error) = match &outcome {
        Ok(output) => (ToolCallStatus::Completed, Some(Value::String(output.clone())), None),
        Err(err) => (ToolCallStatus::Failed, None, Some(err.to_string())),
    };

    let truncated_output = output.as_ref().and_then(Value::as_str).map(|s| truncate_chars(s, OUTPUT_EVENT_BUDGET)).map(Value::String);

    let _ = sender.emit_tool_end(tool_id.clone(), status, truncated_output, error.clone(), elapsed_ms).await;

    ToolCallRecord { tool_call_id: tool_id, tool_name: tool_name.to_string(), input: arguments, output, status, execution_time_ms: elapsed_ms }
}

fn observation_turn(tool_name: &str, record: &ToolCallRecord) -> ChatMessage {
    let body = match (&record.output, &record.error) {
        (Some(Value::String(output)), _) => output.clone(),
        (_, Some(error)) => format!("tool failed: {error}"),
        _ => String::new(),
    };
    ChatMessage::new(Role::User, format!("Observation from {tool_name}: {body}"))
}

fn truncate_chars(input: &str, limit: usize) -> String {
    if input.chars().count() <= limit {
        input.to_string()
    } else {
        input.chars().take(limit).collect()
    }
}

impl From<ProviderError> for EngineError {
    fn from(err: ProviderError) -> Self {
        crate::error::EngineError::from(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gateway_model::{ModelPricing, ToolAwareCompletion};
    use gateway_model::{StreamChunk as ModelStreamChunk, TextCompletion};
    use std::pin::Pin;

    #[test]
    fn truncation_respects_char_budget() {
        let long = "a".repeat(600);
        assert_eq!(truncate_chars(&long, 500).chars().count(), 500);
    }

    #[test]
    fn short_output_is_untouched() {
        assert_eq!(truncate_chars("short", 500), "short");
    }

    /// Never driven in these tests — only `inputs.completion_mode` is read
    /// by `finish_message`/`enforce_completion_mode` — so every method
    /// that would touch the network is unreachable.
    #[derive(Debug)]
    struct UnusedProvider;

    #[async_trait]
    impl AiProvider for UnusedProvider {
        fn name(&self) -> &str {
            "unused"
        }
        fn supports_model(&self, _model: &str) -> bool {
            true
        }
        fn default_model(&self) -> &str {
            "stub-model"
        }
        fn get_pricing(&self, _model: &str) -> ModelPricing {
            ModelPricing { input_cost_per_1k: 0.0, output_cost_per_1k: 0.0 }
        }
        fn supports_native_tool_calling(&self) -> bool {
            true
        }
        fn supports_streaming(&self) -> bool {
            true
        }
        async fn generate(&self, _request: GenerationRequest<'_>) -> Result<TextCompletion, ProviderError> {
            unreachable!("not exercised by finish_message tests")
        }
        async fn generate_with_tools(&self, _request: GenerationRequest<'_>, _tools: &[gateway_traits::ToolDescriptor]) -> Result<ToolAwareCompletion, ProviderError> {
            unreachable!("not exercised by finish_message tests")
        }
        async fn generate_stream(&self, _request: GenerationRequest<'_>) -> Result<Pin<Box<dyn futures_util::Stream<Item = Result<ModelStreamChunk, ProviderError>> + Send>>, ProviderError> {
            unreachable!("not exercised by finish_message tests")
        }
        async fn generate_with_tools_stream(
            &self,
            _request: GenerationRequest<'_>,
            _tools: &[gateway_traits::ToolDescriptor],
        ) -> Result<Pin<Box<dyn futures_util::Stream<Item = Result<ModelStreamChunk, ProviderError>> + Send>>, ProviderError> {
            unreachable!("not exercised by finish_message tests")
        }
    }

    fn inputs_with_mode(completion_mode: CompletionMode) -> LoopInputs {
        LoopInputs {
            conversation_id: ConversationId::new("conv-1"),
            provider: Arc::new(UnusedProvider),
            model: "stub-model".to_string(),
            temperature: 0.7,
            max_tokens: 512,
            system_prompt: String::new(),
            history: Vec::new(),
            user_message: "hello".to_string(),
            catalog: crate::catalog::ToolCatalog::default(),
            strategy: AgentStrategy::FunctionCalling,
            completion_mode,
        }
    }

    #[test]
    fn finish_message_rejects_tools_required_with_no_tool_calls_on_first_iteration() {
        let inputs = inputs_with_mode(CompletionMode::ToolsRequired);
        let err = finish_message(&inputs, "a direct answer", &[]).unwrap_err();
        assert!(matches!(err, EngineError::ToolsRequiredButNotUsed));
    }

    #[test]
    fn finish_message_allows_auto_mode_with_no_tool_calls() {
        let inputs = inputs_with_mode(CompletionMode::Auto);
        let message = finish_message(&inputs, "a direct answer", &[]).unwrap();
        assert_eq!(message, "a direct answer");
    }
}
