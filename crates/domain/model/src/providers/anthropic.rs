//! The Anthropic Messages API provider.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use gateway_traits::ToolDescriptor;
use serde_json::{json, Value};

use crate::message::{ChatMessage, Role, StreamChunk, TextCompletion, ToolAwareCompletion, ToolCallRequest, TokenUsage};
use crate::provider::{AiProvider, GenerationRequest, ModelPricing, ProviderError};
use crate::schema::to_anthropic_tool;

const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug)]
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl AnthropicProvider {
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            client: super::build_http_client().unwrap_or_default(),
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Anthropic separates the system prompt from the message turns.
    fn split_system_and_turns(messages: &[ChatMessage]) -> (Option<String>, Vec<Value>) {
        let mut system = None;
        let mut turns = Vec::new();
        for message in messages {
            match message.role {
                Role::System => system = Some(message.content.clone()),
                Role::User => turns.push(json!({ "role": "user", "content": message.content })),
                Role::Assistant => turns.push(json!({ "role": "assistant", "content": message.content })),
            }
        }
        (system, turns)
    }

    fn base_body(&self, request: &GenerationRequest<'_>) -> Value {
        let (system, turns) = Self::split_system_and_turns(request.messages);
        let mut body = json!({
            "model": request.model,
            "messages": turns,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });
        if let Some(system) = system {
            body["system"] = json!(system);
        }
        body
    }

    async fn post(&self, body: Value) -> Result<Value, ProviderError> {
        let response = self
            .client
            .post(format!("{}/messages", self.endpoint))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Unavailable(err.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::VendorRejected(format!("{status}: {text}")));
        }

        response
            .json::<Value>()
            .await
            .map_err(|err| ProviderError::MalformedResponse(err.to_string()))
    }

    fn parse_usage(body: &Value) -> Option<TokenUsage> {
        let usage = body.get("usage")?;
        Some(TokenUsage {
            prompt_tokens: usage["input_tokens"].as_u64().unwrap_or(0) as u32,
            completion_tokens: usage["output_tokens"].as_u64().unwrap_or(0) as u32,
        })
    }

    fn parse_content_blocks(body: &Value) -> (Option<String>, Vec<ToolCallRequest>) {
        let mut text_parts = Vec::new();
        let mut tool_calls = Vec::new();
        for block in body["content"].as_array().into_iter().flatten() {
            match block["type"].as_str() {
                Some("text") => {
                    if let Some(text) = block["text"].as_str() {
                        text_parts.push(text.to_string());
                    }
                }
                Some("tool_use") => {
                    if let (Some(id), Some(name)) = (block["id"].as_str(), block["name"].as_str()) {
                        tool_calls.push(ToolCallRequest {
                            id: id.to_string(),
                            name: name.to_string(),
                            arguments: block["input"].clone(),
                        });
                    }
                }
                _ => {}
            }
        }
        let content = (!text_parts.is_empty()).then(|| text_parts.join(""));
        (content, tool_calls)
    }
}

#[async_trait]
impl AiProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn supports_model(&self, model: &str) -> bool {
        model.starts_with("claude-")
    }

    fn default_model(&self) -> &str {
        "claude-sonnet-4"
    }

    fn get_pricing(&self, model: &str) -> ModelPricing {
        if model.contains("opus") {
            ModelPricing { input_cost_per_1k: 0.015, output_cost_per_1k: 0.075 }
        } else {
            ModelPricing { input_cost_per_1k: 0.003, output_cost_per_1k: 0.015 }
        }
    }

    fn supports_native_tool_calling(&self) -> bool {
        true
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    async fn generate(&self, request: GenerationRequest<'_>) -> Result<TextCompletion, ProviderError> {
        let body = self.base_body(&request);
        let response = self.post(body).await?;
        let (content, _) = Self::parse_content_blocks(&response);
        Ok(TextCompletion {
            content: content.unwrap_or_default(),
            usage: Self::parse_usage(&response),
        })
    }

    async fn generate_with_tools(
        &self,
        request: GenerationRequest<'_>,
        tools: &[ToolDescriptor],
    ) -> Result<ToolAwareCompletion, ProviderError> {
        let mut body = self.base_body(&request);
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools.iter().map(to_anthropic_tool).collect());
        }
        let response = self.post(body).await?;
        let (content, tool_calls) = Self::parse_content_blocks(&response);
        Ok(ToolAwareCompletion { content, tool_calls, usage: Self::parse_usage(&response) })
    }

    async fn generate_stream(
        &self,
        request: GenerationRequest<'_>,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamChunk, ProviderError>> + Send>>, ProviderError> {
        self.generate_with_tools_stream(request, &[]).await
    }

    async fn generate_with_tools_stream(
        &self,
        request: GenerationRequest<'_>,
        tools: &[ToolDescriptor],
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamChunk, ProviderError>> + Send>>, ProviderError> {
        let mut body = self.base_body(&request);
        body["stream"] = json!(true);
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools.iter().map(to_anthropic_tool).collect());
        }

        let response = self
            .client
            .post(format!("{}/messages", self.endpoint))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|err| ProviderError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::VendorRejected(format!("{status}: {text}")));
        }

        let byte_stream = response.bytes_stream();

        // Anthropic's streaming `message_delta` event carries output tokens
        // but never input tokens mid-stream (SPEC_FULL.md §12, Open
        // Question 2) — we report what the vendor gives us and zero-fill
        // the rest rather than inventing a number.
        let stream = async_stream::stream! {
            futures_util::pin_mut!(byte_stream);
            let mut current_tool: Option<(String, String, String)> = None;

            while let Some(chunk) = byte_stream.next().await {
                let bytes = match chunk {
                    Ok(b) => b,
                    Err(err) => {
                        yield Err(ProviderError::Unavailable(err.to_string()));
                        continue;
                    }
                };
                let text = String::from_utf8_lossy(&bytes).into_owned();
                for line in text.lines() {
                    let Some(data) = line.strip_prefix("data: ") else { continue };
                    let Ok(parsed) = serde_json::from_str::<Value>(data) else { continue };
                    match parsed["type"].as_str() {
                        Some("content_block_start") => {
                            if parsed["content_block"]["type"] == "tool_use" {
                                current_tool = Some((
                                    parsed["content_block"]["id"].as_str().unwrap_or_default().to_string(),
                                    parsed["content_block"]["name"].as_str().unwrap_or_default().to_string(),
                                    String::new(),
                                ));
                            }
                        }
                        Some("content_block_delta") => {
                            if let Some(text_delta) = parsed["delta"]["text"].as_str() {
                                yield Ok(StreamChunk::TextDelta(text_delta.to_string()));
                            }
                            if let Some(partial) = parsed["delta"]["partial_json"].as_str() {
                                if let Some((_, _, buffer)) = current_tool.as_mut() {
                                    buffer.push_str(partial);
                                }
                            }
                        }
                        Some("content_block_stop") => {
                            if let Some((id, name, args)) = current_tool.take() {
                                let arguments = serde_json::from_str(&args).unwrap_or(Value::Null);
                                yield Ok(StreamChunk::ToolCall(ToolCallRequest { id, name, arguments }));
                            }
                        }
                        Some("message_delta") => {
                            if let Some(output_tokens) = parsed["usage"]["output_tokens"].as_u64() {
                                yield Ok(StreamChunk::Usage(TokenUsage {
                                    prompt_tokens: 0,
                                    completion_tokens: output_tokens as u32,
                                }));
                            }
                        }
                        _ => {}
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
