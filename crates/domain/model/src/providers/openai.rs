//! The OpenAI chat-completions provider.
//!
//! Request/response shapes and the manual `data: ` SSE line parsing are
//! generalized from the teacher's
//! `domain/ai/src/services/providers/openai/{provider,streaming}.rs`.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use gateway_traits::ToolDescriptor;
use serde_json::{json, Value};

use crate::message::{ChatMessage, Role, StreamChunk, TextCompletion, ToolAwareCompletion, ToolCallRequest, TokenUsage};
use crate::provider::{AiProvider, GenerationRequest, ModelPricing, ProviderError};
use crate::schema::to_openai_tool;

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

#[derive(Debug)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl OpenAiProvider {
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self::with_endpoint(api_key, DEFAULT_ENDPOINT.to_string())
    }

    #[must_use]
    pub fn with_endpoint(api_key: String, endpoint: String) -> Self {
        Self {
            client: super::build_http_client().unwrap_or_default(),
            api_key,
            endpoint,
        }
    }

    fn role_str(role: Role) -> &'static str {
        match role {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    fn to_openai_messages(messages: &[ChatMessage]) -> Vec<Value> {
        messages
            .iter()
            .map(|m| json!({ "role": Self::role_str(m.role), "content": m.content }))
            .collect()
    }

    fn base_body(&self, request: &GenerationRequest<'_>) -> Value {
        json!({
            "model": request.model,
            "messages": Self::to_openai_messages(request.messages),
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        })
    }

    async fn post(&self, body: Value) -> Result<Value, ProviderError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
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
            prompt_tokens: usage["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            completion_tokens: usage["completion_tokens"].as_u64().unwrap_or(0) as u32,
        })
    }

    fn parse_tool_calls(message: &Value) -> Vec<ToolCallRequest> {
        message["tool_calls"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|call| {
                let id = call["id"].as_str()?.to_string();
                let name = call["function"]["name"].as_str()?.to_string();
                let raw_args = call["function"]["arguments"].as_str().unwrap_or("{}");
                let arguments = serde_json::from_str(raw_args).unwrap_or(Value::Null);
                Some(ToolCallRequest { id, name, arguments })
            })
            .collect()
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn supports_model(&self, model: &str) -> bool {
        model.starts_with("gpt-") || model.starts_with("o1") || model.starts_with("o3")
    }

    fn default_model(&self) -> &str {
        "gpt-4o-mini"
    }

    fn get_pricing(&self, model: &str) -> ModelPricing {
        if model.contains("mini") {
            ModelPricing { input_cost_per_1k: 0.00015, output_cost_per_1k: 0.0006 }
        } else {
            ModelPricing { input_cost_per_1k: 0.0025, output_cost_per_1k: 0.01 }
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
        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        Ok(TextCompletion { content, usage: Self::parse_usage(&response) })
    }

    async fn generate_with_tools(
        &self,
        request: GenerationRequest<'_>,
        tools: &[ToolDescriptor],
    ) -> Result<ToolAwareCompletion, ProviderError> {
        let mut body = self.base_body(&request);
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools.iter().map(to_openai_tool).collect());
        }
        let response = self.post(body).await?;
        let message = &response["choices"][0]["message"];
        let content = message["content"].as_str().map(str::to_string);
        let tool_calls = Self::parse_tool_calls(message);
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
            body["tools"] = Value::Array(tools.iter().map(to_openai_tool).collect());
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
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

        let stream = async_stream::stream! {
            futures_util::pin_mut!(byte_stream);
            // Accumulates partial tool-call argument fragments keyed by
            // the vendor's per-call `index`, since a single call's JSON
            // arguments can arrive split across several SSE chunks.
            let mut pending_tool_calls: std::collections::BTreeMap<u64, (String, String, String)> =
                std::collections::BTreeMap::new();

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
                    if data == "[DONE]" {
                        for (_, (id, name, args)) in std::mem::take(&mut pending_tool_calls) {
                            let arguments = serde_json::from_str(&args).unwrap_or(Value::Null);
                            yield Ok(StreamChunk::ToolCall(ToolCallRequest { id, name, arguments }));
                        }
                        continue;
                    }
                    let Ok(parsed) = serde_json::from_str::<Value>(data) else { continue };
                    if let Some(usage) = Self::parse_usage(&parsed) {
                        yield Ok(StreamChunk::Usage(usage));
                    }
                    let delta = &parsed["choices"][0]["delta"];
                    if let Some(content) = delta["content"].as_str() {
                        if !content.is_empty() {
                            yield Ok(StreamChunk::TextDelta(content.to_string()));
                        }
                    }
                    if let Some(calls) = delta["tool_calls"].as_array() {
                        for call in calls {
                            let index = call["index"].as_u64().unwrap_or(0);
                            let entry = pending_tool_calls.entry(index).or_default();
                            if let Some(id) = call["id"].as_str() {
                                entry.0 = id.to_string();
                            }
                            if let Some(name) = call["function"]["name"].as_str() {
                                entry.1 = name.to_string();
                            }
                            if let Some(args_fragment) = call["function"]["arguments"].as_str() {
                                entry.2.push_str(args_fragment);
                            }
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
