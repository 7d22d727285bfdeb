//! The Google Gemini `generateContent` provider.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use gateway_traits::ToolDescriptor;
use serde_json::{json, Value};

use crate::message::{ChatMessage, Role, StreamChunk, TextCompletion, ToolAwareCompletion, ToolCallRequest, TokenUsage};
use crate::provider::{AiProvider, GenerationRequest, ModelPricing, ProviderError};
use crate::schema::to_gemini_function_declaration;

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug)]
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GeminiProvider {
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            client: super::build_http_client().unwrap_or_default(),
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    fn to_contents(messages: &[ChatMessage]) -> (Option<String>, Vec<Value>) {
        let mut system = None;
        let mut contents = Vec::new();
        for message in messages {
            match message.role {
                Role::System => system = Some(message.content.clone()),
                Role::User => contents.push(json!({ "role": "user", "parts": [{ "text": message.content }] })),
                Role::Assistant => contents.push(json!({ "role": "model", "parts": [{ "text": message.content }] })),
            }
        }
        (system, contents)
    }

    fn base_body(&self, request: &GenerationRequest<'_>) -> Value {
        let (system, contents) = Self::to_contents(request.messages);
        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "temperature": request.temperature,
                "maxOutputTokens": request.max_tokens,
            }
        });
        if let Some(system) = system {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }
        body
    }

    fn url(&self, model: &str, stream: bool) -> String {
        let method = if stream { "streamGenerateContent" } else { "generateContent" };
        format!("{}/models/{model}:{method}?key={}", self.endpoint, self.api_key)
    }

    async fn post(&self, model: &str, body: Value) -> Result<Value, ProviderError> {
        let response = self
            .client
            .post(self.url(model, false))
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
        let usage = body.get("usageMetadata")?;
        Some(TokenUsage {
            prompt_tokens: usage["promptTokenCount"].as_u64().unwrap_or(0) as u32,
            completion_tokens: usage["candidatesTokenCount"].as_u64().unwrap_or(0) as u32,
        })
    }

    fn parse_candidate(body: &Value) -> (Option<String>, Vec<ToolCallRequest>) {
        let mut text_parts = Vec::new();
        let mut tool_calls = Vec::new();
        for part in body["candidates"][0]["content"]["parts"].as_array().into_iter().flatten() {
            if let Some(text) = part["text"].as_str() {
                text_parts.push(text.to_string());
            }
            if let Some(call) = part.get("functionCall") {
                if let Some(name) = call["name"].as_str() {
                    tool_calls.push(ToolCallRequest {
                        id: format!("gemini-{}", tool_calls.len()),
                        name: name.to_string(),
                        arguments: call["args"].clone(),
                    });
                }
            }
        }
        let content = (!text_parts.is_empty()).then(|| text_parts.join(""));
        (content, tool_calls)
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn supports_model(&self, model: &str) -> bool {
        model.starts_with("gemini-")
    }

    fn default_model(&self) -> &str {
        "gemini-2.0-flash"
    }

    fn get_pricing(&self, _model: &str) -> ModelPricing {
        ModelPricing { input_cost_per_1k: 0.000_075, output_cost_per_1k: 0.0003 }
    }

    fn supports_native_tool_calling(&self) -> bool {
        true
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    async fn generate(&self, request: GenerationRequest<'_>) -> Result<TextCompletion, ProviderError> {
        let body = self.base_body(&request);
        let response = self.post(request.model, body).await?;
        let (content, _) = Self::parse_candidate(&response);
        Ok(TextCompletion { content: content.unwrap_or_default(), usage: Self::parse_usage(&response) })
    }

    async fn generate_with_tools(
        &self,
        request: GenerationRequest<'_>,
        tools: &[ToolDescriptor],
    ) -> Result<ToolAwareCompletion, ProviderError> {
        let mut body = self.base_body(&request);
        if !tools.is_empty() {
            let declarations: Vec<Value> = tools.iter().map(to_gemini_function_declaration).collect();
            body["tools"] = json!([{ "functionDeclarations": declarations }]);
        }
        let response = self.post(request.model, body).await?;
        let (content, tool_calls) = Self::parse_candidate(&response);
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
        if !tools.is_empty() {
            let declarations: Vec<Value> = tools.iter().map(to_gemini_function_declaration).collect();
            body["tools"] = json!([{ "functionDeclarations": declarations }]);
        }

        let response = self
            .client
            .post(self.url(request.model, true))
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

        // Gemini's REST streaming response is a JSON array of candidate
        // objects, not line-delimited SSE; some streaming modes omit
        // `usageMetadata` entirely (SPEC_FULL.md §12, Open Question 2), in
        // which case usage is left at zero for this provider's turn.
        let stream = async_stream::stream! {
            futures_util::pin_mut!(byte_stream);
            let mut buffer = String::new();

            while let Some(chunk) = byte_stream.next().await {
                let bytes = match chunk {
                    Ok(b) => b,
                    Err(err) => {
                        yield Err(ProviderError::Unavailable(err.to_string()));
                        continue;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&bytes));

                while let Some(object_end) = find_balanced_object_end(&buffer) {
                    let object_text: String = buffer.drain(..=object_end).collect();
                    let trimmed = object_text.trim_start_matches(['[', ',']).trim();
                    let Ok(parsed) = serde_json::from_str::<Value>(trimmed) else { continue };
                    if let Some(usage) = GeminiProvider::parse_usage(&parsed) {
                        yield Ok(StreamChunk::Usage(usage));
                    }
                    let (content, tool_calls) = GeminiProvider::parse_candidate(&parsed);
                    if let Some(content) = content {
                        yield Ok(StreamChunk::TextDelta(content));
                    }
                    for call in tool_calls {
                        yield Ok(StreamChunk::ToolCall(call));
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Finds the end index of the first balanced top-level `{...}` object in
/// `buffer`, skipping over braces inside string literals.
fn find_balanced_object_end(buffer: &str) -> Option<usize> {
    let bytes = buffer.as_bytes();
    let start = bytes.iter().position(|&b| b == b'{')?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, &byte) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}
