//! Slack channel messaging over a bot token.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gateway_traits::{Credentials, Service, ServiceFactory, ServiceKind, ToolDescriptor, ToolError};
use reqwest::Client;
use serde_json::{json, Value};

use super::shared::{map_status, render_error, require_credential, require_str, retry_after_secs, retry_on_transient_failure};

pub const CLASS_ID: &str = "slack";
const TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_BASE_URL: &str = "https://slack.com/api";

#[derive(Debug)]
pub struct SlackService {
    client: Client,
    credentials: Credentials,
    base_url: String,
}

impl SlackService {
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self { client: super::shared::build_client(TIMEOUT), credentials, base_url: DEFAULT_BASE_URL.to_string() }
    }

    #[cfg(test)]
    fn with_base_url(credentials: Credentials, base_url: String) -> Self {
        Self { client: super::shared::build_client(TIMEOUT), credentials, base_url }
    }
}

fn descriptors() -> Vec<ToolDescriptor> {
    vec![ToolDescriptor {
        name: "send_message".to_string(),
        description: "Posts a message to a Slack channel.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "channel": {"type": "string", "description": "Channel id or name, e.g. #general"},
                "text": {"type": "string"}
            },
            "required": ["channel", "text"]
        }),
        category: "api_wrapper".to_string(),
        tags: vec!["messaging".to_string()],
    }]
}

#[async_trait]
impl Service for SlackService {
    fn class_id(&self) -> &str {
        CLASS_ID
    }

    fn kind(&self) -> ServiceKind {
        ServiceKind::ApiWrapper
    }

    fn tools(&self) -> Vec<ToolDescriptor> {
        descriptors()
    }

    async fn invoke(&self, tool_name: &str, arguments: Value) -> Result<String, ToolError> {
        if tool_name != "send_message" {
            return Err(ToolError::NotFound(tool_name.to_string()));
        }
        let result = self.send_message(&arguments).await;
        Ok(result.unwrap_or_else(|err| render_error(&err)))
    }
}

impl SlackService {
    async fn send_message(&self, arguments: &Value) -> Result<String, ToolError> {
        let channel = require_str(arguments, "channel")?;
        let text = require_str(arguments, "text")?;
        let bot_token = require_credential(&self.credentials, "bot_token")?;

        let url = format!("{}/chat.postMessage", self.base_url);
        let response = retry_on_transient_failure(|| {
            self.client
                .post(&url)
                .bearer_auth(bot_token)
                .json(&json!({"channel": channel, "text": text}))
                .send()
        })
        .await?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = retry_after_secs(&response);
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, retry_after, &body));
        }

        let body: Value = response.json().await.map_err(|err| ToolError::Upstream(err.to_string()))?;
        if body["ok"].as_bool() != Some(true) {
            let error = body["error"].as_str().unwrap_or("unknown Slack API error");
            return Err(ToolError::Upstream(error.to_string()));
        }
        let ts = body["ts"].as_str().unwrap_or("unknown");
        Ok(format!("message sent to {channel} (ts: {ts})"))
    }
}

fn construct(_config: Value, credentials: Credentials) -> Arc<dyn Service> {
    Arc::new(SlackService::new(credentials))
}

inventory::submit! {
    ServiceFactory {
        class_id: CLASS_ID,
        display_name: "Slack",
        kind: ServiceKind::ApiWrapper,
        credential_schema: || json!({
            "type": "object",
            "properties": {"bot_token": {"type": "string"}},
            "required": ["bot_token"]
        }),
        tools: descriptors,
        construct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn missing_credential_is_a_readable_failure() {
        let service = SlackService::new(Credentials::default());
        let out = service.invoke("send_message", json!({"channel": "#general", "text": "hi"})).await.unwrap();
        assert!(out.starts_with("Error:"));
    }

    #[tokio::test]
    async fn slack_level_error_surfaces_as_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": false, "error": "channel_not_found"})))
            .mount(&server)
            .await;

        let credentials = Credentials::new(std::collections::BTreeMap::from([("bot_token".to_string(), "xoxb-1".to_string())]));
        let service = SlackService::with_base_url(credentials, server.uri());
        let err = service.send_message(&json!({"channel": "#nope", "text": "hi"})).await.unwrap_err();
        assert!(matches!(err, ToolError::Upstream(message) if message.contains("channel_not_found")));
    }

    #[tokio::test]
    async fn success_reports_timestamp() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "ts": "1234.5678"})))
            .mount(&server)
            .await;

        let credentials = Credentials::new(std::collections::BTreeMap::from([("bot_token".to_string(), "xoxb-1".to_string())]));
        let service = SlackService::with_base_url(credentials, server.uri());
        let out = service.send_message(&json!({"channel": "#general", "text": "hi"})).await.unwrap();
        assert!(out.contains("1234.5678"));
    }
}
