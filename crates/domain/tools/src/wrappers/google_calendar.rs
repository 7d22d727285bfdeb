//! Google Calendar event listing and creation over an OAuth access token.
//!
//! Credentials carry a caller-obtained OAuth access token, not the
//! client id/secret pair (that exchange is a collaborator concern,
//! spec §6 "Optional: OAuth client credentials for Google services").

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gateway_traits::{Credentials, Service, ServiceFactory, ServiceKind, ToolDescriptor, ToolError};
use reqwest::Client;
use serde_json::{json, Value};

use super::shared::{map_status, render_error, require_credential, require_str, retry_after_secs, retry_on_transient_failure};

pub const CLASS_ID: &str = "google_calendar";
const TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

#[derive(Debug)]
pub struct GoogleCalendarService {
    client: Client,
    credentials: Credentials,
    base_url: String,
}

impl GoogleCalendarService {
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
    vec![
        ToolDescriptor {
            name: "list_events".to_string(),
            description: "Lists upcoming events on the primary Google Calendar.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"max_results": {"type": "integer"}},
                "required": []
            }),
            category: "api_wrapper".to_string(),
            tags: vec!["calendar".to_string()],
        },
        ToolDescriptor {
            name: "create_event".to_string(),
            description: "Creates an event on the primary Google Calendar.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "summary": {"type": "string"},
                    "start": {"type": "string", "description": "RFC 3339 start datetime"},
                    "end": {"type": "string", "description": "RFC 3339 end datetime"}
                },
                "required": ["summary", "start", "end"]
            }),
            category: "api_wrapper".to_string(),
            tags: vec!["calendar".to_string()],
        },
    ]
}

#[async_trait]
impl Service for GoogleCalendarService {
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
        let result = match tool_name {
            "list_events" => self.list_events(&arguments).await,
            "create_event" => self.create_event(&arguments).await,
            other => return Err(ToolError::NotFound(other.to_string())),
        };
        Ok(result.unwrap_or_else(|err| render_error(&err)))
    }
}

impl GoogleCalendarService {
    fn access_token(&self) -> Result<&str, ToolError> {
        require_credential(&self.credentials, "access_token")
    }

    async fn list_events(&self, arguments: &Value) -> Result<String, ToolError> {
        let max_results = arguments.get("max_results").and_then(Value::as_u64).unwrap_or(10);
        let token = self.access_token()?;

        let url = format!("{}/calendars/primary/events", self.base_url);
        let response = retry_on_transient_failure(|| {
            self.client
                .get(&url)
                .bearer_auth(token)
                .query(&[("maxResults", max_results.to_string()), ("orderBy".to_string(), "startTime".to_string()), ("singleEvents".to_string(), "true".to_string())])
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
        let items = body["items"].as_array().cloned().unwrap_or_default();
        if items.is_empty() {
            return Ok("no upcoming events".to_string());
        }
        let formatted: Vec<String> = items
            .iter()
            .map(|event| {
                let summary = event["summary"].as_str().unwrap_or("(no title)");
                let start = event["start"]["dateTime"].as_str().or(event["start"]["date"].as_str()).unwrap_or("unknown");
                format!("{summary} at {start}")
            })
            .collect();
        Ok(formatted.join("\n"))
    }

    async fn create_event(&self, arguments: &Value) -> Result<String, ToolError> {
        let summary = require_str(arguments, "summary")?;
        let start = require_str(arguments, "start")?;
        let end = require_str(arguments, "end")?;
        let token = self.access_token()?;

        let url = format!("{}/calendars/primary/events", self.base_url);
        let response = retry_on_transient_failure(|| {
            self.client
                .post(&url)
                .bearer_auth(token)
                .json(&json!({
                    "summary": summary,
                    "start": {"dateTime": start},
                    "end": {"dateTime": end}
                }))
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
        let id = body["id"].as_str().unwrap_or("unknown");
        Ok(format!("created event '{summary}' from {start} to {end} (id: {id})"))
    }
}

fn construct(_config: Value, credentials: Credentials) -> Arc<dyn Service> {
    Arc::new(GoogleCalendarService::new(credentials))
}

inventory::submit! {
    ServiceFactory {
        class_id: CLASS_ID,
        display_name: "Google Calendar",
        kind: ServiceKind::ApiWrapper,
        credential_schema: || json!({
            "type": "object",
            "properties": {"access_token": {"type": "string"}},
            "required": ["access_token"]
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
        let service = GoogleCalendarService::new(Credentials::default());
        let out = service.invoke("list_events", json!({})).await.unwrap();
        assert!(out.starts_with("Error:"));
    }

    #[tokio::test]
    async fn no_events_is_reported_plainly() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .mount(&server)
            .await;

        let credentials = Credentials::new(std::collections::BTreeMap::from([("access_token".to_string(), "t".to_string())]));
        let service = GoogleCalendarService::with_base_url(credentials, server.uri());
        let out = service.list_events(&json!({})).await.unwrap();
        assert_eq!(out, "no upcoming events");
    }

    #[tokio::test]
    async fn create_event_reports_new_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "evt-1"})))
            .mount(&server)
            .await;

        let credentials = Credentials::new(std::collections::BTreeMap::from([("access_token".to_string(), "t".to_string())]));
        let service = GoogleCalendarService::with_base_url(credentials, server.uri());
        let out = service
            .create_event(&json!({"summary": "Sync", "start": "2024-01-01T10:00:00Z", "end": "2024-01-01T11:00:00Z"}))
            .await
            .unwrap();
        assert!(out.contains("evt-1"));
    }
}
