//! Notion page search and creation, bound over a user-supplied integration token.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gateway_traits::{Credentials, Service, ServiceFactory, ServiceKind, ToolDescriptor, ToolError};
use reqwest::Client;
use serde_json::{json, Value};

use super::shared::{map_status, render_error, require_credential, require_str, retry_after_secs, retry_on_transient_failure};

pub const CLASS_ID: &str = "notion";
const TIMEOUT: Duration = Duration::from_secs(20);
const NOTION_VERSION: &str = "2022-06-28";
const DEFAULT_BASE_URL: &str = "https://api.notion.com/v1";

#[derive(Debug)]
pub struct NotionService {
    client: Client,
    credentials: Credentials,
    base_url: String,
}

impl NotionService {
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
            name: "search_pages".to_string(),
            description: "Searches Notion pages and databases visible to the integration by title.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"query": {"type": "string"}},
                "required": ["query"]
            }),
            category: "api_wrapper".to_string(),
            tags: vec!["productivity".to_string()],
        },
        ToolDescriptor {
            name: "create_page".to_string(),
            description: "Creates a new Notion page under the given parent page id with a title.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "parent_page_id": {"type": "string"},
                    "title": {"type": "string"}
                },
                "required": ["parent_page_id", "title"]
            }),
            category: "api_wrapper".to_string(),
            tags: vec!["productivity".to_string()],
        },
    ]
}

#[async_trait]
impl Service for NotionService {
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
            "search_pages" => self.search_pages(&arguments).await,
            "create_page" => self.create_page(&arguments).await,
            other => return Err(ToolError::NotFound(other.to_string())),
        };
        Ok(result.unwrap_or_else(|err| render_error(&err)))
    }
}

impl NotionService {
    async fn post(&self, path: &str, body: Value) -> Result<Value, ToolError> {
        let token = require_credential(&self.credentials, "integration_token")?;
        let url = format!("{}{path}", self.base_url);

        let response = retry_on_transient_failure(|| {
            self.client
                .post(&url)
                .bearer_auth(token)
                .header("Notion-Version", NOTION_VERSION)
                .json(&body)
                .send()
        })
        .await?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = retry_after_secs(&response);
            let text = response.text().await.unwrap_or_default();
            return Err(map_status(status, retry_after, &text));
        }

        response.json().await.map_err(|err| ToolError::Upstream(err.to_string()))
    }

    async fn search_pages(&self, arguments: &Value) -> Result<String, ToolError> {
        let query = require_str(arguments, "query")?;
        let body = self.post("/search", json!({"query": query})).await?;
        let results = body["results"].as_array().cloned().unwrap_or_default();
        if results.is_empty() {
            return Ok(format!("no Notion pages found for '{query}'"));
        }
        let titles: Vec<String> = results
            .iter()
            .filter_map(|page| page["properties"]["title"]["title"][0]["plain_text"].as_str())
            .map(ToString::to_string)
            .collect();
        Ok(titles.join(", "))
    }

    async fn create_page(&self, arguments: &Value) -> Result<String, ToolError> {
        let parent_page_id = require_str(arguments, "parent_page_id")?;
        let title = require_str(arguments, "title")?;
        let body = self
            .post(
                "/pages",
                json!({
                    "parent": {"page_id": parent_page_id},
                    "properties": {"title": {"title": [{"text": {"content": title}}]}}
                }),
            )
            .await?;
        let id = body["id"].as_str().unwrap_or("unknown");
        Ok(format!("created page '{title}' (id: {id})"))
    }
}

fn construct(_config: Value, credentials: Credentials) -> Arc<dyn Service> {
    Arc::new(NotionService::new(credentials))
}

inventory::submit! {
    ServiceFactory {
        class_id: CLASS_ID,
        display_name: "Notion",
        kind: ServiceKind::ApiWrapper,
        credential_schema: || json!({
            "type": "object",
            "properties": {"integration_token": {"type": "string"}},
            "required": ["integration_token"]
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
        let service = NotionService::new(Credentials::default());
        let out = service.invoke("search_pages", json!({"query": "roadmap"})).await.unwrap();
        assert!(out.starts_with("Error:"));
    }

    #[tokio::test]
    async fn create_page_reports_new_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "page-123"})))
            .mount(&server)
            .await;

        let credentials = Credentials::new(std::collections::BTreeMap::from([(
            "integration_token".to_string(),
            "secret_abc".to_string(),
        )]));
        let service = NotionService::with_base_url(credentials, server.uri());
        let out = service
            .create_page(&json!({"parent_page_id": "parent-1", "title": "Weekly Notes"}))
            .await
            .unwrap();
        assert!(out.contains("page-123"));
        assert!(out.contains("Weekly Notes"));
    }
}
