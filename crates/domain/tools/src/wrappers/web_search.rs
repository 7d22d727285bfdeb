//! General web search over a Brave-Search-shaped HTTP API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gateway_traits::{Credentials, Service, ServiceFactory, ServiceKind, ToolDescriptor, ToolError};
use reqwest::Client;
use serde_json::{json, Value};

use super::shared::{map_status, render_error, require_credential, require_str, retry_after_secs, retry_on_transient_failure};

pub const CLASS_ID: &str = "web_search";
const TIMEOUT: Duration = Duration::from_secs(15);
const ENDPOINT: &str = "https://api.search.brave.com/res/v1/web/search";
const MAX_RESULTS: usize = 5;

#[derive(Debug)]
pub struct WebSearchService {
    client: Client,
    credentials: Credentials,
    endpoint: String,
}

impl WebSearchService {
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self { client: super::shared::build_client(TIMEOUT), credentials, endpoint: ENDPOINT.to_string() }
    }

    #[cfg(test)]
    fn with_endpoint(credentials: Credentials, endpoint: String) -> Self {
        Self { client: super::shared::build_client(TIMEOUT), credentials, endpoint }
    }
}

fn descriptors() -> Vec<ToolDescriptor> {
    vec![ToolDescriptor {
        name: "web_search".to_string(),
        description: "Searches the web and returns the top result titles, URLs, and snippets.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {"query": {"type": "string"}},
            "required": ["query"]
        }),
        category: "api_wrapper".to_string(),
        tags: vec!["search".to_string()],
    }]
}

#[async_trait]
impl Service for WebSearchService {
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
        if tool_name != "web_search" {
            return Err(ToolError::NotFound(tool_name.to_string()));
        }
        let result = self.search(&arguments).await;
        Ok(result.unwrap_or_else(|err| render_error(&err)))
    }
}

impl WebSearchService {
    async fn search(&self, arguments: &Value) -> Result<String, ToolError> {
        let query = require_str(arguments, "query")?;
        let api_key = require_credential(&self.credentials, "api_key")?;

        let response = retry_on_transient_failure(|| {
            self.client
                .get(&self.endpoint)
                .header("X-Subscription-Token", api_key)
                .query(&[("q", query)])
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
        let results = body["web"]["results"].as_array().cloned().unwrap_or_default();
        if results.is_empty() {
            return Ok(format!("no results for '{query}'"));
        }

        let formatted: Vec<String> = results
            .iter()
            .take(MAX_RESULTS)
            .map(|result| {
                let title = result["title"].as_str().unwrap_or("untitled");
                let url = result["url"].as_str().unwrap_or("");
                let snippet = result["description"].as_str().unwrap_or("");
                format!("{title} ({url}): {snippet}")
            })
            .collect();

        Ok(formatted.join("\n"))
    }
}

fn construct(_config: Value, credentials: Credentials) -> Arc<dyn Service> {
    Arc::new(WebSearchService::new(credentials))
}

inventory::submit! {
    ServiceFactory {
        class_id: CLASS_ID,
        display_name: "Web Search",
        kind: ServiceKind::ApiWrapper,
        credential_schema: || json!({
            "type": "object",
            "properties": {"api_key": {"type": "string"}},
            "required": ["api_key"]
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
        let service = WebSearchService::new(Credentials::default());
        let out = service.invoke("web_search", json!({"query": "rust async"})).await.unwrap();
        assert!(out.starts_with("Error:"));
    }

    #[tokio::test]
    async fn empty_results_are_reported_plainly() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"web": {"results": []}})))
            .mount(&server)
            .await;

        let credentials = Credentials::new(std::collections::BTreeMap::from([("api_key".to_string(), "k".to_string())]));
        let service = WebSearchService::with_endpoint(credentials, server.uri());
        let out = service.search(&json!({"query": "nothing matches this"})).await.unwrap();
        assert!(out.contains("no results"));
    }

    #[tokio::test]
    async fn results_are_formatted_title_url_snippet() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "web": {"results": [{"title": "Rust", "url": "https://rust-lang.org", "description": "A language"}]}
            })))
            .mount(&server)
            .await;

        let credentials = Credentials::new(std::collections::BTreeMap::from([("api_key".to_string(), "k".to_string())]));
        let service = WebSearchService::with_endpoint(credentials, server.uri());
        let out = service.search(&json!({"query": "rust"})).await.unwrap();
        assert!(out.contains("Rust"));
        assert!(out.contains("rust-lang.org"));
    }
}
