//! Remote-catalog tool family (spec §4.4): a proxy over a caller-supplied
//! tool server, discovered at request time rather than at process startup.
//!
//! Every other service in this crate knows its tools at construction —
//! [`Service::tools`] is a synchronous, already-known list. A remote
//! catalog does not: its tools live behind a network call to a URL that
//! only shows up in a request's `ServiceBinding`. [`Service::tools`]
//! therefore returns an empty list here (there is nothing to report
//! without a round trip); the engine discovers this server's real tools
//! by calling [`RemoteCatalogService::fetch_catalog`] once per request and
//! folds the result into the `ToolCatalog` itself. `invoke` still proxies
//! any tool name the engine hands back, because `/call_tool` does not
//! require the caller to have fetched `/catalog` first.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gateway_traits::{Credentials, Service, ServiceFactory, ServiceKind, ToolDescriptor, ToolError};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::wrappers::shared::{map_status, retry_after_secs};

pub const CLASS_ID: &str = "remote_catalog";
const CATALOG_TIMEOUT: Duration = Duration::from_secs(10);
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    tools: Vec<RemoteToolDescriptor>,
}

#[derive(Debug, Deserialize)]
struct RemoteToolDescriptor {
    name: String,
    description: String,
    #[serde(default = "default_schema")]
    input_schema: Value,
    #[serde(default = "default_category")]
    category: String,
    #[serde(default)]
    tags: Vec<String>,
}

fn default_schema() -> Value {
    json!({"type": "object", "properties": {}, "required": []})
}

fn default_category() -> String {
    "remote_catalog".to_string()
}

impl From<RemoteToolDescriptor> for ToolDescriptor {
    fn from(remote: RemoteToolDescriptor) -> Self {
        Self {
            name: remote.name,
            description: remote.description,
            input_schema: remote.input_schema,
            category: remote.category,
            tags: remote.tags,
        }
    }
}

/// One proxied remote tool server, bound to a single base URL for the
/// lifetime of the owning request.
#[derive(Debug)]
pub struct RemoteCatalogService {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

impl RemoteCatalogService {
    /// `config` carries the caller-supplied server URL under `base_url`;
    /// `credentials` carries an optional bearer token under `token`.
    #[must_use]
    pub fn new(base_url: String, credentials: Credentials) -> Self {
        let client = Client::builder().connect_timeout(Duration::from_secs(10)).build().unwrap_or_default();
        Self { client, base_url, credentials }
    }

    /// `GET <base>/catalog`, 10 s timeout. A failure here is the caller's
    /// to absorb (spec §4.4: "a failed catalog fetch ... does not fail
    /// the request; the engine proceeds with the remaining servers'
    /// tools, after logging") — this method still returns `Err` so the
    /// engine has something concrete to log before moving on.
    pub async fn fetch_catalog(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        let url = format!("{}/catalog", self.base_url.trim_end_matches('/'));
        let mut request = self.client.get(&url).timeout(CATALOG_TIMEOUT);
        if let Some(token) = self.credentials.get("token") {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                ToolError::Timeout(CATALOG_TIMEOUT)
            } else {
                ToolError::Upstream(err.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = retry_after_secs(&response);
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, retry_after, &body));
        }

        let catalog: CatalogResponse = response.json().await.map_err(|err| ToolError::Upstream(err.to_string()))?;
        Ok(catalog.tools.into_iter().map(ToolDescriptor::from).collect())
    }

    async fn call_tool(&self, tool_name: &str, arguments: Value) -> Result<String, ToolError> {
        let url = format!("{}/call_tool", self.base_url.trim_end_matches('/'));
        let mut request = self.client.post(&url).timeout(CALL_TIMEOUT).json(&json!({"tool": tool_name, "arguments": arguments}));
        if let Some(token) = self.credentials.get("token") {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                ToolError::Timeout(CALL_TIMEOUT)
            } else {
                ToolError::Upstream(err.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = retry_after_secs(&response);
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, retry_after, &body));
        }

        let body: Value = response.json().await.map_err(|err| ToolError::Upstream(err.to_string()))?;
        match body.get("result") {
            Some(Value::String(text)) => Ok(text.clone()),
            Some(other) => Ok(other.to_string()),
            None => Ok(body.to_string()),
        }
    }
}

#[async_trait]
impl Service for RemoteCatalogService {
    fn class_id(&self) -> &str {
        CLASS_ID
    }

    fn kind(&self) -> ServiceKind {
        ServiceKind::RemoteCatalog
    }

    fn tools(&self) -> Vec<ToolDescriptor> {
        Vec::new()
    }

    async fn invoke(&self, tool_name: &str, arguments: Value) -> Result<String, ToolError> {
        self.call_tool(tool_name, arguments).await
    }
}

fn descriptors() -> Vec<ToolDescriptor> {
    Vec::new()
}

fn construct(config: Value, credentials: Credentials) -> Arc<dyn Service> {
    let base_url = config.get("base_url").and_then(Value::as_str).unwrap_or_default().to_string();
    Arc::new(RemoteCatalogService::new(base_url, credentials))
}

inventory::submit! {
    ServiceFactory {
        class_id: CLASS_ID,
        display_name: "Remote Tool Catalog",
        kind: ServiceKind::RemoteCatalog,
        credential_schema: || json!({
            "type": "object",
            "properties": {
                "base_url": {"type": "string"},
                "token": {"type": "string"}
            },
            "required": ["base_url"]
        }),
        tools: descriptors,
        construct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetch_catalog_materializes_descriptors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/catalog"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "server": {"name": "demo", "version": "1.0", "description": "demo server"},
                "tools": [{"name": "ping", "description": "pings the server"}]
            })))
            .mount(&server)
            .await;

        let service = RemoteCatalogService::new(server.uri(), Credentials::default());
        let tools = service.fetch_catalog().await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "ping");
    }

    #[tokio::test]
    async fn failed_catalog_fetch_is_a_typed_error_not_a_panic() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/catalog"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let service = RemoteCatalogService::new(server.uri(), Credentials::default());
        let err = service.fetch_catalog().await.unwrap_err();
        assert!(matches!(err, ToolError::Upstream(_)));
    }

    #[tokio::test]
    async fn call_tool_proxies_to_call_tool_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/call_tool"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "pong"})))
            .mount(&server)
            .await;

        let service = RemoteCatalogService::new(server.uri(), Credentials::default());
        let out = service.invoke("ping", json!({})).await.unwrap();
        assert_eq!(out, "pong");
    }
}
