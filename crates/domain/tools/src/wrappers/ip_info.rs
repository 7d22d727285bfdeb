//! IP geolocation lookups over ipinfo.io.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gateway_traits::{Credentials, Service, ServiceFactory, ServiceKind, ToolDescriptor, ToolError};
use reqwest::Client;
use serde_json::{json, Value};

use super::shared::{map_status, render_error, require_credential, require_str, retry_after_secs, retry_on_transient_failure};

pub const CLASS_ID: &str = "ip_info";
const TIMEOUT: Duration = Duration::from_secs(10);
const ENDPOINT: &str = "https://ipinfo.io";

#[derive(Debug)]
pub struct IpInfoService {
    client: Client,
    credentials: Credentials,
    endpoint: String,
}

impl IpInfoService {
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
        name: "lookup_ip".to_string(),
        description: "Returns geolocation and network info for an IPv4 or IPv6 address.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {"ip": {"type": "string", "description": "IPv4 or IPv6 address"}},
            "required": ["ip"]
        }),
        category: "api_wrapper".to_string(),
        tags: vec!["network".to_string()],
    }]
}

#[async_trait]
impl Service for IpInfoService {
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
        if tool_name != "lookup_ip" {
            return Err(ToolError::NotFound(tool_name.to_string()));
        }
        let result = self.fetch_ip_info(&arguments).await;
        Ok(result.unwrap_or_else(|err| render_error(&err)))
    }
}

impl IpInfoService {
    async fn fetch_ip_info(&self, arguments: &Value) -> Result<String, ToolError> {
        let ip = require_str(arguments, "ip")?;
        let token = require_credential(&self.credentials, "api_key")?;

        let url = format!("{}/{}/json", self.endpoint, ip);
        let response = retry_on_transient_failure(|| self.client.get(&url).query(&[("token", token)]).send()).await?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = retry_after_secs(&response);
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, retry_after, &body));
        }

        let body: Value = response.json().await.map_err(|err| ToolError::Upstream(err.to_string()))?;
        let city = body["city"].as_str().unwrap_or("unknown");
        let region = body["region"].as_str().unwrap_or("unknown");
        let country = body["country"].as_str().unwrap_or("unknown");
        let org = body["org"].as_str().unwrap_or("unknown");

        Ok(format!("{ip}: {city}, {region}, {country} ({org})"))
    }
}

fn construct(_config: Value, credentials: Credentials) -> Arc<dyn Service> {
    Arc::new(IpInfoService::new(credentials))
}

inventory::submit! {
    ServiceFactory {
        class_id: CLASS_ID,
        display_name: "IP Info",
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
        let service = IpInfoService::new(Credentials::default());
        let out = service.invoke("lookup_ip", json!({"ip": "8.8.8.8"})).await.unwrap();
        assert!(out.starts_with("Error:"));
    }

    #[tokio::test]
    async fn unknown_tool_name_is_not_found() {
        let service = IpInfoService::new(Credentials::default());
        let err = service.invoke("not_a_tool", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn success_response_is_formatted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "city": "Mountain View", "region": "California", "country": "US", "org": "Google LLC"
            })))
            .mount(&server)
            .await;

        let credentials = Credentials::new(std::collections::BTreeMap::from([("api_key".to_string(), "k".to_string())]));
        let service = IpInfoService::with_endpoint(credentials, server.uri());
        let out = service.fetch_ip_info(&json!({"ip": "8.8.8.8"})).await.unwrap();
        assert!(out.contains("Mountain View"));
    }
}
