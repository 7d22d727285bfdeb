//! Currency exchange rate lookups.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gateway_traits::{Credentials, Service, ServiceFactory, ServiceKind, ToolDescriptor, ToolError};
use reqwest::Client;
use serde_json::{json, Value};

use super::shared::{map_status, render_error, require_credential, require_str, retry_after_secs, retry_on_transient_failure};

pub const CLASS_ID: &str = "exchange_rate";
const TIMEOUT: Duration = Duration::from_secs(10);
const ENDPOINT: &str = "https://v6.exchangerate-api.com/v6";

#[derive(Debug)]
pub struct ExchangeRateService {
    client: Client,
    credentials: Credentials,
    endpoint: String,
}

impl ExchangeRateService {
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
        name: "convert_currency".to_string(),
        description: "Converts an amount from one currency to another using current exchange rates.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "amount": {"type": "number"},
                "from": {"type": "string", "description": "ISO 4217 currency code, e.g. USD"},
                "to": {"type": "string", "description": "ISO 4217 currency code, e.g. EUR"}
            },
            "required": ["amount", "from", "to"]
        }),
        category: "api_wrapper".to_string(),
        tags: vec!["finance".to_string()],
    }]
}

#[async_trait]
impl Service for ExchangeRateService {
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
        if tool_name != "convert_currency" {
            return Err(ToolError::NotFound(tool_name.to_string()));
        }
        let result = self.convert(&arguments).await;
        Ok(result.unwrap_or_else(|err| render_error(&err)))
    }
}

impl ExchangeRateService {
    async fn convert(&self, arguments: &Value) -> Result<String, ToolError> {
        let amount = arguments
            .get("amount")
            .and_then(Value::as_f64)
            .ok_or_else(|| ToolError::InvalidArguments("missing required field 'amount'".to_string()))?;
        let from = require_str(arguments, "from")?;
        let to = require_str(arguments, "to")?;
        let api_key = require_credential(&self.credentials, "api_key")?;

        let url = format!("{}/{}/pair/{}/{}", self.endpoint, api_key, from.to_uppercase(), to.to_uppercase());
        let response = retry_on_transient_failure(|| self.client.get(&url).send()).await?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = retry_after_secs(&response);
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, retry_after, &body));
        }

        let body: Value = response.json().await.map_err(|err| ToolError::Upstream(err.to_string()))?;
        if body["result"].as_str() == Some("error") {
            let error_type = body["error-type"].as_str().unwrap_or("unknown error");
            return Err(ToolError::Upstream(error_type.to_string()));
        }

        let rate = body["conversion_rate"]
            .as_f64()
            .ok_or_else(|| ToolError::Upstream("response missing conversion_rate".to_string()))?;
        let converted = amount * rate;

        Ok(format!("{amount:.2} {} = {converted:.2} {} (rate: {rate:.6})", from.to_uppercase(), to.to_uppercase()))
    }
}

fn construct(_config: Value, credentials: Credentials) -> Arc<dyn Service> {
    Arc::new(ExchangeRateService::new(credentials))
}

inventory::submit! {
    ServiceFactory {
        class_id: CLASS_ID,
        display_name: "Exchange Rates",
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
        let service = ExchangeRateService::new(Credentials::default());
        let out = service.invoke("convert_currency", json!({"amount": 10.0, "from": "usd", "to": "eur"})).await.unwrap();
        assert!(out.starts_with("Error:"));
    }

    #[tokio::test]
    async fn success_response_computes_converted_amount() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": "success", "conversion_rate": 0.9
            })))
            .mount(&server)
            .await;

        let credentials = Credentials::new(std::collections::BTreeMap::from([("api_key".to_string(), "k".to_string())]));
        let service = ExchangeRateService::with_endpoint(credentials, server.uri());
        let out = service.convert(&json!({"amount": 100.0, "from": "usd", "to": "eur"})).await.unwrap();
        assert!(out.contains("90.00 EUR"));
    }
}
