//! Weather lookups over OpenWeatherMap's current-conditions endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gateway_traits::{Credentials, Service, ServiceFactory, ServiceKind, ToolDescriptor, ToolError};
use reqwest::Client;
use serde_json::{json, Value};

use super::shared::{map_status, render_error, require_credential, require_str, retry_after_secs, retry_on_transient_failure};

pub const CLASS_ID: &str = "weather";
const TIMEOUT: Duration = Duration::from_secs(10);
const ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug)]
pub struct WeatherService {
    client: Client,
    credentials: Credentials,
    endpoint: String,
}

impl WeatherService {
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            client: super::shared::build_client(TIMEOUT),
            credentials,
            endpoint: ENDPOINT.to_string(),
        }
    }

    #[cfg(test)]
    fn with_endpoint(credentials: Credentials, endpoint: String) -> Self {
        Self { client: super::shared::build_client(TIMEOUT), credentials, endpoint }
    }
}

fn descriptors() -> Vec<ToolDescriptor> {
    vec![ToolDescriptor {
        name: "get_weather".to_string(),
        description: "Returns current weather conditions for a named city.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "city": {"type": "string", "description": "City name, e.g. 'Berlin'"},
                "units": {"type": "string", "enum": ["metric", "imperial"], "description": "Defaults to metric"}
            },
            "required": ["city"]
        }),
        category: "api_wrapper".to_string(),
        tags: vec!["weather".to_string()],
    }]
}

#[async_trait]
impl Service for WeatherService {
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
        if tool_name != "get_weather" {
            return Err(ToolError::NotFound(tool_name.to_string()));
        }

        let result = self.fetch_weather(&arguments).await;
        Ok(result.unwrap_or_else(|err| render_error(&err)))
    }
}

impl WeatherService {
    async fn fetch_weather(&self, arguments: &Value) -> Result<String, ToolError> {
        let city = require_str(arguments, "city")?;
        let units = arguments.get("units").and_then(Value::as_str).unwrap_or("metric");
        let api_key = require_credential(&self.credentials, "api_key")?;

        let response = retry_on_transient_failure(|| {
            self.client
                .get(&self.endpoint)
                .query(&[("q", city), ("units", units), ("appid", api_key)])
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
        let description = body["weather"][0]["description"].as_str().unwrap_or("unknown");
        let temp = body["main"]["temp"].as_f64().unwrap_or(0.0);
        let feels_like = body["main"]["feels_like"].as_f64().unwrap_or(0.0);
        let humidity = body["main"]["humidity"].as_u64().unwrap_or(0);
        let unit_symbol = if units == "imperial" { "°F" } else { "°C" };

        Ok(format!(
            "{city}: {description}, {temp}{unit_symbol} (feels like {feels_like}{unit_symbol}), humidity {humidity}%"
        ))
    }
}

fn construct(_config: Value, credentials: Credentials) -> Arc<dyn Service> {
    Arc::new(WeatherService::new(credentials))
}

inventory::submit! {
    ServiceFactory {
        class_id: CLASS_ID,
        display_name: "Weather",
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

    #[tokio::test]
    async fn missing_credential_is_a_readable_failure() {
        let service = WeatherService::new(Credentials::default());
        let out = service.invoke("get_weather", json!({"city": "Berlin"})).await.unwrap();
        assert!(out.starts_with("Error:"));
    }

    #[tokio::test]
    async fn unknown_tool_name_is_not_found() {
        let service = WeatherService::new(Credentials::default());
        let err = service.invoke("not_a_tool", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[test]
    fn descriptor_is_well_formed() {
        let tools = descriptors();
        assert_eq!(tools.len(), 1);
        assert!(!tools[0].description.is_empty());
    }

    #[tokio::test]
    async fn rate_limit_status_maps_to_rate_limited_with_retry_after() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "5"))
            .mount(&server)
            .await;

        let credentials = Credentials::new(std::collections::BTreeMap::from([(
            "api_key".to_string(),
            "k".to_string(),
        )]));
        let service = WeatherService::with_endpoint(credentials, server.uri());
        let err = service.fetch_weather(&json!({"city": "Berlin"})).await.unwrap_err();
        assert!(matches!(err, ToolError::RateLimited { retry_after_secs: Some(5) }));
    }

    #[tokio::test]
    async fn success_response_is_formatted_with_city_and_description() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "weather": [{"description": "clear sky"}],
                "main": {"temp": 21.0, "feels_like": 20.0, "humidity": 40}
            })))
            .mount(&server)
            .await;

        let credentials = Credentials::new(std::collections::BTreeMap::from([(
            "api_key".to_string(),
            "k".to_string(),
        )]));
        let service = WeatherService::with_endpoint(credentials, server.uri());
        let out = service.fetch_weather(&json!({"city": "Berlin"})).await.unwrap();
        assert!(out.contains("Berlin"));
        assert!(out.contains("clear sky"));
    }
}
