use std::collections::HashMap;

use axum_test::TestServer;
use gateway_api::{build_router, AppState};
use gateway_config::{GatewayConfig, ProviderModelCatalog};

fn test_config() -> GatewayConfig {
    let mut provider_api_keys = HashMap::new();
    provider_api_keys.insert("openai".to_string(), "test-key".to_string());

    GatewayConfig {
        encryption_key: "test-encryption-key".to_string(),
        jwt_signing_key: "test-signing-key".to_string(),
        provider_api_keys,
        google_oauth_client_id: None,
        google_oauth_client_secret: None,
        rate_limit_storage_url: None,
        cors_origins: Vec::new(),
        model_catalog: ProviderModelCatalog::default_catalog(),
        max_history_chars: 24_000,
    }
}

#[tokio::test]
async fn health_endpoint_is_reachable_without_authentication() {
    let router = build_router(AppState::new(test_config()));
    let server = TestServer::new(router).unwrap();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["providers"]["openai"], true);
    assert_eq!(body["providers"]["anthropic"], false);
}

#[tokio::test]
async fn chat_without_a_bearer_token_is_rejected() {
    let router = build_router(AppState::new(test_config()));
    let server = TestServer::new(router).unwrap();

    let response = server.post("/chat").json(&serde_json::json!({})).await;

    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
}
