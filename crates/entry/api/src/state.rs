//! Process-wide, read-only state shared across every request.
//!
//! Everything here is built once in [`crate::build_app_state`] at process
//! start and handed to axum as shared [`axum::extract::State`] — matching
//! spec §5's "Service Registry is read-only after startup" and "global
//! singletons... initialize once during startup; pass as explicit context
//! to request handlers; never mutate after initialization" (§9).

use std::sync::Arc;

use gateway_config::GatewayConfig;
use gateway_engine::ServiceRegistry;
use gateway_model::ProviderRegistry;

/// Shared, `Clone`-cheap application state: every field is an `Arc`, so
/// cloning `AppState` per request is just a handful of refcount bumps.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub service_registry: Arc<ServiceRegistry>,
    pub provider_registry: Arc<ProviderRegistry>,
}

impl AppState {
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        let provider_registry = ProviderRegistry::from_api_keys(&config.provider_api_keys);
        Self {
            config: Arc::new(config),
            service_registry: Arc::new(ServiceRegistry::discover()),
            provider_registry: Arc::new(provider_registry),
        }
    }
}
