//! Environment and profile configuration for the gateway.
//!
//! Loading is eager and fail-fast: [`GatewayConfig::from_env`] is meant to
//! be called once at process start and to return an error rather than let
//! a missing secret surface later as a confusing runtime failure deep in a
//! request. There is no silent default for anything the spec calls
//! required — only the genuinely optional fields (OAuth, rate-limit
//! storage, CORS) fall back to empty.

mod catalog;

pub use catalog::ProviderModelCatalog;

use std::collections::HashMap;
use std::env;

/// Failures that can occur while assembling [`GatewayConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingRequiredKey(&'static str),
    #[error("no model-provider API key was configured (need at least one GATEWAY_PROVIDER_KEY_*)")]
    NoProviderConfigured,
    #[error("failed to parse model catalog profile: {0}")]
    InvalidCatalog(#[from] serde_yaml::Error),
    #[error("failed to read model catalog profile at {path}: {source}")]
    CatalogIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Process-wide configuration assembled from the environment (and,
/// optionally, a YAML model-catalog profile) at startup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Symmetric key used by `gateway-security` to encrypt at-rest secrets
    /// it is handed by collaborators. The gateway core never decides what
    /// gets persisted, only how it is wrapped.
    pub encryption_key: String,
    /// Key used to validate caller-presented JWTs.
    pub jwt_signing_key: String,
    /// Provider name (e.g. `"openai"`, `"anthropic"`, `"gemini"`) to API
    /// key. At least one entry is required.
    pub provider_api_keys: HashMap<String, String>,
    /// Google OAuth client id/secret, required only for Google-backed API
    /// wrapper tools (Calendar).
    pub google_oauth_client_id: Option<String>,
    pub google_oauth_client_secret: Option<String>,
    /// Connection string for the rate-limiter's shared storage backend.
    /// Absent means in-process (single-node) limiting only.
    pub rate_limit_storage_url: Option<String>,
    /// Origins allowed to call the HTTP surface from a browser.
    pub cors_origins: Vec<String>,
    /// The registered provider/model allow-list (Open Question 3 in
    /// `SPEC_FULL.md`: a configuration input, not a constant).
    pub model_catalog: ProviderModelCatalog,
    /// Oldest-turns-first truncation budget applied to conversation
    /// history before it is submitted to a provider (`SPEC_FULL.md` §11).
    pub max_history_chars: usize,
}

const DEFAULT_MAX_HISTORY_CHARS: usize = 24_000;
const PROVIDER_KEY_PREFIX: &str = "GATEWAY_PROVIDER_KEY_";

impl GatewayConfig {
    /// Loads configuration from the process environment, first merging in
    /// a local `.env` file if one is present (`dotenvy`, matching the
    /// teacher's local-dev convenience; absent in production containers).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required key is missing, no provider
    /// API key is configured, or the optional model-catalog profile fails
    /// to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let encryption_key = required_env("GATEWAY_ENCRYPTION_KEY")?;
        let jwt_signing_key = required_env("GATEWAY_JWT_SIGNING_KEY")?;
        let provider_api_keys = collect_provider_keys();

        if provider_api_keys.is_empty() {
            return Err(ConfigError::NoProviderConfigured);
        }

        let cors_origins = env::var("GATEWAY_CORS_ORIGINS")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let max_history_chars = env::var("GATEWAY_MAX_HISTORY_CHARS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_HISTORY_CHARS);

        let model_catalog = match env::var("GATEWAY_MODEL_CATALOG_PATH") {
            Ok(path) => ProviderModelCatalog::load_from_file(&path)?,
            Err(_) => ProviderModelCatalog::default_catalog(),
        };

        Ok(Self {
            encryption_key,
            jwt_signing_key,
            provider_api_keys,
            google_oauth_client_id: env::var("GATEWAY_GOOGLE_OAUTH_CLIENT_ID").ok(),
            google_oauth_client_secret: env::var("GATEWAY_GOOGLE_OAUTH_CLIENT_SECRET").ok(),
            rate_limit_storage_url: env::var("GATEWAY_RATE_LIMIT_STORAGE_URL").ok(),
            cors_origins,
            model_catalog,
            max_history_chars,
        })
    }

    /// Whether credentials are present for the named provider, used by the
    /// `GET /health` per-provider presence map.
    #[must_use]
    pub fn has_provider(&self, provider: &str) -> bool {
        self.provider_api_keys.contains_key(provider)
    }
}

fn required_env(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingRequiredKey(key))
}

fn collect_provider_keys() -> HashMap<String, String> {
    env::vars()
        .filter_map(|(key, value)| {
            key.strip_prefix(PROVIDER_KEY_PREFIX)
                .map(|provider| (provider.to_lowercase(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_key_is_reported_by_name() {
        let err = required_env("GATEWAY_DOES_NOT_EXIST_KEY").unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequiredKey(_)));
    }

    #[test]
    fn default_history_budget_is_positive() {
        assert!(DEFAULT_MAX_HISTORY_CHARS > 0);
    }
}
