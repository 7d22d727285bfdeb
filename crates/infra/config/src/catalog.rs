//! The registered provider/model allow-list.
//!
//! Kept as a configuration input rather than a constant table so operators
//! can add a model (or retire one) without a rebuild — see `SPEC_FULL.md`
//! §12, Open Question 3.

use std::collections::HashMap;
use std::fs;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Provider name to the list of model ids the gateway will accept in
/// `agent_config.model`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderModelCatalog {
    providers: HashMap<String, Vec<String>>,
}

impl ProviderModelCatalog {
    /// Loads a catalog from a YAML profile file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CatalogIo`] if the file cannot be read, or
    /// [`ConfigError::InvalidCatalog`] if it does not parse.
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::CatalogIo {
            path: path.to_owned(),
            source,
        })?;
        let catalog: Self = serde_yaml::from_str(&raw)?;
        Ok(catalog)
    }

    /// A small built-in catalog covering the three providers the spec's
    /// `AiProvider` facade supports, used when no profile is configured.
    #[must_use]
    pub fn default_catalog() -> Self {
        let mut providers = HashMap::new();
        providers.insert(
            "openai".to_string(),
            vec!["gpt-4o".to_string(), "gpt-4o-mini".to_string()],
        );
        providers.insert(
            "anthropic".to_string(),
            vec![
                "claude-opus-4".to_string(),
                "claude-sonnet-4".to_string(),
            ],
        );
        providers.insert("gemini".to_string(), vec!["gemini-2.0-flash".to_string()]);
        Self { providers }
    }

    /// Whether `model` is registered under `provider`.
    #[must_use]
    pub fn allows(&self, provider: &str, model: &str) -> bool {
        self.providers
            .get(provider)
            .is_some_and(|models| models.iter().any(|m| m == model))
    }

    /// Whether `provider` has any registered models at all.
    #[must_use]
    pub fn has_provider(&self, provider: &str) -> bool {
        self.providers.contains_key(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_allows_its_own_models() {
        let catalog = ProviderModelCatalog::default_catalog();
        assert!(catalog.allows("openai", "gpt-4o"));
        assert!(!catalog.allows("openai", "not-a-real-model"));
        assert!(!catalog.allows("not-a-real-provider", "gpt-4o"));
    }
}
