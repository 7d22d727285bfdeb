//! The Service/Tool Registry (spec §4.1).
//!
//! A process-wide singleton with an initialization phase (`discover`,
//! walking the `inventory`-collected [`ServiceFactory`] table exactly
//! once) and a read-only serving phase — the `HashMap` it builds is never
//! mutated again, so concurrent readers need no locking.

use std::collections::HashMap;
use std::sync::Arc;

use gateway_traits::{Credentials, Service, ServiceFactory, ServiceKind, ToolDescriptor};
use serde_json::Value;

use crate::error::EngineError;

/// Frozen metadata for one registered [`Service`] class, as surfaced by
/// `GET /services`.
#[derive(Debug, Clone)]
pub struct ServiceMetadata {
    pub class_id: &'static str,
    pub display_name: &'static str,
    pub kind: ServiceKind,
    pub credential_schema: Value,
}

/// The process-wide Service Registry (spec §4.1: "a process-wide
/// singleton with an initialization phase and a read-only serving
/// phase").
#[derive(Debug)]
pub struct ServiceRegistry {
    factories: HashMap<&'static str, &'static ServiceFactory>,
}

impl ServiceRegistry {
    /// Walks every [`ServiceFactory`] submitted via `inventory::submit!`
    /// across `gateway-tools` (and any other linked crate) and freezes
    /// them into a lookup table. Call once at process start.
    ///
    /// # Panics
    ///
    /// Panics if two registered classes share a `class_id` — this is a
    /// startup-time programming error (spec §3: "class identifiers are
    /// unique"), not a request-time condition, so it is caught as early
    /// and loudly as possible rather than silently shadowing one class.
    #[must_use]
    pub fn discover() -> Self {
        let mut factories = HashMap::new();
        for factory in inventory::iter::<ServiceFactory> {
            let previous = factories.insert(factory.class_id, factory);
            assert!(
                previous.is_none(),
                "duplicate service class_id registered: {}",
                factory.class_id
            );
        }
        Self { factories }
    }

    /// (a) *List all Services* → metadata.
    #[must_use]
    pub fn list_services(&self) -> Vec<ServiceMetadata> {
        let mut services: Vec<ServiceMetadata> = self
            .factories
            .values()
            .map(|factory| ServiceMetadata {
                class_id: factory.class_id,
                display_name: factory.display_name,
                kind: factory.kind,
                credential_schema: (factory.credential_schema)(),
            })
            .collect();
        services.sort_by_key(|service| service.class_id);
        services
    }

    /// (b) *List tools of Service X* → tool metadata with input schemas.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] if `class_id` is not registered.
    pub fn list_tools(&self, class_id: &str) -> Result<Vec<ToolDescriptor>, EngineError> {
        let factory = self.lookup(class_id)?;
        Ok((factory.tools)())
    }

    /// (c) *Instantiate Service X with (config, credentials)* → a live
    /// object whose tools can be invoked.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] if `class_id` is not registered.
    pub fn instantiate(&self, class_id: &str, config: Value, credentials: Credentials) -> Result<Arc<dyn Service>, EngineError> {
        let factory = self.lookup(class_id)?;
        Ok((factory.construct)(config, credentials))
    }

    fn lookup(&self, class_id: &str) -> Result<&'static ServiceFactory, EngineError> {
        self.factories.get(class_id).copied().ok_or_else(|| EngineError::NotFound(class_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_registered_class_exposes_at_least_one_tool_with_unique_names() {
        let registry = ServiceRegistry::discover();
        for service in registry.list_services() {
            let tools = registry.list_tools(service.class_id).unwrap();
            assert!(!tools.is_empty(), "{} registered with no tools", service.class_id);
            let mut names: Vec<&str> = tools.iter().map(|tool| tool.name.as_str()).collect();
            names.sort_unstable();
            let unique_count = {
                let mut deduped = names.clone();
                deduped.dedup();
                deduped.len()
            };
            assert_eq!(unique_count, names.len(), "{} has duplicate tool names", service.class_id);
        }
    }

    #[test]
    fn unknown_class_is_not_found() {
        let registry = ServiceRegistry::discover();
        assert!(registry.list_tools("does-not-exist").is_err());
    }

    #[test]
    fn class_identifiers_are_unique() {
        let registry = ServiceRegistry::discover();
        let services = registry.list_services();
        let mut ids: Vec<&str> = services.iter().map(|s| s.class_id).collect();
        ids.sort_unstable();
        let before = ids.len();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }
}
