//! Per-request `ToolCatalog` assembly (spec §3, §4.1, §4.4).
//!
//! Materializes the ordered, de-duplicated set of callable tools for one
//! request from its `ServiceBinding` list. Every entry carries a bound
//! invocation closure — here, a live `Arc<dyn Service>` plus the tool
//! name — referencing the originating Service instance and its
//! credentials, exactly as spec §3 describes `ToolCatalog`.

use std::sync::Arc;

use gateway_tools::RemoteCatalogService;
use gateway_traits::{Service, ServiceKind, ToolDescriptor, ToolError};
use serde_json::Value;
use tracing::warn;

use crate::registry::ServiceRegistry;
use crate::types::{SelectionMode, ServiceBinding};

/// One tool, bound to the live Service instance that serves it.
#[derive(Clone)]
pub struct BoundTool {
    pub descriptor: ToolDescriptor,
    service: Arc<dyn Service>,
}

impl std::fmt::Debug for BoundTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundTool").field("name", &self.descriptor.name).finish()
    }
}

impl BoundTool {
    pub async fn invoke(&self, arguments: Value) -> Result<String, ToolError> {
        self.service.invoke(&self.descriptor.name, arguments).await
    }
}

/// The materialized, de-duplicated tool set for one request.
#[derive(Debug, Default, Clone)]
pub struct ToolCatalog {
    tools: Vec<BoundTool>,
}

impl ToolCatalog {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|tool| tool.descriptor.clone()).collect()
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&BoundTool> {
        self.tools.iter().find(|tool| tool.descriptor.name == name)
    }

    /// Applies the request's allowed-tool filter (spec §4.6: "null =
    /// pass-through, empty list = pass-nothing, else keep by name").
    #[must_use]
    pub fn filter_allowed(self, allowed: Option<&[String]>) -> Self {
        let Some(allowed) = allowed else {
            return self;
        };
        let tools = self.tools.into_iter().filter(|tool| allowed.iter().any(|name| name == &tool.descriptor.name)).collect();
        Self { tools }
    }

    /// Assembles a catalog from the request's `ServiceBinding` list.
    ///
    /// A remote-catalog binding discovers its tools over the network
    /// (spec §4.4) rather than from the registry's frozen metadata; a
    /// failed fetch is logged and skipped, not propagated — spec §4.4 and
    /// the end-to-end scenario in §8 ("the request still completes with
    /// `tool_calls == []` and a warning logged; no error event") both
    /// require this to never fail the whole request.
    pub async fn assemble(registry: &ServiceRegistry, bindings: &[ServiceBinding]) -> Self {
        let mut tools: Vec<BoundTool> = Vec::new();
        let mut seen_names = std::collections::HashSet::new();

        for binding in bindings {
            let bound = if binding.class_id == gateway_tools::remote_catalog::CLASS_ID {
                assemble_remote_catalog(binding).await
            } else {
                assemble_registered_service(registry, binding)
            };

            for tool in bound {
                if seen_names.insert(tool.descriptor.name.clone()) {
                    tools.push(tool);
                }
            }
        }

        Self { tools }
    }
}

fn assemble_registered_service(registry: &ServiceRegistry, binding: &ServiceBinding) -> Vec<BoundTool> {
    let service = match registry.instantiate(&binding.class_id, binding.config.clone(), binding.credentials.clone()) {
        Ok(service) => service,
        Err(err) => {
            warn!(class_id = %binding.class_id, error = %err, "skipping unknown service binding");
            return Vec::new();
        }
    };

    service
        .tools()
        .into_iter()
        .filter(|descriptor| selected(binding, &descriptor.name))
        .map(|descriptor| BoundTool { descriptor, service: Arc::clone(&service) })
        .collect()
}

async fn assemble_remote_catalog(binding: &ServiceBinding) -> Vec<BoundTool> {
    let base_url = binding.config.get("base_url").and_then(Value::as_str).unwrap_or_default().to_string();
    if base_url.is_empty() {
        warn!("remote_catalog binding missing required config.base_url; skipping");
        return Vec::new();
    }

    let remote = Arc::new(RemoteCatalogService::new(base_url.clone(), binding.credentials.clone()));
    let descriptors = match remote.fetch_catalog().await {
        Ok(descriptors) => descriptors,
        Err(err) => {
            warn!(base_url = %base_url, error = %err, "remote catalog fetch failed; proceeding without its tools");
            return Vec::new();
        }
    };

    let service: Arc<dyn Service> = remote;
    debug_assert_eq!(service.kind(), ServiceKind::RemoteCatalog);

    descriptors
        .into_iter()
        .filter(|descriptor| selected(binding, &descriptor.name))
        .map(|descriptor| BoundTool { descriptor, service: Arc::clone(&service) })
        .collect()
}

fn selected(binding: &ServiceBinding, tool_name: &str) -> bool {
    match binding.selection_mode {
        SelectionMode::All => true,
        SelectionMode::Selected => binding.selected_tools.iter().any(|name| name == tool_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_traits::Credentials;

    fn binding(class_id: &str) -> ServiceBinding {
        ServiceBinding {
            class_id: class_id.to_string(),
            selection_mode: SelectionMode::All,
            selected_tools: Vec::new(),
            credentials: Credentials::default(),
            config: Value::Null,
        }
    }

    #[tokio::test]
    async fn unknown_service_binding_yields_no_tools_not_an_error() {
        let registry = ServiceRegistry::discover();
        let catalog = ToolCatalog::assemble(&registry, &[binding("does-not-exist")]).await;
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn builtin_binding_materializes_its_tools() {
        let registry = ServiceRegistry::discover();
        let catalog = ToolCatalog::assemble(&registry, &[binding("builtin")]).await;
        assert!(!catalog.is_empty());
        assert!(catalog.find("calculate").is_some());
    }

    #[tokio::test]
    async fn selected_mode_filters_to_named_tools_only() {
        let registry = ServiceRegistry::discover();
        let mut only_calculate = binding("builtin");
        only_calculate.selection_mode = SelectionMode::Selected;
        only_calculate.selected_tools = vec!["calculate".to_string()];
        let catalog = ToolCatalog::assemble(&registry, &[only_calculate]).await;
        assert_eq!(catalog.len(), 1);
        assert!(catalog.find("calculate").is_some());
    }

    #[tokio::test]
    async fn allowed_tools_filter_null_passes_through_empty_passes_nothing() {
        let registry = ServiceRegistry::discover();
        let catalog = ToolCatalog::assemble(&registry, &[binding("builtin")]).await;
        let unfiltered_len = catalog.clone().filter_allowed(None).len();
        assert!(unfiltered_len > 0);
        let nothing = catalog.filter_allowed(Some(&[]));
        assert!(nothing.is_empty());
    }

    #[tokio::test]
    async fn unreachable_remote_catalog_yields_no_tools_not_an_error() {
        let mut remote = binding(gateway_tools::remote_catalog::CLASS_ID);
        remote.config = serde_json::json!({"base_url": "http://127.0.0.1:1"});
        let registry = ServiceRegistry::discover();
        let catalog = ToolCatalog::assemble(&registry, &[remote]).await;
        assert!(catalog.is_empty());
    }
}
