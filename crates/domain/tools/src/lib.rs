//! Concrete tool families served by the registry to the agent execution
//! engine: pure-function built-ins (spec §4.2), third-party API wrappers
//! (spec §4.3), and the remote-catalog proxy (spec §4.4).
//!
//! Every [`Service`](gateway_traits::Service) in this crate registers
//! itself with [`gateway_traits::ServiceFactory`] via `inventory::submit!`
//! at load time; nothing here is reachable through reflection, only
//! through the declarative factory table the registry walks once at
//! startup (spec §9: "replace with an explicit registration interface").

pub mod builtin;
pub mod remote_catalog;
pub mod wrappers;

pub use remote_catalog::RemoteCatalogService;
