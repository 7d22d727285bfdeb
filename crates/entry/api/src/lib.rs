//! The HTTP entry point of the agent orchestration gateway.
//!
//! This crate owns none of the hard engineering: request validation,
//! authentication, rate limiting, and response framing live here; the
//! agentic loop, tool registry, and streaming event bus live in
//! `gateway-engine`, `gateway-tools`, and `gateway-events` respectively.

pub mod dto;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::GatewayError;
pub use routes::build_router;
pub use state::AppState;
