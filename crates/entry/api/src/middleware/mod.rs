pub mod auth;
pub mod cors;
pub mod rate_limit;
pub mod request_id;

pub use auth::require_auth;
pub use cors::build_cors_layer;
pub use rate_limit::RouterExt;
pub use request_id::RequestIdLayer;
