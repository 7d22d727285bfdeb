//! CORS policy, generalized from the teacher's
//! `services/middleware/cors.rs`: origins come from configuration, never
//! hard-coded, and an empty allow-list disables cross-origin browser
//! access entirely rather than falling back to a wildcard.

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Builds the CORS layer from `GatewayConfig::cors_origins`. An empty list
/// yields a `CorsLayer` that allows no cross-origin requests at all —
/// same-origin and non-browser callers (server-to-server, curl) are
/// unaffected either way.
#[must_use]
pub fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|origin| origin.trim().parse::<HeaderValue>().ok()).collect();

    let origin = if allowed.is_empty() { AllowOrigin::list(Vec::new()) } else { AllowOrigin::list(allowed) };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}

#[cfg(test)]
mod tests {
    use super::build_cors_layer;

    #[test]
    fn empty_origin_list_still_builds_a_layer() {
        let _layer = build_cors_layer(&[]);
    }

    #[test]
    fn malformed_origin_is_skipped_rather_than_panicking() {
        let _layer = build_cors_layer(&["not a valid header value \n".to_string(), "https://example.com".to_string()]);
    }
}
