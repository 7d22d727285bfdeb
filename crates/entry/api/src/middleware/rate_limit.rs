//! Per-caller-IP rate limiting, generalized from the teacher's
//! `services/middleware/rate_limit.rs` `RouterExt` trait.
//!
//! The operator's rate-limit storage URL (`GatewayConfig::rate_limit_storage_url`)
//! only selects whether limiting is shared across nodes at the
//! infrastructure layer (spec §5 is silent on this); `tower_governor`
//! itself always keeps its token buckets in-process.

use axum::Router;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::SmartIpKeyExtractor;
use tower_governor::GovernorLayer;
use tracing::warn;

pub trait RouterExt<S> {
    /// Applies a `per_second`-rate, `burst`-size token bucket keyed on the
    /// caller's IP address. Falls back to no rate limiting (with a warning)
    /// if the governor configuration cannot be built, rather than refusing
    /// to serve at all.
    fn with_rate_limit(self, per_second: u64, burst: u32) -> Self;
}

impl<S> RouterExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_rate_limit(self, per_second: u64, burst: u32) -> Self {
        let config = GovernorConfigBuilder::default().per_second(per_second).burst_size(burst).key_extractor(SmartIpKeyExtractor).use_headers().finish();

        match config {
            Some(config) => self.layer(GovernorLayer::new(config)),
            None => {
                warn!("failed to configure rate limiting; serving without it");
                self
            }
        }
    }
}
