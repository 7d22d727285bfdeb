//! Process-wide tracing setup and secret redaction for the gateway.
//!
//! [`init`] installs a `tracing_subscriber` registry with an env-filter and
//! routes formatted output through [`redact::RedactingWriter`], which masks
//! credential-shaped substrings before anything reaches stdout. Every
//! request is expected to carry a `request_id` span (attached in
//! `gateway-api`) so a single `grep request_id` reconstructs its timeline.

mod redact;

pub use redact::{redact, RedactingWriter};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global tracing subscriber. Call once at process start.
///
/// `json` selects structured JSON output (suited to log aggregation /
/// SIEM ingestion) over the human-readable default used in local dev.
pub fn init(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,gateway=debug"));

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(RedactingWriter),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(RedactingWriter))
            .init();
    }
}
