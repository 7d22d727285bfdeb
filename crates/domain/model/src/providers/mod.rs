//! Concrete vendor providers.

mod anthropic;
mod gemini;
mod openai;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

use std::time::Duration;

use reqwest::Client;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the pooled HTTP client shared across requests to one vendor.
/// Connection pools are process-wide mutable state (spec §5) and
/// `reqwest::Client` is internally `Arc`-backed and thread-safe, so one
/// client per provider is reused rather than built per call.
pub(crate) fn build_http_client() -> reqwest::Result<Client> {
    Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .build()
}
