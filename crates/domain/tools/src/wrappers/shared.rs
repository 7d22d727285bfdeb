//! Cross-cutting behavior every API-wrapper service shares (spec §4.3):
//! credential lookup, a pooled HTTP client with explicit timeouts, retry on
//! transient failure, and HTTP-status-to-taxonomy mapping.

use std::time::Duration;

use gateway_traits::{Credentials, ToolError};
use reqwest::{Client, StatusCode};
use serde_json::Value;

/// Retry budget for transient upstream failures (spec §4.3: "up to 3
/// attempts with >=2 s delay").
const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Builds the pooled client shared by one wrapper service across requests.
/// `timeout` is the wrapper's declared per-call budget (10-30 s range,
/// spec §4.3); connection pooling itself is shared process-wide state
/// (spec §5) so one client is built once and reused, not per call.
pub fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_default()
}

/// Reads a required credential, mapping absence to the user-readable
/// failure the spec requires ("missing credential returns a user-readable
/// failure string" — surfaced by the caller as `ToolError::MissingCredential`,
/// which the engine formats into the tool's output, not a panic).
pub fn require_credential<'a>(credentials: &'a Credentials, key: &str) -> Result<&'a str, ToolError> {
    credentials.get(key).ok_or_else(|| ToolError::MissingCredential(key.to_string()))
}

/// Runs `operation` up to [`MAX_ATTEMPTS`] times, retrying only on
/// transient network failure (timeout or connection error — not on a
/// successful-but-rejecting HTTP response, which the caller maps via
/// [`map_status`] instead).
pub async fn retry_on_transient_failure<F, Fut, T>(operation: F) -> Result<T, ToolError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, reqwest::Error>>,
{
    let mut last_err = None;
    for attempt in 1..=MAX_ATTEMPTS {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !is_transient(&err) => return Err(classify_request_error(&err)),
            Err(err) => {
                last_err = Some(err);
                if attempt < MAX_ATTEMPTS {
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }
    Err(classify_request_error(&last_err.expect("loop always sets last_err before exhausting attempts")))
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

fn classify_request_error(err: &reqwest::Error) -> ToolError {
    if err.is_timeout() {
        ToolError::Timeout(Duration::from_secs(30))
    } else {
        ToolError::Upstream(err.to_string())
    }
}

/// Maps a vendor HTTP status to the vendor-agnostic taxonomy (spec §4.3).
pub fn map_status(status: StatusCode, retry_after_secs: Option<u64>, body: &str) -> ToolError {
    match status {
        StatusCode::UNAUTHORIZED => ToolError::Upstream(format!("authentication failure: {body}")),
        StatusCode::FORBIDDEN => ToolError::Upstream(format!("insufficient permission: {body}")),
        StatusCode::NOT_FOUND => ToolError::NotFound(body.to_string()),
        StatusCode::CONFLICT | StatusCode::GONE => ToolError::Upstream(format!("conflict or gone: {body}")),
        StatusCode::TOO_MANY_REQUESTS => ToolError::RateLimited { retry_after_secs },
        status if status.is_server_error() => ToolError::Upstream(format!("upstream failure ({status}): {body}")),
        status => ToolError::Upstream(format!("unexpected status {status}: {body}")),
    }
}

/// Extracts the `Retry-After` header (seconds) from a response, if present.
pub fn retry_after_secs(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

/// Renders a [`ToolError`] the way every wrapper's `invoke()` formats its
/// failure return string (spec §4.2/§4.3 contract: failures are content,
/// not a distinct return type).
pub fn render_error(err: &ToolError) -> String {
    format!("Error: {err}")
}

/// Arguments helper: reads a required string field, or a [`ToolError`].
pub fn require_str<'a>(arguments: &'a Value, field: &str) -> Result<&'a str, ToolError> {
    arguments
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing required field '{field}'")))
}
