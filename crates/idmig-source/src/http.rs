//! Shared HTTP response helpers for the source client.
//!
//! Centralizes status-code checks (429 rate limiting with `Retry-After`
//! parsing, non-success → [`RemoteError::Rejected`]) and transport error
//! classification so the client stays focused on request construction.

use idmig_core::RemoteError;
use serde::Deserialize;

/// Error body returned by the management API.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
}

/// Check an HTTP response for common error conditions.
///
/// Returns the response unchanged on success. Handles:
/// - **429 Too Many Requests** → [`RemoteError::RateLimited`] with
///   `Retry-After` header parsing.
/// - **Non-success status** → [`RemoteError::Rejected`] with status code,
///   the body's `errorCode`, and its message (or the raw body).
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    if resp.status() == 429 {
        return Err(RemoteError::RateLimited {
            retry_after_secs: parse_retry_after(&resp),
        });
    }
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(parsed) => (
                parsed.error_code,
                parsed.message.or(parsed.error).unwrap_or(body),
            ),
            Err(_) => (None, body),
        };
        return Err(RemoteError::Rejected {
            status,
            code,
            message,
        });
    }
    Ok(resp)
}

/// Classify a transport-level failure.
pub fn classify(err: &reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        RemoteError::Timeout(err.to_string())
    } else if err.is_decode() {
        RemoteError::Decode(err.to_string())
    } else {
        RemoteError::Transport(err.to_string())
    }
}

/// Parse the `Retry-After` header as seconds.
fn parse_retry_after(resp: &reqwest::Response) -> Option<u64> {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
}
