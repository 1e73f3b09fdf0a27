//! Shared HTTP response helpers for the target client.
//!
//! The management API reports failures as
//! `{"errorCode": "...", "errorDescription": "...", "errorMessage": "..."}`.
//! HTTP 409 and any configured duplicate code become
//! [`RemoteError::AlreadyExists`]; everything else is a rejection.

use idmig_core::RemoteError;
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

/// Check an HTTP response, classifying failures.
pub async fn check_response(
    resp: reqwest::Response,
    already_exists_codes: &[String],
) -> Result<reqwest::Response, RemoteError> {
    let status = resp.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(RemoteError::RateLimited {
            retry_after_secs: parse_retry_after(&resp),
        });
    }
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(parsed) => {
            let message = match (parsed.error_description, parsed.error_message) {
                (Some(description), Some(detail)) if !detail.is_empty() => {
                    format!("{description}: {detail}")
                }
                (Some(description), _) => description,
                (None, Some(detail)) => detail,
                (None, None) => body,
            };
            (parsed.error_code, message)
        }
        Err(_) => (None, body),
    };

    let duplicate = status == reqwest::StatusCode::CONFLICT
        || code
            .as_ref()
            .is_some_and(|code| already_exists_codes.iter().any(|known| known == code));
    if duplicate {
        return Err(RemoteError::AlreadyExists { code, message });
    }
    Err(RemoteError::Rejected {
        status: status.as_u16(),
        code,
        message,
    })
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

fn parse_retry_after(resp: &reqwest::Response) -> Option<u64> {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
}
