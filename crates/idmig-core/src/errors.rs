//! Cross-cutting error types for idmig.
//!
//! Every call against a source or target directory returns
//! `Result<_, RemoteError>`. Adapter crates classify their transport and HTTP
//! failures into this taxonomy so the fetcher and the engine can decide what
//! to retry and what to record, without knowing which platform they talk to.

use thiserror::Error;

/// Coarse classification used by retry and reporting code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Read timeout; retried with backoff.
    TransientNetwork,
    /// The remote asked us to slow down; retried with backoff.
    RateLimited,
    /// Validation, auth or duplicate errors; never retried.
    PermanentRejection,
    /// Connection refused, TLS failure, undecodable body; never retried.
    Transport,
    /// The retry ceiling was reached.
    RetryExhausted,
}

/// Errors raised by remote directory calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The request timed out before a response was read.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The remote returned 429 Too Many Requests.
    #[error("rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited {
        /// Seconds from the `Retry-After` header, when present.
        retry_after_secs: Option<u64>,
    },

    /// The remote rejected the request (validation, auth, not found, ...).
    #[error("remote rejected request (HTTP {status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Platform-specific error code, when the body carried one.
        code: Option<String>,
        /// Error message or response body.
        message: String,
    },

    /// The remote rejected a create because the entity already exists.
    #[error("already exists: {message}")]
    AlreadyExists {
        /// Platform-specific error code, when the body carried one.
        code: Option<String>,
        /// Error message or response body.
        message: String,
    },

    /// Any other transport failure (connect, TLS, protocol).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A retried call never succeeded.
    #[error("gave up after {attempts} attempts: {last}")]
    RetryExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Display of the last error seen.
        last: String,
    },
}

impl RemoteError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout(_) => ErrorKind::TransientNetwork,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::Rejected { .. } | Self::AlreadyExists { .. } => ErrorKind::PermanentRejection,
            Self::Transport(_) | Self::Decode(_) => ErrorKind::Transport,
            Self::RetryExhausted { .. } => ErrorKind::RetryExhausted,
        }
    }

    /// Whether the resilient-call wrapper should try again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::TransientNetwork | ErrorKind::RateLimited
        )
    }

    /// Whether a create was rejected as a duplicate.
    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// A password hash that is not a well-formed bcrypt hash.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed bcrypt hash: {reason}")]
pub struct HashParseError {
    reason: String,
}

impl HashParseError {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
