//! Listing and snapshot error types.

use idmig_core::RemoteError;
use thiserror::Error;

/// Errors that end a paginated listing.
#[derive(Debug, Error)]
pub enum FetchError {
    /// A page kept failing with timeouts or rate limits.
    #[error("listing {resource} page {page}: gave up after {attempts} attempts: {last}")]
    RetryExhausted {
        /// Listing that was being paged.
        resource: String,
        /// Zero-based page that could not be fetched.
        page: u32,
        /// Attempts made for that page.
        attempts: u32,
        /// Display of the last error seen.
        last: String,
    },

    /// A page failed with a non-retryable error.
    #[error("listing {resource} page {page}: {source}")]
    Remote {
        /// Listing that was being paged.
        resource: String,
        /// Zero-based page that failed.
        page: u32,
        /// Underlying remote failure.
        #[source]
        source: RemoteError,
    },
}

/// Errors reading a newline-delimited snapshot file.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The file could not be opened.
    #[error("cannot open snapshot {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be read or parsed.
    #[error("snapshot {path}, record {record}: {source}")]
    Record {
        path: String,
        /// One-based record number.
        record: usize,
        #[source]
        source: std::io::Error,
    },
}
