//! Retry and backoff configuration for listing requests.

use serde::{Deserialize, Serialize};

/// Backoff base in seconds; the n-th retry waits `base^n`.
const fn default_base_secs() -> u64 {
    5
}

/// Total attempts per page request, the first one included.
const fn default_max_attempts() -> u32 {
    4
}

/// What the fetcher does once a page request runs out of attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    /// Abort the listing with an error.
    #[default]
    Fail,
    /// Log and treat the page as the end of the listing.
    EndOfPages,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(default = "default_base_secs")]
    pub base_secs: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default)]
    pub on_exhaustion: ExhaustionPolicy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_secs: default_base_secs(),
            max_attempts: default_max_attempts(),
            on_exhaustion: ExhaustionPolicy::default(),
        }
    }
}
