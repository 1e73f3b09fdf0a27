//! General run settings.

use serde::{Deserialize, Serialize};

/// Emit a progress signal every this many successful migrations.
const fn default_progress_every() -> usize {
    10
}

/// Per-request timeout in seconds.
const fn default_request_timeout_secs() -> u64 {
    30
}

/// Users per password batch request.
const fn default_password_batch_size() -> usize {
    100
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Progress cadence for the user migration phase.
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,

    /// Timeout applied to every HTTP request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Number of users sent per password import request.
    #[serde(default = "default_password_batch_size")]
    pub password_batch_size: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            progress_every: default_progress_every(),
            request_timeout_secs: default_request_timeout_secs(),
            password_batch_size: default_password_batch_size(),
        }
    }
}
