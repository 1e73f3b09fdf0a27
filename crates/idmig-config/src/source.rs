//! Source directory (Auth0-style management API) configuration.

use serde::{Deserialize, Serialize};

/// Default listing page size.
const fn default_page_size() -> u32 {
    100
}

fn default_region() -> String {
    "us".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Tenant name, the first label of `{tenant}.{region}.auth0.com`.
    #[serde(default)]
    pub tenant_id: String,

    /// Region label of the tenant domain.
    #[serde(default = "default_region")]
    pub region: String,

    /// Management API bearer token.
    #[serde(default)]
    pub token: String,

    /// Full API base URL; overrides the tenant-derived domain when set.
    #[serde(default)]
    pub base_url: String,

    /// Records requested per listing page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            region: default_region(),
            token: String::new(),
            base_url: String::new(),
            page_size: default_page_size(),
        }
    }
}

impl SourceConfig {
    /// Check if the source has a token and somewhere to send it.
    pub fn is_configured(&self) -> bool {
        !self.token.is_empty() && (!self.tenant_id.is_empty() || !self.base_url.is_empty())
    }

    /// Base URL of the management API, without a trailing slash.
    pub fn api_base(&self) -> String {
        if self.base_url.is_empty() {
            format!("https://{}.{}.auth0.com", self.tenant_id, self.region)
        } else {
            self.base_url.trim_end_matches('/').to_string()
        }
    }
}
