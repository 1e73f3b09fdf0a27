//! Target directory (Descope-style management API) configuration.

use serde::{Deserialize, Serialize};

fn default_base_url() -> String {
    "https://api.descope.com".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetConfig {
    /// Project the identities are migrated into.
    #[serde(default)]
    pub project_id: String,

    /// Management key for that project.
    #[serde(default)]
    pub management_key: String,

    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Error codes the target uses to reject a duplicate create. HTTP 409 is
    /// always treated as a duplicate.
    #[serde(default)]
    pub already_exists_codes: Vec<String>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            management_key: String::new(),
            base_url: default_base_url(),
            already_exists_codes: Vec::new(),
        }
    }
}

impl TargetConfig {
    /// Check if the target has the minimum required fields.
    pub fn is_configured(&self) -> bool {
        !self.project_id.is_empty() && !self.management_key.is_empty()
    }

    /// Bearer credential in `project:key` form.
    pub fn bearer(&self) -> String {
        format!("{}:{}", self.project_id, self.management_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_configured() {
        let config = TargetConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.base_url, "https://api.descope.com");
    }

    #[test]
    fn not_configured_when_missing_key() {
        let config = TargetConfig {
            project_id: "P2abc".into(),
            ..Default::default()
        };
        assert!(!config.is_configured());
    }

    #[test]
    fn bearer_joins_project_and_key() {
        let config = TargetConfig {
            project_id: "P2abc".into(),
            management_key: "K2xyz".into(),
            ..Default::default()
        };
        assert!(config.is_configured());
        assert_eq!(config.bearer(), "P2abc:K2xyz");
    }
}
