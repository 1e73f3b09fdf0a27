use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::TargetStatus;

/// Custom attribute holding the comma-joined source connection labels.
pub const ATTR_CONNECTION: &str = "connection";
/// Custom attribute set on identities created by a migration run.
pub const ATTR_FRESHLY_MIGRATED: &str = "freshlyMigrated";

/// An identity in the target directory.
///
/// `login_ids[0]` is the primary login id; every write in a run addresses the
/// identity through it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TargetIdentity {
    pub login_ids: Vec<String>,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub phone_verified: bool,
    #[serde(default)]
    pub custom_attributes: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub status: TargetStatus,
}

impl TargetIdentity {
    #[must_use]
    pub fn primary_login_id(&self) -> Option<&str> {
        self.login_ids.first().map(String::as_str)
    }

    /// Login ids after the primary one.
    #[must_use]
    pub fn additional_login_ids(&self) -> &[String] {
        self.login_ids.get(1..).unwrap_or_default()
    }

    /// Connection labels recorded in the `connection` attribute.
    #[must_use]
    pub fn connections(&self) -> Vec<String> {
        self.custom_attributes
            .get(ATTR_CONNECTION)
            .and_then(serde_json::Value::as_str)
            .map(|joined| {
                joined
                    .split(',')
                    .map(str::trim)
                    .filter(|label| !label.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Overwrite the `connection` attribute, dropping repeated labels.
    pub fn set_connections<S: AsRef<str>>(&mut self, labels: &[S]) {
        let mut unique: Vec<&str> = Vec::with_capacity(labels.len());
        for label in labels {
            let label = label.as_ref();
            if !unique.contains(&label) {
                unique.push(label);
            }
        }
        self.custom_attributes.insert(
            ATTR_CONNECTION.to_string(),
            serde_json::Value::String(unique.join(",")),
        );
    }

    /// Append a login id unless it is already present.
    pub fn push_login_id(&mut self, login_id: &str) {
        if !self.login_ids.iter().any(|existing| existing == login_id) {
            self.login_ids.push(login_id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn connections_split_and_trim() {
        let mut identity = TargetIdentity::default();
        identity.custom_attributes.insert(
            ATTR_CONNECTION.into(),
            serde_json::json!("email, google-oauth2,,sms"),
        );
        assert_eq!(identity.connections(), vec!["email", "google-oauth2", "sms"]);
    }

    #[test]
    fn missing_connection_attribute_is_empty() {
        assert!(TargetIdentity::default().connections().is_empty());
    }

    #[test]
    fn set_connections_keeps_first_occurrence() {
        let mut identity = TargetIdentity::default();
        identity.set_connections(&["a", "b", "a", "c"]);
        assert_eq!(
            identity.custom_attributes[ATTR_CONNECTION],
            serde_json::json!("a,b,c")
        );
    }

    #[test]
    fn push_login_id_ignores_duplicates() {
        let mut identity = TargetIdentity {
            login_ids: vec!["email-1".into()],
            ..Default::default()
        };
        identity.push_login_id("email-1");
        identity.push_login_id("github-7");
        assert_eq!(identity.login_ids, vec!["email-1", "github-7"]);
        assert_eq!(identity.primary_login_id(), Some("email-1"));
        assert_eq!(identity.additional_login_ids(), ["github-7".to_string()]);
    }
}
