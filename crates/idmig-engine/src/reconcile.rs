//! Per-user reconciliation.
//!
//! A source identity is matched against the target by email only:
//!
//! - no match: create a target identity from the source;
//! - match, no new connections: a duplicate push, skipped unless the source
//!   is blocked;
//! - match, new connections: merge them in and fill missing profile fields.
//!
//! Blocked sources, and merges into identities that are already disabled,
//! leave the target identity disabled. Nothing here ever re-enables one.

use std::collections::BTreeMap;

use idmig_core::RemoteError;
use idmig_core::entities::{ATTR_FRESHLY_MIGRATED, SourceIdentity, TargetIdentity};
use idmig_core::enums::{ReconciliationOutcome, TargetStatus};
use idmig_target::TargetDirectory;

use crate::login_ids::derive_login_ids;

/// Decides and applies create, merge or skip for one source identity.
#[derive(Clone, Copy)]
pub struct Reconciler<'a> {
    target: &'a dyn TargetDirectory,
}

impl<'a> Reconciler<'a> {
    #[must_use]
    pub const fn new(target: &'a dyn TargetDirectory) -> Self {
        Self { target }
    }

    /// Reconcile `source` against the target.
    ///
    /// Never fails: remote errors become [`ReconciliationOutcome::Failed`]
    /// carrying the source id and the underlying message.
    pub async fn reconcile(&self, source: &SourceIdentity) -> ReconciliationOutcome {
        let login_ids = derive_login_ids(source);
        if login_ids.is_empty() {
            return ReconciliationOutcome::Failed {
                reason: format!(
                    "{}: no linked identity to derive a login id from",
                    source.source_user_id
                ),
            };
        }

        match self.apply(source, login_ids).await {
            Ok(outcome) => outcome,
            Err(err) => ReconciliationOutcome::Failed {
                reason: format!("{}: {err}", source.source_user_id),
            },
        }
    }

    async fn apply(
        &self,
        source: &SourceIdentity,
        login_ids: Vec<String>,
    ) -> Result<ReconciliationOutcome, RemoteError> {
        let existing = if source.email.is_empty() {
            None
        } else {
            self.target.find_by_email(&source.email).await?
        };

        match existing {
            None => self.create(source, login_ids).await,
            Some(existing) => self.merge(source, &login_ids, existing).await,
        }
    }

    async fn create(
        &self,
        source: &SourceIdentity,
        login_ids: Vec<String>,
    ) -> Result<ReconciliationOutcome, RemoteError> {
        let identity = new_identity(source, login_ids);
        let primary = identity.primary_login_id().unwrap_or_default();

        self.target.create_user(&identity).await?;
        tracing::debug!(source_id = %source.source_user_id, login_id = primary, "created identity");

        if source.blocked {
            self.target.deactivate_user(primary).await?;
            tracing::debug!(login_id = primary, "disabled blocked identity");
        }
        Ok(ReconciliationOutcome::Created)
    }

    async fn merge(
        &self,
        source: &SourceIdentity,
        login_ids: &[String],
        existing: TargetIdentity,
    ) -> Result<ReconciliationOutcome, RemoteError> {
        let Some(primary) = existing.primary_login_id().map(ToString::to_string) else {
            return Err(RemoteError::Decode(format!(
                "identity registered under {} has no login id",
                source.email
            )));
        };

        let recorded = existing.connections();
        let added: Vec<String> = source
            .connection_labels()
            .into_iter()
            .filter(|label| !recorded.contains(label))
            .collect();

        if added.is_empty() {
            if source.blocked {
                self.target.deactivate_user(&primary).await?;
                tracing::debug!(login_id = %primary, "disabled duplicate of blocked source");
                return Ok(ReconciliationOutcome::Merged {
                    disabled_mismatch: true,
                });
            }
            tracing::debug!(login_id = %primary, "duplicate push, skipping");
            return Ok(ReconciliationOutcome::Skipped);
        }

        let already_disabled = existing.status.is_disabled();
        let merged = merged_identity(existing, source, login_ids, &recorded, &added);
        self.target.update_user(&primary, &merged).await?;
        tracing::debug!(
            source_id = %source.source_user_id,
            login_id = %primary,
            added = %added.join(","),
            "merged connections"
        );

        let disabled_mismatch = source.blocked || already_disabled;
        if disabled_mismatch {
            self.target.deactivate_user(&primary).await?;
        }
        Ok(ReconciliationOutcome::Merged { disabled_mismatch })
    }
}

/// A fresh target identity mirroring `source`.
fn new_identity(source: &SourceIdentity, login_ids: Vec<String>) -> TargetIdentity {
    let mut identity = TargetIdentity {
        login_ids,
        email: source.email.clone(),
        phone: source.phone.clone(),
        display_name: source.display_name.clone(),
        given_name: source.given_name.clone(),
        family_name: source.family_name.clone(),
        picture: source.picture.clone(),
        email_verified: source.email_verified,
        phone_verified: source.phone_verified,
        custom_attributes: BTreeMap::new(),
        status: if source.blocked {
            TargetStatus::Disabled
        } else {
            TargetStatus::Enabled
        },
    };
    identity.set_connections(&source.connection_labels());
    identity
        .custom_attributes
        .insert(ATTR_FRESHLY_MIGRATED.to_string(), serde_json::Value::Bool(true));
    identity
}

/// `existing` with the new connections, login ids and missing profile fields
/// of `source` folded in.
fn merged_identity(
    mut existing: TargetIdentity,
    source: &SourceIdentity,
    login_ids: &[String],
    recorded: &[String],
    added: &[String],
) -> TargetIdentity {
    let labels: Vec<&String> = recorded.iter().chain(added).collect();
    existing.set_connections(&labels);

    for login_id in login_ids {
        existing.push_login_id(login_id);
    }

    fill(&mut existing.picture, source.picture.as_ref());
    fill(&mut existing.given_name, source.given_name.as_ref());
    fill(&mut existing.family_name, source.family_name.as_ref());
    existing
}

fn fill(slot: &mut Option<String>, value: Option<&String>) {
    if slot.as_deref().is_none_or(str::is_empty) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            *slot = Some(value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idmig_core::entities::{ATTR_CONNECTION, ConnectionIdentity};
    use idmig_target::{DirectoryCall, InMemoryDirectory};
    use pretty_assertions::assert_eq;

    fn source(email: &str, blocked: bool, identities: &[(&str, &str)]) -> SourceIdentity {
        SourceIdentity {
            source_user_id: format!("auth0|{email}"),
            email: email.into(),
            phone: None,
            display_name: Some("Ada Lovelace".into()),
            given_name: Some("Ada".into()),
            family_name: None,
            picture: Some("https://cdn.example.com/ada.png".into()),
            email_verified: true,
            phone_verified: false,
            blocked,
            identities: identities
                .iter()
                .map(|(connection, user_id)| ConnectionIdentity {
                    connection: (*connection).into(),
                    user_id: (*user_id).into(),
                })
                .collect(),
        }
    }

    fn existing(login_id: &str, email: &str, connections: &str) -> TargetIdentity {
        let mut identity = TargetIdentity {
            login_ids: vec![login_id.into()],
            email: email.into(),
            ..TargetIdentity::default()
        };
        identity
            .custom_attributes
            .insert(ATTR_CONNECTION.into(), serde_json::json!(connections));
        identity
    }

    #[tokio::test]
    async fn creates_when_email_is_unknown() {
        let directory = InMemoryDirectory::new();
        let outcome = Reconciler::new(&directory)
            .reconcile(&source("a@x.com", false, &[("email", "1")]))
            .await;

        assert_eq!(outcome, ReconciliationOutcome::Created);
        let created = directory.user("email-1").unwrap();
        assert_eq!(created.login_ids, vec!["email-1"]);
        assert_eq!(created.status, TargetStatus::Enabled);
        assert_eq!(created.connections(), vec!["email"]);
        assert_eq!(
            created.custom_attributes[ATTR_FRESHLY_MIGRATED],
            serde_json::json!(true)
        );
    }

    #[tokio::test]
    async fn blocked_source_is_created_then_disabled() {
        let directory = InMemoryDirectory::new();
        let outcome = Reconciler::new(&directory)
            .reconcile(&source("a@x.com", true, &[("email", "1")]))
            .await;

        assert_eq!(outcome, ReconciliationOutcome::Created);
        assert!(directory.user("email-1").unwrap().status.is_disabled());
        assert_eq!(
            directory.writes(),
            vec![
                DirectoryCall::CreateUser("email-1".into()),
                DirectoryCall::DeactivateUser("email-1".into()),
            ]
        );
    }

    #[tokio::test]
    async fn pure_duplicate_is_skipped_without_writes() {
        let directory =
            InMemoryDirectory::new().with_users([existing("email-1", "a@x.com", "email")]);
        let outcome = Reconciler::new(&directory)
            .reconcile(&source("a@x.com", false, &[("email", "1")]))
            .await;

        assert_eq!(outcome, ReconciliationOutcome::Skipped);
        assert!(directory.writes().is_empty());
    }

    #[tokio::test]
    async fn blocked_duplicate_is_disabled() {
        let directory =
            InMemoryDirectory::new().with_users([existing("email-1", "a@x.com", "email")]);
        let outcome = Reconciler::new(&directory)
            .reconcile(&source("a@x.com", true, &[("email", "1")]))
            .await;

        assert_eq!(
            outcome,
            ReconciliationOutcome::Merged {
                disabled_mismatch: true
            }
        );
        assert_eq!(
            directory.writes(),
            vec![DirectoryCall::DeactivateUser("email-1".into())]
        );
    }

    #[tokio::test]
    async fn new_connection_is_merged_under_existing_primary() {
        let directory =
            InMemoryDirectory::new().with_users([existing("email-1", "a@x.com", "email")]);
        let outcome = Reconciler::new(&directory)
            .reconcile(&source("a@x.com", false, &[("github", "7")]))
            .await;

        assert_eq!(
            outcome,
            ReconciliationOutcome::Merged {
                disabled_mismatch: false
            }
        );
        let merged = directory.user("email-1").unwrap();
        assert_eq!(merged.login_ids, vec!["email-1", "github-7"]);
        assert_eq!(merged.connections(), vec!["email", "github"]);
        assert_eq!(merged.given_name.as_deref(), Some("Ada"));
        assert_eq!(merged.picture.as_deref(), Some("https://cdn.example.com/ada.png"));
        assert!(merged.family_name.is_none());
        assert_eq!(
            directory.writes(),
            vec![DirectoryCall::UpdateUser("email-1".into())]
        );
    }

    #[tokio::test]
    async fn merge_keeps_existing_profile_values() {
        let mut target = existing("email-1", "a@x.com", "email");
        target.given_name = Some("Augusta".into());
        let directory = InMemoryDirectory::new().with_users([target]);

        Reconciler::new(&directory)
            .reconcile(&source("a@x.com", false, &[("github", "7")]))
            .await;

        let merged = directory.user("email-1").unwrap();
        assert_eq!(merged.given_name.as_deref(), Some("Augusta"));
    }

    #[tokio::test]
    async fn merge_into_disabled_identity_stays_disabled() {
        let mut target = existing("email-1", "a@x.com", "email");
        target.status = TargetStatus::Disabled;
        let directory = InMemoryDirectory::new().with_users([target]);

        let outcome = Reconciler::new(&directory)
            .reconcile(&source("a@x.com", false, &[("github", "7")]))
            .await;

        assert_eq!(
            outcome,
            ReconciliationOutcome::Merged {
                disabled_mismatch: true
            }
        );
        assert!(directory.user("email-1").unwrap().status.is_disabled());
        assert!(
            !directory
                .calls()
                .iter()
                .any(|call| matches!(call, DirectoryCall::ActivateUser(_)))
        );
    }

    #[tokio::test]
    async fn no_identities_fails_without_remote_calls() {
        let directory = InMemoryDirectory::new();
        let outcome = Reconciler::new(&directory)
            .reconcile(&source("a@x.com", false, &[]))
            .await;

        assert!(matches!(
            outcome,
            ReconciliationOutcome::Failed { ref reason } if reason.starts_with("auth0|a@x.com")
        ));
        assert!(directory.calls().is_empty());
    }

    #[tokio::test]
    async fn remote_failure_carries_source_id_and_message() {
        let directory = InMemoryDirectory::new().fail_when(|call| {
            matches!(call, DirectoryCall::CreateUser(_)).then(|| RemoteError::Rejected {
                status: 400,
                code: Some("E011003".into()),
                message: "invalid email".into(),
            })
        });

        let outcome = Reconciler::new(&directory)
            .reconcile(&source("a@x.com", false, &[("email", "1")]))
            .await;

        assert_eq!(
            outcome,
            ReconciliationOutcome::Failed {
                reason: "auth0|a@x.com: remote rejected request (HTTP 400): invalid email".into()
            }
        );
    }

    #[test]
    fn fill_only_replaces_missing_values() {
        let mut empty = Some(String::new());
        fill(&mut empty, Some(&"x".to_string()));
        assert_eq!(empty.as_deref(), Some("x"));

        let mut kept = Some("y".to_string());
        fill(&mut kept, Some(&"x".to_string()));
        assert_eq!(kept.as_deref(), Some("y"));

        let mut none = None;
        fill(&mut none, None);
        assert!(none.is_none());
    }
}
