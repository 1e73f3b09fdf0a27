//! Password importer.
//!
//! Reads a newline-delimited password export and creates each user in the
//! target with its existing bcrypt hash. Records are validated locally first;
//! a malformed hash is a failure that never reaches the target.

use std::collections::HashMap;
use std::path::Path;

use idmig_core::entities::{BcryptHash, HashedPasswordUser, PasswordRecord};
use idmig_source::snapshot::read_json_lines;
use idmig_target::TargetDirectory;
use serde::{Deserialize, Serialize};

use crate::error::PasswordError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordSummary {
    pub dry_run: bool,
    /// Records in the export.
    pub found: usize,
    /// Login ids created with their hash.
    pub created: Vec<String>,
    /// Export record ids with the reason they were not imported.
    pub failed: Vec<(String, String)>,
}

/// Import every record of the export at `path`, `batch_size` users per call.
///
/// # Errors
///
/// Returns [`PasswordError`] if the export cannot be read. Per-record and
/// per-batch failures are reported in the summary.
pub async fn import_passwords(
    target: &dyn TargetDirectory,
    path: &Path,
    batch_size: usize,
    dry_run: bool,
) -> Result<PasswordSummary, PasswordError> {
    let records: Vec<PasswordRecord> = read_json_lines(path)?;
    tracing::info!(path = %path.display(), records = records.len(), "read password export");

    let mut summary = PasswordSummary {
        dry_run,
        found: records.len(),
        ..PasswordSummary::default()
    };

    let mut record_ids: HashMap<String, String> = HashMap::new();
    let mut users: Vec<HashedPasswordUser> = Vec::with_capacity(records.len());
    for record in &records {
        match prepare(record) {
            Ok(user) => {
                record_ids.insert(user.login_id.clone(), record.id().to_string());
                users.push(user);
            }
            Err(reason) => {
                tracing::warn!(record = record.id(), %reason, "skipping password record");
                summary.failed.push((record.id().to_string(), reason));
            }
        }
    }

    if dry_run {
        summary.failed.sort();
        return Ok(summary);
    }

    let id_of = |login_id: &str| {
        record_ids
            .get(login_id)
            .cloned()
            .unwrap_or_else(|| login_id.to_string())
    };

    for batch in users.chunks(batch_size.max(1)) {
        match target.batch_invite_with_password(batch).await {
            Ok(result) => {
                tracing::debug!(
                    created = result.created.len(),
                    failed = result.failed.len(),
                    "password batch imported"
                );
                summary.created.extend(result.created);
                summary.failed.extend(
                    result
                        .failed
                        .into_iter()
                        .map(|(login_id, reason)| (id_of(&login_id), reason)),
                );
            }
            Err(err) => {
                tracing::warn!(size = batch.len(), %err, "password batch failed");
                summary.failed.extend(
                    batch
                        .iter()
                        .map(|user| (id_of(&user.login_id), err.to_string())),
                );
            }
        }
    }

    summary.created.sort();
    summary.failed.sort();
    Ok(summary)
}

/// Validate one export record. The error is the reason it is skipped.
fn prepare(record: &PasswordRecord) -> Result<HashedPasswordUser, String> {
    if record.email.is_empty() {
        return Err("record has no email".to_string());
    }
    let hash: BcryptHash = record
        .password_hash
        .parse()
        .map_err(|err| format!("{}: {err}", record.email))?;
    Ok(HashedPasswordUser {
        login_id: record.email.clone(),
        email: record.email.clone(),
        email_verified: record.email_verified,
        hash,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use idmig_core::RemoteError;
    use idmig_target::{DirectoryCall, InMemoryDirectory};
    use pretty_assertions::assert_eq;

    const HASH: &str = "$2b$10$N9qo8uLOickgx2ZMRZoMyeIjZAgcfl7p92ldGxad68LJZdL17lhWy";

    fn line(oid: &str, email: &str, hash: &str) -> String {
        format!(
            concat!(
                r#"{{"_id":{{"$oid":"{oid}"}},"email":"{email}","#,
                r#""email_verified":true,"passwordHash":"{hash}"}}"#,
            ),
            oid = oid,
            email = email,
            hash = hash,
        )
    }

    fn export(lines: &[String]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn imports_in_batches() {
        let file = export(&[
            line("1", "a@x.com", HASH),
            line("2", "b@x.com", HASH),
            line("3", "c@x.com", HASH),
        ]);
        let directory = InMemoryDirectory::new();

        let summary = import_passwords(&directory, file.path(), 2, false)
            .await
            .unwrap();

        assert_eq!(summary.found, 3);
        assert_eq!(summary.created, vec!["a@x.com", "b@x.com", "c@x.com"]);
        assert!(summary.failed.is_empty());
        assert_eq!(
            directory.writes(),
            vec![
                DirectoryCall::BatchInvite(vec!["a@x.com".into(), "b@x.com".into()]),
                DirectoryCall::BatchInvite(vec!["c@x.com".into()]),
            ]
        );
    }

    #[tokio::test]
    async fn malformed_hash_never_reaches_the_target() {
        let file = export(&[line("1", "a@x.com", "$2b$10$short"), line("2", "b@x.com", HASH)]);
        let directory = InMemoryDirectory::new();

        let summary = import_passwords(&directory, file.path(), 100, false)
            .await
            .unwrap();

        assert_eq!(summary.created, vec!["b@x.com"]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "1");
        assert_eq!(
            directory.writes(),
            vec![DirectoryCall::BatchInvite(vec!["b@x.com".into()])]
        );
    }

    #[tokio::test]
    async fn rejected_users_are_reported_by_record_id() {
        let file = export(&[line("60425dc4", "a@x.com", HASH)]);
        let directory = InMemoryDirectory::new().with_users([idmig_core::entities::TargetIdentity {
            login_ids: vec!["a@x.com".into()],
            email: "a@x.com".into(),
            ..Default::default()
        }]);

        let summary = import_passwords(&directory, file.path(), 100, false)
            .await
            .unwrap();

        assert!(summary.created.is_empty());
        assert_eq!(
            summary.failed,
            vec![("60425dc4".to_string(), "user already exists".to_string())]
        );
    }

    #[tokio::test]
    async fn failed_batch_fails_each_of_its_users() {
        let file = export(&[line("1", "a@x.com", HASH), line("2", "b@x.com", HASH)]);
        let directory = InMemoryDirectory::new().fail_when(|call| {
            matches!(call, DirectoryCall::BatchInvite(_))
                .then(|| RemoteError::Transport("reset".into()))
        });

        let summary = import_passwords(&directory, file.path(), 100, false)
            .await
            .unwrap();

        assert_eq!(summary.failed.len(), 2);
        assert!(summary.failed.iter().all(|(_, reason)| reason.contains("reset")));
    }

    #[tokio::test]
    async fn dry_run_parses_without_writing() {
        let file = export(&[line("1", "a@x.com", HASH), line("2", "", HASH)]);
        let directory = InMemoryDirectory::new();

        let summary = import_passwords(&directory, file.path(), 100, true)
            .await
            .unwrap();

        assert!(summary.dry_run);
        assert_eq!(summary.found, 2);
        assert_eq!(
            summary.failed,
            vec![("2".to_string(), "record has no email".to_string())]
        );
        assert!(directory.calls().is_empty());
    }

    #[tokio::test]
    async fn unreadable_export_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("none.jsonl");
        let err = import_passwords(&InMemoryDirectory::new(), &missing, 10, false)
            .await
            .unwrap_err();
        assert!(matches!(err, PasswordError::Read(_)));
    }
}
