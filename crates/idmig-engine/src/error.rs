use idmig_source::SnapshotError;
use thiserror::Error;

/// Errors that stop the password import.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("reading password export: {0}")]
    Read(#[from] SnapshotError),
}
