//! # idmig-target
//!
//! Write side of a migration: the target directory abstraction, a client for
//! the Descope-style management API, and an in-memory directory used by tests
//! and rehearsal runs.
//!
//! Every call returns `Result<_, RemoteError>`. Creates that collide with an
//! existing entity fail with [`RemoteError::AlreadyExists`] so callers can
//! treat them as "already there".

pub mod descope;
pub mod memory;

mod http;
mod wire;

pub use descope::DescopeClient;
pub use memory::{DirectoryCall, InMemoryDirectory};

use async_trait::async_trait;
use idmig_core::RemoteError;
use idmig_core::entities::{HashedPasswordUser, PasswordBatchResult, TargetIdentity};
use serde::{Deserialize, Serialize};

/// Result of a single target call.
pub type Call<T> = Result<T, RemoteError>;

/// A role to create in the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDraft {
    pub name: String,
    pub description: Option<String>,
    /// Permissions the role grants. They must exist before the role is created.
    pub permission_names: Vec<String>,
}

/// A permission to create in the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDraft {
    pub name: String,
    pub description: Option<String>,
}

/// A tenant to create in the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantDraft {
    /// Requested tenant id. Reusing the source organization id keeps the
    /// mapping stable across runs.
    pub id: String,
    pub name: String,
}

/// Read and write access to the target identity platform.
///
/// Identities are addressed by their primary login id.
#[async_trait]
pub trait TargetDirectory: Send + Sync {
    /// The identity registered under `email`, if any.
    async fn find_by_email(&self, email: &str) -> Call<Option<TargetIdentity>>;

    async fn create_user(&self, identity: &TargetIdentity) -> Call<()>;

    /// Replace the profile of the identity addressed by `login_id`.
    async fn update_user(&self, login_id: &str, identity: &TargetIdentity) -> Call<()>;

    async fn activate_user(&self, login_id: &str) -> Call<()>;

    async fn deactivate_user(&self, login_id: &str) -> Call<()>;

    async fn create_role(&self, role: &RoleDraft) -> Call<()>;

    async fn create_permission(&self, permission: &PermissionDraft) -> Call<()>;

    async fn add_roles_to_user(&self, login_id: &str, role_names: &[String]) -> Call<()>;

    /// Create a tenant and return the id the target assigned to it.
    async fn create_tenant(&self, tenant: &TenantDraft) -> Call<String>;

    async fn add_user_to_tenant(&self, login_id: &str, tenant_id: &str) -> Call<()>;

    /// Create users that keep their existing password hashes.
    ///
    /// Per-user rejections are reported in the result; only a failure of the
    /// whole request is an error.
    async fn batch_invite_with_password(
        &self,
        users: &[HashedPasswordUser],
    ) -> Call<PasswordBatchResult>;
}
