//! Newline-delimited snapshot files.
//!
//! A snapshot replaces the live user listing with records exported earlier.
//! Roles and organizations keep coming from the live directory.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use idmig_core::entities::{
    MemberRecord, OrganizationRecord, PermissionRecord, RoleRecord, SourceIdentity,
};
use serde::de::DeserializeOwned;

use crate::error::SnapshotError;
use crate::memory::slice_page;
use crate::{Page, SourceDirectory};

/// Read every record of a JSON Lines file.
///
/// # Errors
///
/// Returns [`SnapshotError::Open`] if the file cannot be opened, and
/// [`SnapshotError::Record`] with the one-based record number for the first
/// record that cannot be read or parsed.
pub fn read_json_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SnapshotError> {
    let display = path.display().to_string();
    let lines = serde_jsonlines::json_lines::<T, _>(path).map_err(|source| SnapshotError::Open {
        path: display.clone(),
        source,
    })?;

    lines
        .enumerate()
        .map(|(index, record)| {
            record.map_err(|source| SnapshotError::Record {
                path: display.clone(),
                record: index + 1,
                source,
            })
        })
        .collect()
}

/// Source directory whose users come from a snapshot file.
pub struct SnapshotSource {
    users: Vec<SourceIdentity>,
    live: Arc<dyn SourceDirectory>,
}

impl SnapshotSource {
    #[must_use]
    pub fn new(users: Vec<SourceIdentity>, live: Arc<dyn SourceDirectory>) -> Self {
        Self { users, live }
    }

    /// Load users from `path`, delegating every other listing to `live`.
    ///
    /// # Errors
    ///
    /// See [`read_json_lines`].
    pub fn open(path: &Path, live: Arc<dyn SourceDirectory>) -> Result<Self, SnapshotError> {
        let users = read_json_lines(path)?;
        tracing::info!(path = %path.display(), users = users.len(), "loaded user snapshot");
        Ok(Self::new(users, live))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl SourceDirectory for SnapshotSource {
    async fn list_users(
        &self,
        page: u32,
        size: u32,
        _filter: Option<&str>,
    ) -> Page<SourceIdentity> {
        Ok(slice_page(&self.users, page, size).to_vec())
    }

    async fn list_roles(&self, page: u32, size: u32) -> Page<RoleRecord> {
        self.live.list_roles(page, size).await
    }

    async fn list_role_members(&self, role_id: &str, page: u32, size: u32) -> Page<MemberRecord> {
        self.live.list_role_members(role_id, page, size).await
    }

    async fn list_role_permissions(
        &self,
        role_id: &str,
        page: u32,
        size: u32,
    ) -> Page<PermissionRecord> {
        self.live.list_role_permissions(role_id, page, size).await
    }

    async fn list_organizations(&self, page: u32, size: u32) -> Page<OrganizationRecord> {
        self.live.list_organizations(page, size).await
    }

    async fn list_organization_members(
        &self,
        org_id: &str,
        page: u32,
        size: u32,
    ) -> Page<MemberRecord> {
        self.live.list_organization_members(org_id, page, size).await
    }
}
