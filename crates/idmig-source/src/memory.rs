//! In-memory source directory for tests and rehearsals.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use idmig_core::RemoteError;
use idmig_core::entities::{
    MemberRecord, OrganizationRecord, PermissionRecord, RoleRecord, SourceIdentity,
};

use crate::{Page, SourceDirectory};

/// A [`SourceDirectory`] backed by vectors. Filters are ignored.
#[derive(Debug, Default)]
pub struct InMemorySource {
    users: Vec<SourceIdentity>,
    roles: Vec<RoleRecord>,
    role_permissions: HashMap<String, Vec<PermissionRecord>>,
    role_members: HashMap<String, Vec<MemberRecord>>,
    organizations: Vec<OrganizationRecord>,
    organization_members: HashMap<String, Vec<MemberRecord>>,
    deleted: HashSet<String>,
    requests: AtomicUsize,
}

impl InMemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_users(mut self, users: impl IntoIterator<Item = SourceIdentity>) -> Self {
        self.users.extend(users);
        self
    }

    #[must_use]
    pub fn with_role(
        mut self,
        role: RoleRecord,
        permissions: Vec<PermissionRecord>,
        members: Vec<MemberRecord>,
    ) -> Self {
        self.role_permissions.insert(role.id.clone(), permissions);
        self.role_members.insert(role.id.clone(), members);
        self.roles.push(role);
        self
    }

    #[must_use]
    pub fn with_organization(
        mut self,
        organization: OrganizationRecord,
        members: Vec<MemberRecord>,
    ) -> Self {
        self.organization_members
            .insert(organization.id.clone(), members);
        self.organizations.push(organization);
        self
    }

    /// Mark a role or organization as deleted after it was listed: its
    /// member and permission listings answer 404.
    #[must_use]
    pub fn with_deleted(mut self, id: &str) -> Self {
        self.deleted.insert(id.to_string());
        self
    }

    /// Number of page requests served so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn check_exists(&self, id: &str) -> Result<(), RemoteError> {
        if self.deleted.contains(id) {
            self.requests.fetch_add(1, Ordering::SeqCst);
            return Err(RemoteError::Rejected {
                status: 404,
                code: None,
                message: format!("'{id}' does not exist"),
            });
        }
        Ok(())
    }

    fn page_of<T: Clone>(&self, items: &[T], page: u32, size: u32) -> Page<T> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(slice_page(items, page, size).to_vec())
    }
}

/// The `page`-th window of `size` items, empty past the end.
pub(crate) fn slice_page<T>(items: &[T], page: u32, size: u32) -> &[T] {
    let size = size as usize;
    let start = (page as usize).saturating_mul(size).min(items.len());
    let end = start.saturating_add(size).min(items.len());
    &items[start..end]
}

#[async_trait]
impl SourceDirectory for InMemorySource {
    async fn list_users(
        &self,
        page: u32,
        size: u32,
        _filter: Option<&str>,
    ) -> Page<SourceIdentity> {
        self.page_of(&self.users, page, size)
    }

    async fn list_roles(&self, page: u32, size: u32) -> Page<RoleRecord> {
        self.page_of(&self.roles, page, size)
    }

    async fn list_role_members(&self, role_id: &str, page: u32, size: u32) -> Page<MemberRecord> {
        self.check_exists(role_id)?;
        let members = self.role_members.get(role_id).map_or(&[][..], Vec::as_slice);
        self.page_of(members, page, size)
    }

    async fn list_role_permissions(
        &self,
        role_id: &str,
        page: u32,
        size: u32,
    ) -> Page<PermissionRecord> {
        self.check_exists(role_id)?;
        let permissions = self
            .role_permissions
            .get(role_id)
            .map_or(&[][..], Vec::as_slice);
        self.page_of(permissions, page, size)
    }

    async fn list_organizations(&self, page: u32, size: u32) -> Page<OrganizationRecord> {
        self.page_of(&self.organizations, page, size)
    }

    async fn list_organization_members(
        &self,
        org_id: &str,
        page: u32,
        size: u32,
    ) -> Page<MemberRecord> {
        self.check_exists(org_id)?;
        let members = self
            .organization_members
            .get(org_id)
            .map_or(&[][..], Vec::as_slice);
        self.page_of(members, page, size)
    }
}

#[cfg(test)]
pub(crate) fn user(email: &str) -> SourceIdentity {
    SourceIdentity {
        source_user_id: format!("auth0|{email}"),
        email: email.to_string(),
        phone: None,
        display_name: None,
        given_name: None,
        family_name: None,
        picture: None,
        email_verified: true,
        phone_verified: false,
        blocked: false,
        identities: Vec::new(),
    }
}
