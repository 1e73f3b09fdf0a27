//! In-memory target directory.
//!
//! Behaves like the management API closely enough to rehearse a migration:
//! duplicate creates fail with [`RemoteError::AlreadyExists`], writes to
//! unknown users or tenants are rejected, and every call is recorded so tests
//! can assert on exactly what a run did.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use idmig_core::RemoteError;
use idmig_core::entities::{
    ATTR_FRESHLY_MIGRATED, HashedPasswordUser, PasswordBatchResult, TargetIdentity,
};
use idmig_core::enums::TargetStatus;

use crate::{Call, PermissionDraft, RoleDraft, TargetDirectory, TenantDraft};

/// One call made against an [`InMemoryDirectory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryCall {
    FindByEmail(String),
    CreateUser(String),
    UpdateUser(String),
    ActivateUser(String),
    DeactivateUser(String),
    CreateRole(String),
    CreatePermission(String),
    AddRolesToUser { login_id: String, roles: Vec<String> },
    CreateTenant(String),
    AddUserToTenant { login_id: String, tenant_id: String },
    BatchInvite(Vec<String>),
}

impl DirectoryCall {
    /// Whether the call changes directory state.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        !matches!(self, Self::FindByEmail(_))
    }
}

type FailureHook = Box<dyn Fn(&DirectoryCall) -> Option<RemoteError> + Send + Sync>;

#[derive(Default)]
struct State {
    users: Vec<TargetIdentity>,
    roles: BTreeMap<String, RoleDraft>,
    permissions: BTreeMap<String, PermissionDraft>,
    tenants: BTreeMap<String, String>,
    user_roles: BTreeMap<String, Vec<String>>,
    user_tenants: BTreeMap<String, Vec<String>>,
    calls: Vec<DirectoryCall>,
}

impl State {
    fn user_mut(&mut self, login_id: &str) -> Call<&mut TargetIdentity> {
        self.users
            .iter_mut()
            .find(|user| user.login_ids.iter().any(|id| id == login_id))
            .ok_or_else(|| not_found("user", login_id))
    }

    fn has_login_id(&self, login_id: &str) -> bool {
        self.users
            .iter()
            .any(|user| user.login_ids.iter().any(|id| id == login_id))
    }
}

fn not_found(kind: &str, key: &str) -> RemoteError {
    RemoteError::Rejected {
        status: 404,
        code: None,
        message: format!("{kind} '{key}' not found"),
    }
}

fn already_exists(kind: &str, key: &str) -> RemoteError {
    RemoteError::AlreadyExists {
        code: None,
        message: format!("{kind} '{key}' already exists"),
    }
}

/// A [`TargetDirectory`] held in memory.
#[derive(Default)]
pub struct InMemoryDirectory {
    state: Mutex<State>,
    fail_when: Option<FailureHook>,
}

impl InMemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed existing identities.
    #[must_use]
    pub fn with_users(self, users: impl IntoIterator<Item = TargetIdentity>) -> Self {
        self.lock().users.extend(users);
        self
    }

    /// Seed an existing tenant.
    #[must_use]
    pub fn with_tenant(self, id: &str, name: &str) -> Self {
        self.lock().tenants.insert(id.to_string(), name.to_string());
        self
    }

    /// Seed an existing role.
    #[must_use]
    pub fn with_role(self, name: &str) -> Self {
        self.lock().roles.insert(
            name.to_string(),
            RoleDraft {
                name: name.to_string(),
                description: None,
                permission_names: Vec::new(),
            },
        );
        self
    }

    /// Fail every call for which `hook` returns an error. The call is still
    /// recorded.
    #[must_use]
    pub fn fail_when(
        mut self,
        hook: impl Fn(&DirectoryCall) -> Option<RemoteError> + Send + Sync + 'static,
    ) -> Self {
        self.fail_when = Some(Box::new(hook));
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `call` and apply the failure hook.
    fn enter(&self, call: DirectoryCall) -> Call<MutexGuard<'_, State>> {
        let injected = self.fail_when.as_ref().and_then(|hook| hook(&call));
        let mut state = self.lock();
        state.calls.push(call);
        injected.map_or(Ok(state), Err)
    }

    #[must_use]
    pub fn users(&self) -> Vec<TargetIdentity> {
        self.lock().users.clone()
    }

    /// The identity holding `login_id`.
    #[must_use]
    pub fn user(&self, login_id: &str) -> Option<TargetIdentity> {
        self.lock()
            .users
            .iter()
            .find(|user| user.login_ids.iter().any(|id| id == login_id))
            .cloned()
    }

    #[must_use]
    pub fn role_names(&self) -> Vec<String> {
        self.lock().roles.keys().cloned().collect()
    }

    #[must_use]
    pub fn role(&self, name: &str) -> Option<RoleDraft> {
        self.lock().roles.get(name).cloned()
    }

    #[must_use]
    pub fn permission_names(&self) -> Vec<String> {
        self.lock().permissions.keys().cloned().collect()
    }

    /// Tenant ids mapped to names.
    #[must_use]
    pub fn tenants(&self) -> BTreeMap<String, String> {
        self.lock().tenants.clone()
    }

    #[must_use]
    pub fn roles_of(&self, login_id: &str) -> Vec<String> {
        self.lock()
            .user_roles
            .get(login_id)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn tenants_of(&self, login_id: &str) -> Vec<String> {
        self.lock()
            .user_tenants
            .get(login_id)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<DirectoryCall> {
        self.lock().calls.clone()
    }

    /// Calls that changed directory state.
    #[must_use]
    pub fn writes(&self) -> Vec<DirectoryCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.is_write())
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TargetDirectory for InMemoryDirectory {
    async fn find_by_email(&self, email: &str) -> Call<Option<TargetIdentity>> {
        let state = self.enter(DirectoryCall::FindByEmail(email.to_string()))?;
        Ok(state
            .users
            .iter()
            .find(|user| !email.is_empty() && user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_user(&self, identity: &TargetIdentity) -> Call<()> {
        let login_id = identity.primary_login_id().unwrap_or_default().to_string();
        let mut state = self.enter(DirectoryCall::CreateUser(login_id.clone()))?;
        if login_id.is_empty() {
            return Err(RemoteError::Rejected {
                status: 400,
                code: None,
                message: "identity has no login id".into(),
            });
        }
        if let Some(taken) = identity.login_ids.iter().find(|id| state.has_login_id(id)) {
            return Err(already_exists("user", taken));
        }
        state.users.push(identity.clone());
        Ok(())
    }

    async fn update_user(&self, login_id: &str, identity: &TargetIdentity) -> Call<()> {
        let mut state = self.enter(DirectoryCall::UpdateUser(login_id.to_string()))?;
        let existing = state.user_mut(login_id)?;
        let status = existing.status;
        let mut login_ids = vec![login_id.to_string()];
        for id in &identity.login_ids {
            if !login_ids.contains(id) {
                login_ids.push(id.clone());
            }
        }
        *existing = TargetIdentity {
            login_ids,
            status,
            ..identity.clone()
        };
        Ok(())
    }

    async fn activate_user(&self, login_id: &str) -> Call<()> {
        let mut state = self.enter(DirectoryCall::ActivateUser(login_id.to_string()))?;
        state.user_mut(login_id)?.status = TargetStatus::Enabled;
        Ok(())
    }

    async fn deactivate_user(&self, login_id: &str) -> Call<()> {
        let mut state = self.enter(DirectoryCall::DeactivateUser(login_id.to_string()))?;
        state.user_mut(login_id)?.status = TargetStatus::Disabled;
        Ok(())
    }

    async fn create_role(&self, role: &RoleDraft) -> Call<()> {
        let mut state = self.enter(DirectoryCall::CreateRole(role.name.clone()))?;
        if state.roles.contains_key(&role.name) {
            return Err(already_exists("role", &role.name));
        }
        state.roles.insert(role.name.clone(), role.clone());
        Ok(())
    }

    async fn create_permission(&self, permission: &PermissionDraft) -> Call<()> {
        let mut state = self.enter(DirectoryCall::CreatePermission(permission.name.clone()))?;
        if state.permissions.contains_key(&permission.name) {
            return Err(already_exists("permission", &permission.name));
        }
        state
            .permissions
            .insert(permission.name.clone(), permission.clone());
        Ok(())
    }

    async fn add_roles_to_user(&self, login_id: &str, role_names: &[String]) -> Call<()> {
        let mut state = self.enter(DirectoryCall::AddRolesToUser {
            login_id: login_id.to_string(),
            roles: role_names.to_vec(),
        })?;
        if !state.has_login_id(login_id) {
            return Err(not_found("user", login_id));
        }
        if let Some(missing) = role_names.iter().find(|name| !state.roles.contains_key(*name)) {
            return Err(not_found("role", missing));
        }
        let held = state.user_roles.entry(login_id.to_string()).or_default();
        for name in role_names {
            if !held.contains(name) {
                held.push(name.clone());
            }
        }
        Ok(())
    }

    async fn create_tenant(&self, tenant: &TenantDraft) -> Call<String> {
        let mut state = self.enter(DirectoryCall::CreateTenant(tenant.id.clone()))?;
        if state.tenants.contains_key(&tenant.id) {
            return Err(already_exists("tenant", &tenant.id));
        }
        state.tenants.insert(tenant.id.clone(), tenant.name.clone());
        Ok(tenant.id.clone())
    }

    async fn add_user_to_tenant(&self, login_id: &str, tenant_id: &str) -> Call<()> {
        let mut state = self.enter(DirectoryCall::AddUserToTenant {
            login_id: login_id.to_string(),
            tenant_id: tenant_id.to_string(),
        })?;
        if !state.has_login_id(login_id) {
            return Err(not_found("user", login_id));
        }
        if !state.tenants.contains_key(tenant_id) {
            return Err(not_found("tenant", tenant_id));
        }
        let joined = state.user_tenants.entry(login_id.to_string()).or_default();
        if !joined.iter().any(|id| id == tenant_id) {
            joined.push(tenant_id.to_string());
        }
        Ok(())
    }

    async fn batch_invite_with_password(
        &self,
        users: &[HashedPasswordUser],
    ) -> Call<PasswordBatchResult> {
        let login_ids = users.iter().map(|user| user.login_id.clone()).collect();
        let mut state = self.enter(DirectoryCall::BatchInvite(login_ids))?;
        let mut result = PasswordBatchResult::default();
        for user in users {
            if state.has_login_id(&user.login_id) {
                result
                    .failed
                    .push((user.login_id.clone(), "user already exists".to_string()));
                continue;
            }
            let mut identity = TargetIdentity {
                login_ids: vec![user.login_id.clone()],
                email: user.email.clone(),
                email_verified: user.email_verified,
                ..TargetIdentity::default()
            };
            identity
                .custom_attributes
                .insert(ATTR_FRESHLY_MIGRATED.to_string(), serde_json::Value::Bool(true));
            state.users.push(identity);
            result.created.push(user.login_id.clone());
        }
        Ok(result)
    }
}
