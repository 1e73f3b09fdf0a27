//! Builders shared by the engine integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use idmig_core::RemoteError;
use idmig_core::entities::{
    ConnectionIdentity, HashedPasswordUser, MemberRecord, PasswordBatchResult, SourceIdentity,
    TargetIdentity,
};
use idmig_engine::{MigrationContext, RunSettings};
use idmig_source::{InMemorySource, Paginator, RetryPolicy, Sleeper, SourceFetcher};
use idmig_target::{
    Call, InMemoryDirectory, PermissionDraft, RoleDraft, TargetDirectory, TenantDraft,
};

/// A source user with the given `(connection, user_id)` identities.
pub fn user(id: &str, email: &str, identities: &[(&str, &str)]) -> SourceIdentity {
    SourceIdentity {
        source_user_id: id.into(),
        email: email.into(),
        phone: None,
        display_name: None,
        given_name: None,
        family_name: None,
        picture: None,
        email_verified: true,
        phone_verified: false,
        blocked: false,
        identities: identities
            .iter()
            .map(|(connection, user_id)| ConnectionIdentity {
                connection: (*connection).into(),
                user_id: (*user_id).into(),
            })
            .collect(),
    }
}

pub fn blocked(mut source: SourceIdentity) -> SourceIdentity {
    source.blocked = true;
    source
}

pub fn member(user_id: &str, email: Option<&str>) -> MemberRecord {
    MemberRecord {
        user_id: user_id.into(),
        email: email.map(ToString::to_string),
        name: None,
    }
}

/// A context over in-memory fakes with small pages and no real sleeping.
pub fn context(
    source: InMemorySource,
    target: Arc<dyn TargetDirectory>,
    dry_run: bool,
) -> MigrationContext {
    let paginator = Paginator::new(RetryPolicy::default(), 2)
        .with_sleeper(Arc::new(RecordingSleeper::default()));
    let settings = RunSettings {
        dry_run,
        ..RunSettings::default()
    };
    MigrationContext::new(SourceFetcher::new(Arc::new(source), paginator), target, settings)
}

#[derive(Debug, Default)]
pub struct RecordingSleeper {
    pub slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn seconds(&self) -> Vec<u64> {
        self.slept
            .lock()
            .unwrap()
            .iter()
            .map(Duration::as_secs)
            .collect()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

/// Target whose first `create_user` is stored but answered with a timeout,
/// as when the response is lost on the way back.
pub struct LostCreateResponse {
    pub inner: Arc<InMemoryDirectory>,
    lost: AtomicBool,
}

impl LostCreateResponse {
    pub fn new(inner: Arc<InMemoryDirectory>) -> Self {
        Self {
            inner,
            lost: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl TargetDirectory for LostCreateResponse {
    async fn find_by_email(&self, email: &str) -> Call<Option<TargetIdentity>> {
        self.inner.find_by_email(email).await
    }

    async fn create_user(&self, identity: &TargetIdentity) -> Call<()> {
        self.inner.create_user(identity).await?;
        if self.lost.swap(true, Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Timeout("response lost".into()))
        }
    }

    async fn update_user(&self, login_id: &str, identity: &TargetIdentity) -> Call<()> {
        self.inner.update_user(login_id, identity).await
    }

    async fn activate_user(&self, login_id: &str) -> Call<()> {
        self.inner.activate_user(login_id).await
    }

    async fn deactivate_user(&self, login_id: &str) -> Call<()> {
        self.inner.deactivate_user(login_id).await
    }

    async fn create_role(&self, role: &RoleDraft) -> Call<()> {
        self.inner.create_role(role).await
    }

    async fn create_permission(&self, permission: &PermissionDraft) -> Call<()> {
        self.inner.create_permission(permission).await
    }

    async fn add_roles_to_user(&self, login_id: &str, role_names: &[String]) -> Call<()> {
        self.inner.add_roles_to_user(login_id, role_names).await
    }

    async fn create_tenant(&self, tenant: &TenantDraft) -> Call<String> {
        self.inner.create_tenant(tenant).await
    }

    async fn add_user_to_tenant(&self, login_id: &str, tenant_id: &str) -> Call<()> {
        self.inner.add_user_to_tenant(login_id, tenant_id).await
    }

    async fn batch_invite_with_password(
        &self,
        users: &[HashedPasswordUser],
    ) -> Call<PasswordBatchResult> {
        self.inner.batch_invite_with_password(users).await
    }
}
