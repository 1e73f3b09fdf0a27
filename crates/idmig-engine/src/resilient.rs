//! Target directory decorator that retries timeouts and rate limits.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use idmig_core::entities::{HashedPasswordUser, PasswordBatchResult, TargetIdentity};
use idmig_source::retry::with_backoff;
use idmig_source::{RetryPolicy, Sleeper, TokioSleeper};
use idmig_target::{Call, PermissionDraft, RoleDraft, TargetDirectory, TenantDraft};

/// Wraps every call of an inner [`TargetDirectory`] in [`with_backoff`].
///
/// Exhausted retries surface as `RemoteError::RetryExhausted`, which the
/// engine records as a failure of the record being processed.
///
/// A create that timed out may still have landed. When a retried create is
/// answered with `AlreadyExists`, the earlier attempt is taken as the one
/// that succeeded.
pub struct RetryingDirectory {
    inner: Arc<dyn TargetDirectory>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryingDirectory {
    #[must_use]
    pub fn new(inner: Arc<dyn TargetDirectory>, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    async fn call<T, F, Fut>(&self, label: &str, call: F) -> Call<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Call<T>>,
    {
        with_backoff(&self.policy, self.sleeper.as_ref(), label, call).await
    }

    /// [`Self::call`] for creates. `landed` is returned when a retry finds
    /// the entity already created by an earlier attempt.
    async fn create<T, F, Fut>(&self, label: &str, landed: T, call: F) -> Call<T>
    where
        T: Clone + Sync,
        F: Fn() -> Fut + Sync,
        Fut: Future<Output = Call<T>>,
    {
        let retried = AtomicBool::new(false);
        let (retried, call, landed) = (&retried, &call, &landed);
        self.call(label, move || async move {
            match call().await {
                Err(err) if err.is_already_exists() && retried.load(Ordering::SeqCst) => {
                    tracing::debug!(label, "create landed on an earlier attempt");
                    Ok(landed.clone())
                }
                Err(err) => {
                    if err.is_retryable() {
                        retried.store(true, Ordering::SeqCst);
                    }
                    Err(err)
                }
                ok => ok,
            }
        })
        .await
    }
}

#[async_trait]
impl TargetDirectory for RetryingDirectory {
    async fn find_by_email(&self, email: &str) -> Call<Option<TargetIdentity>> {
        self.call("find_by_email", || self.inner.find_by_email(email))
            .await
    }

    async fn create_user(&self, identity: &TargetIdentity) -> Call<()> {
        self.create("create_user", (), || self.inner.create_user(identity))
            .await
    }

    async fn update_user(&self, login_id: &str, identity: &TargetIdentity) -> Call<()> {
        self.call("update_user", || self.inner.update_user(login_id, identity))
            .await
    }

    async fn activate_user(&self, login_id: &str) -> Call<()> {
        self.call("activate_user", || self.inner.activate_user(login_id))
            .await
    }

    async fn deactivate_user(&self, login_id: &str) -> Call<()> {
        self.call("deactivate_user", || self.inner.deactivate_user(login_id))
            .await
    }

    async fn create_role(&self, role: &RoleDraft) -> Call<()> {
        self.create("create_role", (), || self.inner.create_role(role))
            .await
    }

    async fn create_permission(&self, permission: &PermissionDraft) -> Call<()> {
        self.create("create_permission", (), || {
            self.inner.create_permission(permission)
        })
        .await
    }

    async fn add_roles_to_user(&self, login_id: &str, role_names: &[String]) -> Call<()> {
        self.call("add_roles_to_user", || {
            self.inner.add_roles_to_user(login_id, role_names)
        })
        .await
    }

    async fn create_tenant(&self, tenant: &TenantDraft) -> Call<String> {
        self.create("create_tenant", tenant.id.clone(), || {
            self.inner.create_tenant(tenant)
        })
        .await
    }

    async fn add_user_to_tenant(&self, login_id: &str, tenant_id: &str) -> Call<()> {
        self.call("add_user_to_tenant", || {
            self.inner.add_user_to_tenant(login_id, tenant_id)
        })
        .await
    }

    async fn batch_invite_with_password(
        &self,
        users: &[HashedPasswordUser],
    ) -> Call<PasswordBatchResult> {
        self.call("batch_invite_with_password", || {
            self.inner.batch_invite_with_password(users)
        })
        .await
    }
}
