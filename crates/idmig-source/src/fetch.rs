//! Paginated fetcher.
//!
//! [`Paginator::fetch_all`] walks pages `0, 1, 2, ...` until one comes back
//! empty, concatenating records in source order. Each page request is wrapped
//! in [`with_backoff`]; what happens when a page exhausts its retries is
//! decided by [`ExhaustionPolicy`].

use std::future::Future;
use std::sync::Arc;

use idmig_config::{ExhaustionPolicy, IdmigConfig};
use idmig_core::RemoteError;
use idmig_core::entities::{
    MemberRecord, OrganizationRecord, PermissionRecord, RoleRecord, SourceIdentity,
};

use crate::SourceDirectory;
use crate::error::FetchError;
use crate::retry::{RetryPolicy, Sleeper, TokioSleeper, with_backoff};

/// Page-walking loop shared by every listing.
#[derive(Clone)]
pub struct Paginator {
    policy: RetryPolicy,
    page_size: u32,
    on_exhaustion: ExhaustionPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl Paginator {
    #[must_use]
    pub fn new(policy: RetryPolicy, page_size: u32) -> Self {
        Self {
            policy,
            page_size: page_size.max(1),
            on_exhaustion: ExhaustionPolicy::Fail,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Build from the `retry` and `source` config sections.
    #[must_use]
    pub fn from_config(config: &IdmigConfig) -> Self {
        Self::new(RetryPolicy::from(&config.retry), config.source.page_size)
            .with_exhaustion(config.retry.on_exhaustion)
    }

    #[must_use]
    pub const fn with_exhaustion(mut self, on_exhaustion: ExhaustionPolicy) -> Self {
        self.on_exhaustion = on_exhaustion;
        self
    }

    /// Replace the sleeper used between attempts.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Fetch every page of `resource`.
    ///
    /// `fetch_page(page, size)` issues one request. Every call starts again at
    /// page zero.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Remote`] on the first non-retryable failure, and
    /// [`FetchError::RetryExhausted`] when a page runs out of attempts under
    /// [`ExhaustionPolicy::Fail`].
    pub async fn fetch_all<T, F, Fut>(
        &self,
        resource: &str,
        mut fetch_page: F,
    ) -> Result<Vec<T>, FetchError>
    where
        F: FnMut(u32, u32) -> Fut,
        Fut: Future<Output = Result<Vec<T>, RemoteError>>,
    {
        let mut records = Vec::new();
        let mut page: u32 = 0;
        loop {
            let label = format!("{resource} page {page}");
            let result = with_backoff(&self.policy, self.sleeper.as_ref(), &label, || {
                fetch_page(page, self.page_size)
            })
            .await;

            match result {
                Ok(batch) if batch.is_empty() => break,
                Ok(batch) => {
                    tracing::debug!(resource, page, count = batch.len(), "fetched page");
                    records.extend(batch);
                    page += 1;
                }
                Err(RemoteError::RetryExhausted { attempts, last }) => match self.on_exhaustion {
                    ExhaustionPolicy::Fail => {
                        return Err(FetchError::RetryExhausted {
                            resource: resource.to_string(),
                            page,
                            attempts,
                            last,
                        });
                    }
                    ExhaustionPolicy::EndOfPages => {
                        tracing::warn!(
                            resource,
                            page,
                            attempts,
                            "retries exhausted, treating as end of listing; \
                             results may be incomplete"
                        );
                        break;
                    }
                },
                Err(source) => {
                    return Err(FetchError::Remote {
                        resource: resource.to_string(),
                        page,
                        source,
                    });
                }
            }
        }
        tracing::debug!(resource, pages = page, records = records.len(), "listing complete");
        Ok(records)
    }
}

/// Full listings from a [`SourceDirectory`].
#[derive(Clone)]
pub struct SourceFetcher {
    source: Arc<dyn SourceDirectory>,
    paginator: Paginator,
}

impl SourceFetcher {
    #[must_use]
    pub fn new(source: Arc<dyn SourceDirectory>, paginator: Paginator) -> Self {
        Self { source, paginator }
    }

    #[must_use]
    pub const fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    /// All users, optionally narrowed by `filter`.
    ///
    /// # Errors
    ///
    /// See [`Paginator::fetch_all`].
    pub async fn users(&self, filter: Option<&str>) -> Result<Vec<SourceIdentity>, FetchError> {
        let source = self.source.as_ref();
        self.paginator
            .fetch_all("users", move |page, size| source.list_users(page, size, filter))
            .await
    }

    /// All roles.
    ///
    /// # Errors
    ///
    /// See [`Paginator::fetch_all`].
    pub async fn roles(&self) -> Result<Vec<RoleRecord>, FetchError> {
        let source = self.source.as_ref();
        self.paginator
            .fetch_all("roles", move |page, size| source.list_roles(page, size))
            .await
    }

    /// Users holding `role_id`.
    ///
    /// # Errors
    ///
    /// See [`Paginator::fetch_all`].
    pub async fn role_members(&self, role_id: &str) -> Result<Vec<MemberRecord>, FetchError> {
        let source = self.source.as_ref();
        let resource = format!("roles/{role_id}/users");
        self.paginator
            .fetch_all(&resource, move |page, size| {
                source.list_role_members(role_id, page, size)
            })
            .await
    }

    /// Permissions granted by `role_id`.
    ///
    /// # Errors
    ///
    /// See [`Paginator::fetch_all`].
    pub async fn role_permissions(
        &self,
        role_id: &str,
    ) -> Result<Vec<PermissionRecord>, FetchError> {
        let source = self.source.as_ref();
        let resource = format!("roles/{role_id}/permissions");
        self.paginator
            .fetch_all(&resource, move |page, size| {
                source.list_role_permissions(role_id, page, size)
            })
            .await
    }

    /// All organizations.
    ///
    /// # Errors
    ///
    /// See [`Paginator::fetch_all`].
    pub async fn organizations(&self) -> Result<Vec<OrganizationRecord>, FetchError> {
        let source = self.source.as_ref();
        self.paginator
            .fetch_all("organizations", move |page, size| {
                source.list_organizations(page, size)
            })
            .await
    }

    /// Members of `org_id`.
    ///
    /// # Errors
    ///
    /// See [`Paginator::fetch_all`].
    pub async fn organization_members(
        &self,
        org_id: &str,
    ) -> Result<Vec<MemberRecord>, FetchError> {
        let source = self.source.as_ref();
        let resource = format!("organizations/{org_id}/members");
        self.paginator
            .fetch_all(&resource, move |page, size| {
                source.list_organization_members(org_id, page, size)
            })
            .await
    }
}
