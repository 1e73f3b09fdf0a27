//! Auth0-style management API client.

use std::time::Duration;

use async_trait::async_trait;
use idmig_config::{GeneralConfig, SourceConfig};
use idmig_core::RemoteError;
use idmig_core::entities::{
    MemberRecord, OrganizationRecord, PermissionRecord, RoleRecord, SourceIdentity,
};
use serde::de::DeserializeOwned;

use crate::http::{check_response, classify};
use crate::{Page, SourceDirectory};

/// HTTP client for the source management API (`/api/v2`).
pub struct Auth0Client {
    http: reqwest::Client,
    base: String,
    token: String,
}

impl Auth0Client {
    /// Create a client for the configured tenant.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Transport`] if the HTTP client cannot be built.
    pub fn new(source: &SourceConfig, timeout: Duration) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("idmig/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| classify(&e))?;
        Ok(Self {
            http,
            base: source.api_base(),
            token: source.token.clone(),
        })
    }

    /// Create a client using the configured request timeout.
    ///
    /// # Errors
    ///
    /// See [`Auth0Client::new`].
    pub fn from_config(
        source: &SourceConfig,
        general: &GeneralConfig,
    ) -> Result<Self, RemoteError> {
        Self::new(source, Duration::from_secs(general.request_timeout_secs))
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        page: u32,
        size: u32,
        extra: &str,
    ) -> Page<T> {
        let url = format!(
            "{}/api/v2/{path}?page={page}&per_page={size}{extra}",
            self.base
        );
        tracing::debug!(%url, "GET listing page");
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| classify(&e))?;
        let resp = check_response(resp).await?;
        resp.json::<Vec<T>>().await.map_err(|e| classify(&e))
    }
}

#[async_trait]
impl SourceDirectory for Auth0Client {
    async fn list_users(&self, page: u32, size: u32, filter: Option<&str>) -> Page<SourceIdentity> {
        let extra = filter
            .filter(|q| !q.is_empty())
            .map(|q| format!("&q={}&search_engine=v3", urlencoding::encode(q)))
            .unwrap_or_default();
        self.get_page("users", page, size, &extra).await
    }

    async fn list_roles(&self, page: u32, size: u32) -> Page<RoleRecord> {
        self.get_page("roles", page, size, "").await
    }

    async fn list_role_members(&self, role_id: &str, page: u32, size: u32) -> Page<MemberRecord> {
        let path = format!("roles/{}/users", urlencoding::encode(role_id));
        self.get_page(&path, page, size, "").await
    }

    async fn list_role_permissions(
        &self,
        role_id: &str,
        page: u32,
        size: u32,
    ) -> Page<PermissionRecord> {
        let path = format!("roles/{}/permissions", urlencoding::encode(role_id));
        self.get_page(&path, page, size, "").await
    }

    async fn list_organizations(&self, page: u32, size: u32) -> Page<OrganizationRecord> {
        self.get_page("organizations", page, size, "").await
    }

    async fn list_organization_members(
        &self,
        org_id: &str,
        page: u32,
        size: u32,
    ) -> Page<MemberRecord> {
        let path = format!("organizations/{}/members", urlencoding::encode(org_id));
        self.get_page(&path, page, size, "").await
    }
}
