//! Descope-style management API client.
//!
//! Authenticates with `Authorization: Bearer {project_id}:{management_key}`
//! and posts JSON bodies to the `/v1/mgmt` endpoints.

use std::time::Duration;

use async_trait::async_trait;
use idmig_config::{GeneralConfig, TargetConfig};
use idmig_core::RemoteError;
use idmig_core::entities::{HashedPasswordUser, PasswordBatchResult, TargetIdentity};
use idmig_core::enums::TargetStatus;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::http::{check_response, classify};
use crate::wire::{
    BatchRequest, BatchResponse, BatchUser, PermissionRequest, RoleRequest, SearchRequest,
    SearchResponse, StatusRequest, TenantRequest, TenantResponse, UserRequest, UserRolesRequest,
    UserTenantRequest,
};
use crate::{Call, PermissionDraft, RoleDraft, TargetDirectory, TenantDraft};

/// HTTP client for the target management API.
pub struct DescopeClient {
    http: reqwest::Client,
    base: String,
    bearer: String,
    already_exists_codes: Vec<String>,
}

impl DescopeClient {
    /// Create a client for the configured project.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Transport`] if the HTTP client cannot be built.
    pub fn new(target: &TargetConfig, timeout: Duration) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("idmig/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| classify(&e))?;
        Ok(Self {
            http,
            base: target.base_url.trim_end_matches('/').to_string(),
            bearer: target.bearer(),
            already_exists_codes: target.already_exists_codes.clone(),
        })
    }

    /// Create a client using the configured request timeout.
    ///
    /// # Errors
    ///
    /// See [`DescopeClient::new`].
    pub fn from_config(
        target: &TargetConfig,
        general: &GeneralConfig,
    ) -> Result<Self, RemoteError> {
        Self::new(target, Duration::from_secs(general.request_timeout_secs))
    }

    async fn send<B: Serialize + Sync>(&self, path: &str, body: &B) -> Call<reqwest::Response> {
        let url = format!("{}{path}", self.base);
        tracing::debug!(%url, "POST");
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.bearer)
            .json(body)
            .send()
            .await
            .map_err(|e| classify(&e))?;
        check_response(resp, &self.already_exists_codes).await
    }

    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Call<()> {
        self.send(path, body).await.map(|_| ())
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Call<T> {
        self.send(path, body)
            .await?
            .json::<T>()
            .await
            .map_err(|e| classify(&e))
    }

    async fn set_status(&self, login_id: &str, status: TargetStatus) -> Call<()> {
        self.post(
            "/v1/mgmt/user/update/status",
            &StatusRequest {
                login_id,
                status: status.as_str(),
            },
        )
        .await
    }
}

#[async_trait]
impl TargetDirectory for DescopeClient {
    async fn find_by_email(&self, email: &str) -> Call<Option<TargetIdentity>> {
        let response: SearchResponse = self
            .post_json(
                "/v2/mgmt/user/search",
                &SearchRequest {
                    emails: [email],
                    limit: 1,
                },
            )
            .await?;
        Ok(response.users.into_iter().next().map(TargetIdentity::from))
    }

    async fn create_user(&self, identity: &TargetIdentity) -> Call<()> {
        let login_id = identity.primary_login_id().ok_or_else(|| RemoteError::Rejected {
            status: 400,
            code: None,
            message: "identity has no login id".into(),
        })?;
        self.post("/v1/mgmt/user/create", &UserRequest::new(login_id, identity))
            .await
    }

    async fn update_user(&self, login_id: &str, identity: &TargetIdentity) -> Call<()> {
        self.post("/v1/mgmt/user/update", &UserRequest::new(login_id, identity))
            .await
    }

    async fn activate_user(&self, login_id: &str) -> Call<()> {
        self.set_status(login_id, TargetStatus::Enabled).await
    }

    async fn deactivate_user(&self, login_id: &str) -> Call<()> {
        self.set_status(login_id, TargetStatus::Disabled).await
    }

    async fn create_role(&self, role: &RoleDraft) -> Call<()> {
        self.post(
            "/v1/mgmt/role/create",
            &RoleRequest {
                name: &role.name,
                description: role.description.as_deref(),
                permission_names: &role.permission_names,
            },
        )
        .await
    }

    async fn create_permission(&self, permission: &PermissionDraft) -> Call<()> {
        self.post(
            "/v1/mgmt/permission/create",
            &PermissionRequest {
                name: &permission.name,
                description: permission.description.as_deref(),
            },
        )
        .await
    }

    async fn add_roles_to_user(&self, login_id: &str, role_names: &[String]) -> Call<()> {
        self.post(
            "/v1/mgmt/user/update/role/add",
            &UserRolesRequest {
                login_id,
                role_names,
            },
        )
        .await
    }

    async fn create_tenant(&self, tenant: &TenantDraft) -> Call<String> {
        let response: TenantResponse = self
            .post_json(
                "/v1/mgmt/tenant/create",
                &TenantRequest {
                    id: &tenant.id,
                    name: &tenant.name,
                },
            )
            .await?;
        if response.id.is_empty() {
            Ok(tenant.id.clone())
        } else {
            Ok(response.id)
        }
    }

    async fn add_user_to_tenant(&self, login_id: &str, tenant_id: &str) -> Call<()> {
        self.post(
            "/v1/mgmt/user/update/tenant/add",
            &UserTenantRequest {
                login_id,
                tenant_id,
            },
        )
        .await
    }

    async fn batch_invite_with_password(
        &self,
        users: &[HashedPasswordUser],
    ) -> Call<PasswordBatchResult> {
        let request = BatchRequest {
            users: users.iter().map(BatchUser::from).collect(),
        };
        let response: BatchResponse = self
            .post_json("/v1/mgmt/user/create/batch", &request)
            .await?;
        Ok(response.into())
    }
}
