//! Request and response bodies of the management API.

use std::collections::BTreeMap;

use idmig_core::entities::{HashedPasswordUser, PasswordBatchResult, TargetIdentity};
use idmig_core::enums::TargetStatus;
use serde::{Deserialize, Serialize};

/// A user as returned by search.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(default)]
    pub login_ids: Vec<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub verified_email: bool,
    #[serde(default)]
    pub verified_phone: bool,
    #[serde(default)]
    pub custom_attributes: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    pub status: String,
}

impl From<UserResponse> for TargetIdentity {
    fn from(user: UserResponse) -> Self {
        Self {
            login_ids: user.login_ids,
            email: user.email,
            phone: user.phone.filter(|p| !p.is_empty()),
            display_name: user.name.filter(|n| !n.is_empty()),
            given_name: user.given_name.filter(|n| !n.is_empty()),
            family_name: user.family_name.filter(|n| !n.is_empty()),
            picture: user.picture.filter(|p| !p.is_empty()),
            email_verified: user.verified_email,
            phone_verified: user.verified_phone,
            custom_attributes: user.custom_attributes.unwrap_or_default(),
            status: TargetStatus::from_wire(&user.status),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub users: Vec<UserResponse>,
}

#[derive(Debug, Serialize)]
pub struct SearchRequest<'a> {
    pub emails: [&'a str; 1],
    pub limit: u32,
}

/// Body of user create and update calls.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest<'a> {
    pub login_id: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_login_ids: Vec<&'a str>,
    pub email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<&'a str>,
    pub verified_email: bool,
    pub verified_phone: bool,
    pub custom_attributes: &'a BTreeMap<String, serde_json::Value>,
}

impl<'a> UserRequest<'a> {
    /// Address `identity` by `login_id`; its other login ids become additional ones.
    pub fn new(login_id: &'a str, identity: &'a TargetIdentity) -> Self {
        Self {
            login_id,
            additional_login_ids: identity
                .login_ids
                .iter()
                .map(String::as_str)
                .filter(|id| *id != login_id)
                .collect(),
            email: &identity.email,
            phone: identity.phone.as_deref(),
            name: identity.display_name.as_deref(),
            given_name: identity.given_name.as_deref(),
            family_name: identity.family_name.as_deref(),
            picture: identity.picture.as_deref(),
            verified_email: identity.email_verified,
            verified_phone: identity.phone_verified,
            custom_attributes: &identity.custom_attributes,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest<'a> {
    pub login_id: &'a str,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequest<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    pub permission_names: &'a [String],
}

#[derive(Debug, Serialize)]
pub struct PermissionRequest<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRolesRequest<'a> {
    pub login_id: &'a str,
    pub role_names: &'a [String],
}

#[derive(Debug, Serialize)]
pub struct TenantRequest<'a> {
    pub id: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TenantResponse {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTenantRequest<'a> {
    pub login_id: &'a str,
    pub tenant_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct BatchRequest {
    pub users: Vec<BatchUser>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUser {
    pub login_id: String,
    pub email: String,
    pub verified_email: bool,
    pub hashed_password: HashedPassword,
}

#[derive(Debug, Serialize)]
pub struct HashedPassword {
    pub bcrypt: BcryptWire,
}

#[derive(Debug, Serialize)]
pub struct BcryptWire {
    pub hash: String,
}

impl From<&HashedPasswordUser> for BatchUser {
    fn from(user: &HashedPasswordUser) -> Self {
        Self {
            login_id: user.login_id.clone(),
            email: user.email.clone(),
            verified_email: user.email_verified,
            hashed_password: HashedPassword {
                bcrypt: BcryptWire {
                    hash: user.hash.to_string(),
                },
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    #[serde(default)]
    pub created_users: Vec<UserResponse>,
    #[serde(default)]
    pub failed_users: Vec<BatchFailure>,
}

#[derive(Debug, Deserialize)]
pub struct BatchFailure {
    #[serde(default)]
    pub failure: String,
    pub user: UserResponse,
}

impl From<BatchResponse> for PasswordBatchResult {
    fn from(response: BatchResponse) -> Self {
        let first_login =
            |user: UserResponse| user.login_ids.into_iter().next().unwrap_or(user.email);
        Self {
            created: response.created_users.into_iter().map(first_login).collect(),
            failed: response
                .failed_users
                .into_iter()
                .map(|failed| (first_login(failed.user), failed.failure))
                .collect(),
        }
    }
}
