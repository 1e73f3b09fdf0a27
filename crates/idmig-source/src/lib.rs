//! # idmig-source
//!
//! Read side of a migration: the source directory abstraction, its
//! Auth0-style HTTP client, and the paginated fetcher every listing goes
//! through.
//!
//! Listings are zero-indexed and fixed-size; an empty page ends them.
//! [`fetch::SourceFetcher`] drives the pages through [`retry::with_backoff`]
//! so timeouts and rate limits are absorbed before a caller sees them.

pub mod auth0;
pub mod fetch;
pub mod memory;
pub mod retry;
pub mod snapshot;

mod error;
mod http;

pub use auth0::Auth0Client;
pub use error::{FetchError, SnapshotError};
pub use fetch::{Paginator, SourceFetcher};
pub use memory::InMemorySource;
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use snapshot::SnapshotSource;

use async_trait::async_trait;
use idmig_core::RemoteError;
use idmig_core::entities::{
    MemberRecord, OrganizationRecord, PermissionRecord, RoleRecord, SourceIdentity,
};

/// One page of a listing, as returned by a [`SourceDirectory`].
pub type Page<T> = Result<Vec<T>, RemoteError>;

/// Paginated read access to the source identity platform.
///
/// Every method returns one zero-indexed page of at most `size` records.
/// An empty page means there are no more records.
#[async_trait]
pub trait SourceDirectory: Send + Sync {
    /// Users, optionally narrowed by a platform-side query string.
    async fn list_users(&self, page: u32, size: u32, filter: Option<&str>) -> Page<SourceIdentity>;

    async fn list_roles(&self, page: u32, size: u32) -> Page<RoleRecord>;

    async fn list_role_members(&self, role_id: &str, page: u32, size: u32) -> Page<MemberRecord>;

    async fn list_role_permissions(
        &self,
        role_id: &str,
        page: u32,
        size: u32,
    ) -> Page<PermissionRecord>;

    async fn list_organizations(&self, page: u32, size: u32) -> Page<OrganizationRecord>;

    async fn list_organization_members(
        &self,
        org_id: &str,
        page: u32,
        size: u32,
    ) -> Page<MemberRecord>;
}
