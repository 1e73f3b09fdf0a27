//! Role and permission binder.
//!
//! For every source role: create its permissions, create the role granting
//! them, then add the role to each member. Each step is recorded on its own;
//! a failed role still gets its members bound, and a failed binding does not
//! stop the next one.

use std::collections::HashSet;

use idmig_core::entities::{MemberRecord, PermissionRecord, RoleRecord};
use idmig_source::FetchError;
use idmig_target::{PermissionDraft, RoleDraft};
use serde::{Deserialize, Serialize};

use crate::context::MigrationContext;
use crate::members::{member_label, resolve_login_id};
use crate::tally::{BindingTally, CreationTally};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSummary {
    pub roles: CreationTally,
    pub permissions: CreationTally,
    /// User-to-role bindings.
    pub bindings: BindingTally,
}

/// Mirror source roles, their permissions and their members.
///
/// # Errors
///
/// Returns [`FetchError`] if the role listing fails. A role whose
/// permissions or members cannot be listed is recorded as failed and the
/// next role is processed.
pub async fn migrate_roles(ctx: &MigrationContext) -> Result<RoleSummary, FetchError> {
    let roles = ctx.fetcher.roles().await?;
    tracing::info!(roles = roles.len(), "migrating roles");

    let mut summary = RoleSummary::default();
    let mut seen_permissions: HashSet<String> = HashSet::new();

    for role in &roles {
        let (permissions, members) = match list_contents(ctx, role).await {
            Ok(listed) => listed,
            Err(err) => {
                tracing::warn!(role = %role.name, %err, "skipping role");
                summary
                    .roles
                    .failed
                    .push((role.name.clone(), format!("listing role contents: {err}")));
                continue;
            }
        };

        if ctx.settings.dry_run {
            summary.roles.planned += 1;
            summary.permissions.planned += permissions
                .iter()
                .filter(|p| seen_permissions.insert(p.name.clone()))
                .count();
            summary.bindings.planned += members.len();
            continue;
        }

        for permission in &permissions {
            if !seen_permissions.insert(permission.name.clone()) {
                continue;
            }
            let draft = PermissionDraft {
                name: permission.name.clone(),
                description: permission.description.clone(),
            };
            let result = ctx.target.create_permission(&draft).await;
            summary.permissions.record(&permission.name, &result);
        }

        let draft = RoleDraft {
            name: role.name.clone(),
            description: role.description.clone(),
            permission_names: permissions.iter().map(|p| p.name.clone()).collect(),
        };
        let result = ctx.target.create_role(&draft).await;
        summary.roles.record(&role.name, &result);

        let role_names = [role.name.clone()];
        for member in &members {
            let label = member_label(member);
            match resolve_login_id(ctx.target.as_ref(), member).await {
                Ok(login_id) => match ctx.target.add_roles_to_user(&login_id, &role_names).await {
                    Ok(()) => summary.bindings.bound(label, &role.name),
                    Err(err) => summary.bindings.failed(label, &role.name, err.to_string()),
                },
                Err(reason) => summary.bindings.failed(label, &role.name, reason),
            }
        }
    }

    summary.roles.sort();
    summary.permissions.sort();
    summary.bindings.sort();
    Ok(summary)
}

async fn list_contents(
    ctx: &MigrationContext,
    role: &RoleRecord,
) -> Result<(Vec<PermissionRecord>, Vec<MemberRecord>), FetchError> {
    let permissions = ctx.fetcher.role_permissions(&role.id).await?;
    let members = ctx.fetcher.role_members(&role.id).await?;
    Ok((permissions, members))
}
