//! Tenant binder: source organizations become target tenants.

use idmig_source::FetchError;
use idmig_target::TenantDraft;
use serde::{Deserialize, Serialize};

use crate::context::MigrationContext;
use crate::members::{member_label, resolve_login_id};
use crate::tally::{BindingTally, CreationTally};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSummary {
    pub tenants: CreationTally,
    /// User-to-tenant bindings.
    pub bindings: BindingTally,
}

/// Mirror source organizations and their members.
///
/// Tenants are created under the organization id, so a tenant reported as
/// already existing is still addressable.
///
/// # Errors
///
/// Returns [`FetchError`] if the organization listing fails. An
/// organization whose members cannot be listed is recorded as failed.
pub async fn migrate_tenants(ctx: &MigrationContext) -> Result<TenantSummary, FetchError> {
    let organizations = ctx.fetcher.organizations().await?;
    tracing::info!(organizations = organizations.len(), "migrating tenants");

    let mut summary = TenantSummary::default();
    for organization in &organizations {
        let members = match ctx.fetcher.organization_members(&organization.id).await {
            Ok(members) => members,
            Err(err) => {
                tracing::warn!(organization = organization.label(), %err, "skipping organization");
                summary.tenants.failed.push((
                    organization.label().to_string(),
                    format!("listing members: {err}"),
                ));
                continue;
            }
        };

        if ctx.settings.dry_run {
            summary.tenants.planned += 1;
            summary.bindings.planned += members.len();
            continue;
        }

        let draft = TenantDraft {
            id: organization.id.clone(),
            name: organization.label().to_string(),
        };
        let result = ctx.target.create_tenant(&draft).await;
        summary.tenants.record(organization.label(), &result);
        let tenant_id = result.unwrap_or_else(|_| organization.id.clone());

        for member in &members {
            let label = member_label(member);
            match resolve_login_id(ctx.target.as_ref(), member).await {
                Ok(login_id) => match ctx.target.add_user_to_tenant(&login_id, &tenant_id).await {
                    Ok(()) => summary.bindings.bound(label, organization.label()),
                    Err(err) => {
                        summary
                            .bindings
                            .failed(label, organization.label(), err.to_string());
                    }
                },
                Err(reason) => summary.bindings.failed(label, organization.label(), reason),
            }
        }
    }

    summary.tenants.sort();
    summary.bindings.sort();
    Ok(summary)
}
