use anyhow::Context;
use idmig_engine::MigrationContext;

use crate::cli::{Cli, GlobalFlags};
use crate::output::{self, RunReport};
use crate::progress::Progress;

/// Run every requested phase in order, then print the report.
///
/// A phase that fails ends the run; the report still shows the phases that
/// completed before the error is returned.
pub async fn handle(ctx: &MigrationContext, cli: &Cli, flags: &GlobalFlags) -> anyhow::Result<()> {
    let mut report = RunReport::start(ctx.settings.dry_run);
    let result = run_phases(ctx, cli, &mut report).await;
    match &result {
        Ok(()) => report.finish(),
        Err(error) => report.abort(error),
    }

    output::output(&report, flags)?;
    result
}

async fn run_phases(
    ctx: &MigrationContext,
    cli: &Cli,
    report: &mut RunReport,
) -> anyhow::Result<()> {
    if let Some(path) = &cli.with_passwords {
        let spinner = Progress::spinner("importing users with passwords");
        let result = ctx.import_passwords(path).await;
        settle(&spinner, result.is_ok());
        report.passwords = Some(
            result.with_context(|| format!("password import from {} failed", path.display()))?,
        );
    }

    let spinner = Progress::spinner("migrating users");
    let result = ctx.migrate_users(spinner.observer()).await;
    settle(&spinner, result.is_ok());
    report.users = Some(result.context("user migration failed")?);

    if cli.skip_roles {
        tracing::info!("skipping roles");
    } else {
        let spinner = Progress::spinner("migrating roles and permissions");
        let result = ctx.migrate_roles().await;
        settle(&spinner, result.is_ok());
        report.roles = Some(result.context("role migration failed")?);
    }

    if cli.skip_tenants {
        tracing::info!("skipping tenants");
    } else {
        let spinner = Progress::spinner("migrating organizations");
        let result = ctx.migrate_tenants().await;
        settle(&spinner, result.is_ok());
        report.tenants = Some(result.context("tenant migration failed")?);
    }

    Ok(())
}

fn settle(spinner: &Progress, ok: bool) {
    if ok {
        spinner.finish_clear();
    } else {
        spinner.finish_err("failed");
    }
}
