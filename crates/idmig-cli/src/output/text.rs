//! Human-readable run report.

use std::fmt::{self, Write};

use idmig_engine::{
    BindingTally, CreationTally, MigrationSummary, PasswordSummary, RoleSummary, TenantSummary,
};

use super::RunReport;

pub fn render(report: &RunReport, verbose: bool) -> Result<String, fmt::Error> {
    let mut out = String::new();
    if report.dry_run {
        writeln!(out, "Dry run: nothing was written to the target.")?;
    }

    if let Some(passwords) = &report.passwords {
        write_passwords(&mut out, passwords)?;
    }
    if let Some(users) = &report.users {
        write_users(&mut out, users, verbose)?;
    }
    if let Some(roles) = &report.roles {
        write_roles(&mut out, roles, report.dry_run, verbose)?;
    }
    if let Some(tenants) = &report.tenants {
        write_tenants(&mut out, tenants, report.dry_run, verbose)?;
    }

    if let Some(reason) = &report.aborted {
        writeln!(out, "\nRun aborted: {reason}")?;
    }
    if let Some(secs) = report.elapsed_secs() {
        writeln!(out, "\nFinished in {secs}s.")?;
    }
    Ok(out.trim_end().to_string())
}

fn heading(out: &mut String, title: &str) -> fmt::Result {
    writeln!(out, "\n== {title} ==")
}

fn write_failures<'a>(
    out: &mut String,
    failures: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> fmt::Result {
    for (id, reason) in failures {
        writeln!(out, "    {id}: {reason}")?;
    }
    Ok(())
}

fn write_passwords(out: &mut String, summary: &PasswordSummary) -> fmt::Result {
    heading(out, "Passwords")?;
    writeln!(out, "  records in export: {}", summary.found)?;
    if summary.dry_run {
        let importable = summary.found.saturating_sub(summary.failed.len());
        writeln!(out, "  would import: {importable}")?;
    } else {
        writeln!(out, "  imported: {}", summary.created.len())?;
    }
    writeln!(out, "  failed: {}", summary.failed.len())?;
    write_failures(
        out,
        summary
            .failed
            .iter()
            .map(|(id, reason)| (id.as_str(), reason.as_str())),
    )
}

fn write_users(out: &mut String, summary: &MigrationSummary, verbose: bool) -> fmt::Result {
    heading(out, "Users")?;
    if summary.dry_run {
        return writeln!(out, "  would migrate: {}", summary.total);
    }

    writeln!(out, "  processed: {}", summary.total)?;
    writeln!(out, "  created: {}", summary.created)?;
    writeln!(out, "  merged: {}", summary.merged)?;
    if verbose {
        for id in &summary.merged_ids {
            writeln!(out, "    {id}")?;
        }
    }
    writeln!(out, "  already migrated: {}", summary.skipped)?;
    writeln!(
        out,
        "  disabled after merge: {}",
        summary.disabled_mismatches.len()
    )?;
    for id in &summary.disabled_mismatches {
        writeln!(out, "    {id}")?;
    }
    writeln!(out, "  failed: {}", summary.failed.len())?;
    write_failures(
        out,
        summary
            .failed
            .iter()
            .map(|(id, reason)| (id.as_str(), reason.as_str())),
    )
}

fn write_creations(
    out: &mut String,
    noun: &str,
    tally: &CreationTally,
    dry_run: bool,
) -> fmt::Result {
    if dry_run {
        return writeln!(out, "  {noun} to create: {}", tally.planned);
    }
    writeln!(
        out,
        "  {noun}: {} created, {} already present, {} failed",
        tally.created.len(),
        tally.existing.len(),
        tally.failed.len()
    )?;
    write_failures(
        out,
        tally
            .failed
            .iter()
            .map(|(name, reason)| (name.as_str(), reason.as_str())),
    )
}

fn write_bindings(
    out: &mut String,
    noun: &str,
    tally: &BindingTally,
    dry_run: bool,
    verbose: bool,
) -> fmt::Result {
    if dry_run {
        return writeln!(out, "  {noun} to bind: {}", tally.planned);
    }
    writeln!(
        out,
        "  {noun}: {} bound, {} failed",
        tally.bound.len(),
        tally.failed.len()
    )?;
    if verbose {
        for (member, entity) in &tally.bound {
            writeln!(out, "    {member} -> {entity}")?;
        }
    }
    for (member, entity, reason) in &tally.failed {
        writeln!(out, "    {member} -> {entity}: {reason}")?;
    }
    Ok(())
}

fn write_roles(
    out: &mut String,
    summary: &RoleSummary,
    dry_run: bool,
    verbose: bool,
) -> fmt::Result {
    heading(out, "Roles")?;
    write_creations(out, "permissions", &summary.permissions, dry_run)?;
    write_creations(out, "roles", &summary.roles, dry_run)?;
    write_bindings(out, "role members", &summary.bindings, dry_run, verbose)
}

fn write_tenants(
    out: &mut String,
    summary: &TenantSummary,
    dry_run: bool,
    verbose: bool,
) -> fmt::Result {
    heading(out, "Tenants")?;
    write_creations(out, "tenants", &summary.tenants, dry_run)?;
    write_bindings(out, "tenant members", &summary.bindings, dry_run, verbose)
}
