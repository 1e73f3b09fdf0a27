use std::sync::Arc;

use anyhow::Context;
use idmig_config::IdmigConfig;
use idmig_engine::{MigrationContext, RetryingDirectory, RunSettings};
use idmig_source::{
    Auth0Client, Paginator, RetryPolicy, SnapshotSource, SourceDirectory, SourceFetcher,
};
use idmig_target::{DescopeClient, InMemoryDirectory, TargetDirectory};

use crate::cli::Cli;

/// Load `.env` and the layered config, then check the credentials the run needs.
pub fn load_config(dry_run: bool) -> anyhow::Result<IdmigConfig> {
    let config =
        IdmigConfig::load_with_dotenv().context("failed to load idmig configuration")?;
    config.validate()?;
    check_credentials(&config, dry_run)?;
    Ok(config)
}

/// A dry run never writes, so it only needs the source credentials.
fn check_credentials(config: &IdmigConfig, dry_run: bool) -> anyhow::Result<()> {
    if dry_run {
        config
            .require_source()
            .context("set the source token and tenant")?;
    } else {
        config.require_live().context(
            "set the source token and tenant, and the target project id and management key",
        )?;
    }
    Ok(())
}

/// Wire the HTTP adapters into a [`MigrationContext`] for this invocation.
pub fn build_context(config: &IdmigConfig, cli: &Cli) -> anyhow::Result<MigrationContext> {
    let auth0 = Auth0Client::from_config(&config.source, &config.general)
        .context("failed to build source client")?;
    tracing::debug!(base = auth0.base_url(), "source client ready");
    let live: Arc<dyn SourceDirectory> = Arc::new(auth0);

    let source: Arc<dyn SourceDirectory> = match &cli.from_json {
        Some(path) => {
            let snapshot = SnapshotSource::open(path, live)
                .with_context(|| format!("failed to read user snapshot {}", path.display()))?;
            tracing::info!(path = %path.display(), users = snapshot.len(), "using user snapshot");
            Arc::new(snapshot)
        }
        None => live,
    };

    let target: Arc<dyn TargetDirectory> = if cli.dry_run {
        tracing::debug!("dry run: target calls go to an empty in-memory directory");
        Arc::new(InMemoryDirectory::new())
    } else {
        let descope = DescopeClient::from_config(&config.target, &config.general)
            .context("failed to build target client")?;
        Arc::new(RetryingDirectory::new(
            Arc::new(descope),
            RetryPolicy::from(&config.retry),
        ))
    };

    let settings = RunSettings {
        dry_run: cli.dry_run,
        user_filter: cli.query.clone(),
        ..RunSettings::from_config(config)
    };

    Ok(MigrationContext::new(
        SourceFetcher::new(source, Paginator::from_config(config)),
        target,
        settings,
    ))
}
