//! The explicit context every migration phase runs against.

use std::path::Path;
use std::sync::Arc;

use idmig_config::IdmigConfig;
use idmig_source::{FetchError, SourceFetcher};
use idmig_target::TargetDirectory;

use crate::error::PasswordError;
use crate::orchestrator::{MigrationSummary, Orchestrator, ProgressObserver};
use crate::passwords::{PasswordSummary, import_passwords};
use crate::reconcile::Reconciler;
use crate::roles::{RoleSummary, migrate_roles};
use crate::tenants::{TenantSummary, migrate_tenants};

/// Per-run switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub dry_run: bool,
    pub progress_every: usize,
    pub password_batch_size: usize,
    /// Source-side query narrowing the user listing.
    pub user_filter: Option<String>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            dry_run: false,
            progress_every: 10,
            password_batch_size: 100,
            user_filter: None,
        }
    }
}

impl RunSettings {
    #[must_use]
    pub fn from_config(config: &IdmigConfig) -> Self {
        Self {
            progress_every: config.general.progress_every,
            password_batch_size: config.general.password_batch_size,
            ..Self::default()
        }
    }
}

/// Source, target and settings for one run. Built once, shared by every phase.
pub struct MigrationContext {
    pub fetcher: SourceFetcher,
    pub target: Arc<dyn TargetDirectory>,
    pub settings: RunSettings,
}

impl MigrationContext {
    #[must_use]
    pub fn new(
        fetcher: SourceFetcher,
        target: Arc<dyn TargetDirectory>,
        settings: RunSettings,
    ) -> Self {
        Self {
            fetcher,
            target,
            settings,
        }
    }

    /// Fetch every source user and reconcile it against the target.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the user listing fails. Per-user failures
    /// are reported in the summary.
    pub async fn migrate_users(
        &self,
        observer: Option<ProgressObserver>,
    ) -> Result<MigrationSummary, FetchError> {
        let users = self
            .fetcher
            .users(self.settings.user_filter.as_deref())
            .await?;
        tracing::info!(users = users.len(), "fetched source users");

        let mut orchestrator = Orchestrator::new(Reconciler::new(self.target.as_ref()))
            .progress_every(self.settings.progress_every);
        if let Some(observer) = observer {
            orchestrator = orchestrator.with_observer(observer);
        }
        Ok(orchestrator.run(&users, self.settings.dry_run).await)
    }

    /// See [`migrate_roles`].
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the role listing fails.
    pub async fn migrate_roles(&self) -> Result<RoleSummary, FetchError> {
        migrate_roles(self).await
    }

    /// See [`migrate_tenants`].
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the organization listing fails.
    pub async fn migrate_tenants(&self) -> Result<TenantSummary, FetchError> {
        migrate_tenants(self).await
    }

    /// See [`import_passwords`].
    ///
    /// # Errors
    ///
    /// Returns [`PasswordError`] if the export cannot be read.
    pub async fn import_passwords(&self, path: &Path) -> Result<PasswordSummary, PasswordError> {
        import_passwords(
            self.target.as_ref(),
            path,
            self.settings.password_batch_size,
            self.settings.dry_run,
        )
        .await
    }
}
