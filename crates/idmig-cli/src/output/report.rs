use chrono::{DateTime, Utc};
use idmig_engine::{MigrationSummary, PasswordSummary, RoleSummary, TenantSummary};
use serde::Serialize;

/// Everything one invocation did, phase by phase. Phases that were skipped
/// or never reached stay `None`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub dry_run: bool,
    pub passwords: Option<PasswordSummary>,
    pub users: Option<MigrationSummary>,
    pub roles: Option<RoleSummary>,
    pub tenants: Option<TenantSummary>,
    /// Error that ended the run early.
    pub aborted: Option<String>,
}

impl RunReport {
    #[must_use]
    pub fn start(dry_run: bool) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            dry_run,
            passwords: None,
            users: None,
            roles: None,
            tenants: None,
            aborted: None,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn abort(&mut self, error: &anyhow::Error) {
        self.aborted = Some(format!("{error:#}"));
        self.finish();
    }

    /// Seconds between start and finish, when finished.
    #[must_use]
    pub fn elapsed_secs(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}
