//! Drives reconciliation over a full set of source users.

use std::sync::Arc;

use idmig_core::entities::SourceIdentity;
use idmig_core::enums::ReconciliationOutcome;
use serde::{Deserialize, Serialize};

use crate::reconcile::Reconciler;

/// Progress snapshot handed to a [`ProgressObserver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Records created or merged so far.
    pub migrated: usize,
    /// Records processed so far, whatever their outcome.
    pub processed: usize,
    pub total: usize,
}

/// Called every `progress_every` successful migrations.
pub type ProgressObserver = Arc<dyn Fn(Progress) + Send + Sync>;

/// Aggregated outcome of a user migration.
///
/// Id lists are sorted by [`MigrationSummary::finish`], so two runs over the
/// same records in any order produce equal summaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationSummary {
    pub dry_run: bool,
    /// Records seen (in a dry run, the records that would be processed).
    pub total: usize,
    pub created: usize,
    pub merged: usize,
    pub skipped: usize,
    /// Source ids that ended up disabled because one side was disabled.
    pub disabled_mismatches: Vec<String>,
    /// Source ids merged into an existing identity.
    pub merged_ids: Vec<String>,
    /// Source ids with the reason they failed.
    pub failed: Vec<(String, String)>,
}

impl MigrationSummary {
    /// Fold one outcome into the summary.
    pub fn record(&mut self, source_id: &str, outcome: &ReconciliationOutcome) {
        self.total += 1;
        match outcome {
            ReconciliationOutcome::Created => self.created += 1,
            ReconciliationOutcome::Merged { disabled_mismatch } => {
                self.merged += 1;
                self.merged_ids.push(source_id.to_string());
                if *disabled_mismatch {
                    self.disabled_mismatches.push(source_id.to_string());
                }
            }
            ReconciliationOutcome::Skipped => self.skipped += 1,
            ReconciliationOutcome::Failed { reason } => {
                self.failed.push((source_id.to_string(), reason.clone()));
            }
        }
    }

    /// Put the id lists in canonical order.
    #[must_use]
    pub fn finish(mut self) -> Self {
        self.disabled_mismatches.sort();
        self.merged_ids.sort();
        self.failed.sort();
        self
    }

    /// Created plus merged.
    #[must_use]
    pub const fn migrated(&self) -> usize {
        self.created + self.merged
    }
}

/// Runs the [`Reconciler`] over every record, one at a time.
pub struct Orchestrator<'a> {
    reconciler: Reconciler<'a>,
    progress_every: usize,
    observer: Option<ProgressObserver>,
}

impl<'a> Orchestrator<'a> {
    #[must_use]
    pub const fn new(reconciler: Reconciler<'a>) -> Self {
        Self {
            reconciler,
            progress_every: 10,
            observer: None,
        }
    }

    /// Emit progress every `every` successful migrations. Zero disables it.
    #[must_use]
    pub const fn progress_every(mut self, every: usize) -> Self {
        self.progress_every = every;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Reconcile every record and aggregate the outcomes.
    ///
    /// With `dry_run` nothing is sent to the target; the summary only counts
    /// the records that would be processed.
    pub async fn run(&self, records: &[SourceIdentity], dry_run: bool) -> MigrationSummary {
        let total = records.len();
        if dry_run {
            tracing::info!(total, "dry run: users would be reconciled");
            return MigrationSummary {
                dry_run: true,
                total,
                ..MigrationSummary::default()
            };
        }

        let mut summary = MigrationSummary::default();
        let mut migrated = 0;
        for (index, record) in records.iter().enumerate() {
            let outcome = self.reconciler.reconcile(record).await;
            match &outcome {
                ReconciliationOutcome::Failed { reason } => {
                    tracing::warn!(source_id = %record.source_user_id, %reason, "user failed");
                }
                other => {
                    tracing::debug!(
                        source_id = %record.source_user_id,
                        outcome = %other,
                        "user reconciled"
                    );
                }
            }
            summary.record(&record.source_user_id, &outcome);

            if outcome.is_success() {
                migrated += 1;
                if self.progress_every > 0 && migrated % self.progress_every == 0 {
                    let progress = Progress {
                        migrated,
                        processed: index + 1,
                        total,
                    };
                    tracing::info!(migrated, processed = index + 1, total, "migration progress");
                    if let Some(observer) = &self.observer {
                        observer(progress);
                    }
                }
            }
        }

        tracing::info!(
            created = summary.created,
            merged = summary.merged,
            skipped = summary.skipped,
            failed = summary.failed.len(),
            "user migration finished"
        );
        summary.finish()
    }
}
