use std::sync::Arc;
use std::time::Duration;

use idmig_engine::{Progress as Snapshot, ProgressObserver};
use indicatif::{ProgressBar, ProgressStyle};

use crate::ui;

/// Spinner on stderr, or nothing when progress output is off.
pub struct Progress {
    bar: Option<ProgressBar>,
}

impl Progress {
    #[must_use]
    pub fn spinner(message: &str) -> Self {
        if !ui::prefs().progress {
            return Self { bar: None };
        }

        let bar = ProgressBar::new_spinner();
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        Self { bar: Some(bar) }
    }

    /// Observer that writes orchestrator progress into the spinner message.
    #[must_use]
    pub fn observer(&self) -> Option<ProgressObserver> {
        let bar = self.bar.clone()?;
        Some(Arc::new(move |progress: Snapshot| {
            bar.set_message(format!(
                "migrated {} users ({}/{} processed)",
                progress.migrated, progress.processed, progress.total
            ));
        }))
    }

    pub fn finish_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    pub fn finish_err(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.abandon_with_message(message.to_string());
        }
    }
}
