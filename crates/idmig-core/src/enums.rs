//! Status enums and reconciliation outcomes.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// TargetStatus
// ---------------------------------------------------------------------------

/// Login status of a target identity.
///
/// ```text
/// enabled → disabled
/// ```
///
/// The engine only ever moves an identity towards `disabled` during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    #[default]
    Enabled,
    Disabled,
}

impl TargetStatus {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        }
    }

    /// Parse a platform status string. Anything other than `disabled`
    /// (for example `invited`) still allows login and reads as enabled.
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        if value.eq_ignore_ascii_case("disabled") {
            Self::Disabled
        } else {
            Self::Enabled
        }
    }

    #[must_use]
    pub const fn is_disabled(self) -> bool {
        matches!(self, Self::Disabled)
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ReconciliationOutcome
// ---------------------------------------------------------------------------

/// Result of reconciling one source identity against the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconciliationOutcome {
    /// A new target identity was created.
    Created,
    /// The source was folded into an identity that already had its email.
    Merged {
        /// The merged identity ended up disabled because one side was.
        disabled_mismatch: bool,
    },
    /// Pure duplicate push; nothing was written.
    Skipped,
    /// A remote call failed mid-reconciliation.
    Failed { reason: String },
}

impl ReconciliationOutcome {
    /// Created and merged records count as migrated.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Created | Self::Merged { .. })
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Merged { .. } => "merged",
            Self::Skipped => "skipped",
            Self::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for ReconciliationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
